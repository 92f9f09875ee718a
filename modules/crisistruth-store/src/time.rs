use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

use crate::error::{Result, StoreError};

/// Fixed-width UTC text, so `ORDER BY scraped_at` sorts chronologically.
pub(crate) fn encode(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Accepts RFC 3339 as well as the naive `YYYY-MM-DD HH:MM:SS[.f]` form older rows use.
pub(crate) fn decode(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| StoreError::MalformedRow(format!("unparseable timestamp {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn encoded_timestamps_sort_lexically() {
        let early = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let late = early + chrono::Duration::milliseconds(1500);
        assert!(encode(early) < encode(late));
        assert_eq!(encode(early).len(), encode(late).len());
    }

    #[test]
    fn decodes_own_format_and_naive_rows() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 15).unwrap();
        assert_eq!(decode(&encode(ts)).unwrap(), ts);
        assert_eq!(decode("2024-05-01 09:30:15").unwrap(), ts);
        assert_eq!(decode("2024-05-01T09:30:15").unwrap(), ts);
    }

    #[test]
    fn garbage_timestamp_is_malformed() {
        assert!(matches!(decode("yesterday"), Err(StoreError::MalformedRow(_))));
    }
}
