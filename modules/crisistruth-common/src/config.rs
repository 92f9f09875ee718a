use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

/// Hardcoded default list of verified-news feeds, as `(source name, feed url)`.
const DEFAULT_NEWS_FEEDS: &[(&str, &str)] = &[
    ("AP News", "https://feeds.apnews.com/rss/apf-topnews"),
    ("NPR", "https://feeds.npr.org/1001/rss.xml"),
    ("BBC News", "https://feeds.bbci.co.uk/news/rss.xml"),
    ("Al Jazeera", "https://www.aljazeera.com/xml/rss/all.xml"),
    ("The Guardian", "https://www.theguardian.com/world/rss"),
    ("WHO", "https://www.who.int/rss-feeds/news-english.xml"),
];

const DEFAULT_POLITIFACT_FEED_URL: &str = "https://www.politifact.com/rss/factchecks/?page={page}";
const DEFAULT_DISINFO_FEED_URL: &str = "https://www.snopes.com/feed/";
const DEFAULT_DISINFO_SOURCE_NAME: &str = "Snopes";
/// One year.
const MAX_INGEST_INTERVAL_HOURS: u64 = 24 * 365;

/// A verified-news source: display name plus the feed it is collected from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsSource {
    pub name: String,
    pub feed_url: String,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Web server
    pub host: String,
    pub port: u16,
    pub allowed_origin: String,

    // Stores
    pub news_db_path: PathBuf,
    pub claims_db_path: PathBuf,
    pub store_busy_timeout: Duration,

    // Verification service
    pub fact_checker_url: Option<String>,
    pub fact_checker_timeout: Duration,

    // Ingestion
    pub ingest_interval: Duration,
    pub ingest_run_on_start: bool,
    pub ingest_fail_fast: bool,
    pub politifact_pages: u32,
    pub verify_limit: u32,
    pub news_feeds: Vec<NewsSource>,
    pub politifact_feed_url: String,
    pub disinfo_feed_url: String,
    pub disinfo_source_name: String,
    pub data_dir: PathBuf,

    // Classification
    pub category_table_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Absent keys take their defaults;
    /// present but malformed values are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let news_feeds = match var("NEWS_FEEDS") {
            Some(raw) => parse_news_feeds(&raw)?,
            None => DEFAULT_NEWS_FEEDS
                .iter()
                .map(|(name, url)| NewsSource {
                    name: name.to_string(),
                    feed_url: url.to_string(),
                })
                .collect(),
        };

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(var("PORT"), "PORT", 8000)?,
            allowed_origin: var("ALLOWED_ORIGIN")
                .unwrap_or_else(|| "http://localhost:5173".to_string()),
            news_db_path: var("NEWS_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("Database").join("news_articles.db")),
            claims_db_path: var("CLAIMS_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("Database").join("fake_news_2.db")),
            store_busy_timeout: Duration::from_secs(parse_or(
                var("STORE_BUSY_TIMEOUT_SECS"),
                "STORE_BUSY_TIMEOUT_SECS",
                20,
            )?),
            fact_checker_url: var("FACT_CHECKER_URL"),
            fact_checker_timeout: Duration::from_secs(parse_or(
                var("FACT_CHECKER_TIMEOUT_SECS"),
                "FACT_CHECKER_TIMEOUT_SECS",
                120,
            )?),
            ingest_interval: parse_interval_hours(var("INGEST_INTERVAL_HOURS"))?,
            ingest_run_on_start: parse_or(var("INGEST_RUN_ON_START"), "INGEST_RUN_ON_START", false)?,
            ingest_fail_fast: parse_or(var("INGEST_FAIL_FAST"), "INGEST_FAIL_FAST", false)?,
            politifact_pages: parse_or(var("POLITIFACT_PAGES"), "POLITIFACT_PAGES", 4)?,
            verify_limit: parse_or(var("VERIFY_LIMIT"), "VERIFY_LIMIT", 80)?,
            news_feeds,
            politifact_feed_url: var("POLITIFACT_FEED_URL")
                .unwrap_or_else(|| DEFAULT_POLITIFACT_FEED_URL.to_string()),
            disinfo_feed_url: var("DISINFO_FEED_URL")
                .unwrap_or_else(|| DEFAULT_DISINFO_FEED_URL.to_string()),
            disinfo_source_name: var("DISINFO_SOURCE_NAME")
                .unwrap_or_else(|| DEFAULT_DISINFO_SOURCE_NAME.to_string()),
            data_dir: var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
            category_table_path: var("CATEGORY_TABLE_PATH").map(PathBuf::from),
        })
    }

    /// `host:port` the HTTP listener binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Log the effective configuration. Contains no secrets.
    pub fn log_summary(&self) {
        info!(
            bind = %self.bind_addr(),
            news_db = %self.news_db_path.display(),
            claims_db = %self.claims_db_path.display(),
            fact_checker = self.fact_checker_url.as_deref().unwrap_or("<unset>"),
            interval_secs = self.ingest_interval.as_secs(),
            news_feeds = self.news_feeds.len(),
            "Loaded configuration"
        );
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(v) => v
            .trim()
            .parse()
            .with_context(|| format!("{key} has invalid value {v:?}")),
        None => Ok(default),
    }
}

/// Whole hours, at least one and at most `MAX_INGEST_INTERVAL_HOURS`.
fn parse_interval_hours(raw: Option<String>) -> Result<Duration> {
    let hours = parse_or::<u64>(raw, "INGEST_INTERVAL_HOURS", 2)?.max(1);
    if hours > MAX_INGEST_INTERVAL_HOURS {
        anyhow::bail!(
            "INGEST_INTERVAL_HOURS must be at most {MAX_INGEST_INTERVAL_HOURS}, got {hours}"
        );
    }
    hours
        .checked_mul(3600)
        .map(Duration::from_secs)
        .context("INGEST_INTERVAL_HOURS overflows")
}

/// Parse `name=url,name=url`. A bare url uses its host as the name.
fn parse_news_feeds(raw: &str) -> Result<Vec<NewsSource>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|entry| match named_entry(entry) {
            Some((name, url)) if !name.trim().is_empty() && !url.trim().is_empty() => {
                Ok(NewsSource {
                    name: name.trim().to_string(),
                    feed_url: url.trim().to_string(),
                })
            }
            Some(_) => anyhow::bail!("NEWS_FEEDS entry {entry:?} is missing a name or url"),
            None => Ok(NewsSource {
                name: host_of(entry).unwrap_or(entry).to_string(),
                feed_url: entry.to_string(),
            }),
        })
        .collect()
}

/// Split `name=url`. An entry whose text before the first `=` already holds a
/// scheme is a bare url with a query string, not a named one.
fn named_entry(entry: &str) -> Option<(&str, &str)> {
    entry
        .split_once('=')
        .filter(|(name, _)| !name.contains("://"))
}

fn host_of(url: &str) -> Option<&str> {
    let rest = url.split_once("://")?.1;
    rest.split(['/', '?', '#']).next().filter(|h| !h.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_with(&[]).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.bind_addr(), "0.0.0.0:8000");
        assert_eq!(config.allowed_origin, "http://localhost:5173");
        assert_eq!(config.ingest_interval, Duration::from_secs(2 * 3600));
        assert_eq!(config.verify_limit, 80);
        assert_eq!(config.politifact_pages, 4);
        assert_eq!(config.store_busy_timeout, Duration::from_secs(20));
        assert!(config.fact_checker_url.is_none());
        assert!(!config.ingest_fail_fast);
        assert_eq!(config.news_feeds.len(), DEFAULT_NEWS_FEEDS.len());
    }

    #[test]
    fn port_variable_drives_the_bind_address() {
        let config = config_with(&[("PORT", "9123"), ("HOST", "127.0.0.1")]).unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:9123");
    }

    #[test]
    fn malformed_port_is_an_error() {
        let err = config_with(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = config_with(&[("PORT", "  "), ("FACT_CHECKER_URL", "")]).unwrap();
        assert_eq!(config.port, 8000);
        assert!(config.fact_checker_url.is_none());
    }

    #[test]
    fn news_feeds_parse_named_and_bare_entries() {
        let config = config_with(&[(
            "NEWS_FEEDS",
            "Reuters=https://example.com/rss?lang=en, https://news.example.org/feed.xml, \
             https://news.example.org/rss?format=xml",
        )])
        .unwrap();
        assert_eq!(
            config.news_feeds,
            vec![
                NewsSource {
                    name: "Reuters".into(),
                    feed_url: "https://example.com/rss?lang=en".into(),
                },
                NewsSource {
                    name: "news.example.org".into(),
                    feed_url: "https://news.example.org/feed.xml".into(),
                },
                NewsSource {
                    name: "news.example.org".into(),
                    feed_url: "https://news.example.org/rss?format=xml".into(),
                },
            ]
        );
    }

    #[test]
    fn news_feed_entry_without_url_is_rejected() {
        assert!(config_with(&[("NEWS_FEEDS", "Reuters=")]).is_err());
    }

    #[test]
    fn interval_hours_never_drop_below_one() {
        let config = config_with(&[("INGEST_INTERVAL_HOURS", "0")]).unwrap();
        assert_eq!(config.ingest_interval, Duration::from_secs(3600));
    }

    #[test]
    fn oversized_interval_is_rejected() {
        let config = config_with(&[("INGEST_INTERVAL_HOURS", "8760")]).unwrap();
        assert_eq!(config.ingest_interval, Duration::from_secs(8760 * 3600));

        assert!(config_with(&[("INGEST_INTERVAL_HOURS", "8761")]).is_err());
        let huge = u64::MAX.to_string();
        assert!(config_with(&[("INGEST_INTERVAL_HOURS", huge.as_str())]).is_err());
    }
}
