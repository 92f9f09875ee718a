//! Verdict reconciliation.
//!
//! The verification service speaks a free-form vocabulary ("True", "False",
//! "Most likely False", "Unverifiable", ...). Clients only ever see the labels
//! produced here. The realtime and stored-label rules are intentionally separate:
//! the single-claim endpoint collapses everything but a positive confirmation,
//! the stored feed keeps a true/false/other distinction.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The only raw verdict the realtime endpoint reports as true.
pub const POSITIVE_VERDICT: &str = "True";

/// Raw labels the stored feed reports as "False".
pub const STORED_FALSE_ALIASES: &[&str] = &["Unverifiable", "Most likely False"];

const UNVERIFIABLE: &str = "Unverifiable";
const UNVERIFIABLE_REWRITE: &str = "Likely False";

/// Verdict returned by `POST /verify`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RealtimeVerdict {
    True,
    False,
}

impl RealtimeVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            RealtimeVerdict::True => "True",
            RealtimeVerdict::False => "False",
        }
    }
}

impl fmt::Display for RealtimeVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collapse a raw verdict for the single-claim endpoint. Anything other than an
/// exact positive confirmation, including a missing or unknown verdict, is `False`.
pub fn normalize_realtime_verdict(raw: Option<&str>) -> RealtimeVerdict {
    match raw {
        Some(POSITIVE_VERDICT) => RealtimeVerdict::True,
        _ => RealtimeVerdict::False,
    }
}

/// Map a stored batch label for the flagged feed. `Unverifiable` and
/// `Most likely False` become `False`; every other label passes through unchanged.
pub fn normalize_stored_label(raw: &str) -> String {
    if STORED_FALSE_ALIASES.contains(&raw) {
        "False".to_string()
    } else {
        raw.to_string()
    }
}

/// Textual pass over a realtime explanation. Independent of the verdict collapse.
pub fn rewrite_explanation(summary: &str) -> String {
    summary.replace(UNVERIFIABLE, UNVERIFIABLE_REWRITE)
}
