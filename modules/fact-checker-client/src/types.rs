use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crisistruth_common::VerifiedItem;

/// Result of checking one claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactCheck {
    /// Free-text explanation from the model.
    pub summary: String,
    /// Per-signal scores, passed to clients untouched.
    #[serde(default)]
    pub scores: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub meta: VerdictMeta,
}

impl FactCheck {
    pub fn verdict(&self) -> Option<&str> {
        self.meta.verdict.as_deref()
    }

    /// Model confidence in [0, 1], if reported.
    pub fn verdict_score(&self) -> Option<f64> {
        self.meta
            .confidence
            .filter(|c| c.is_finite())
            .map(|c| c.clamp(0.0, 1.0))
    }

    /// Evidence text for storage: the model's evidence field, else its summary.
    pub fn evidence(&self) -> Option<String> {
        self.meta
            .evidence
            .clone()
            .or_else(|| Some(self.summary.clone()))
            .filter(|e| !e.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerdictMeta {
    /// Raw verdict label, e.g. "True", "Most likely False", "Unverifiable".
    pub verdict: Option<String>,
    pub confidence: Option<f64>,
    pub evidence: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// What one incremental sync pushed into the model's index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    pub indexed: u64,
    pub last_synced_id: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct CheckRequest<'a> {
    pub claim: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct HealthResponse {
    #[serde(default)]
    pub last_indexed_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct IndexDocument<'a> {
    pub id: i64,
    pub title: &'a str,
    pub summary: Option<&'a str>,
    pub url: &'a str,
    pub source: &'a str,
    pub scraped_at: DateTime<Utc>,
}

impl<'a> From<&'a VerifiedItem> for IndexDocument<'a> {
    fn from(item: &'a VerifiedItem) -> Self {
        Self {
            id: item.id,
            title: &item.title,
            summary: item.summary.as_deref(),
            url: &item.source_url,
            source: &item.source_name,
            scraped_at: item.scraped_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct IndexRequest<'a> {
    pub documents: Vec<IndexDocument<'a>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IndexResponse {
    pub indexed: u64,
}
