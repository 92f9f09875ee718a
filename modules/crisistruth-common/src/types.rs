use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::Impact;

// --- Verified Item store (`news`) ---

/// A news article collected from a trusted source. Never mutated after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedItem {
    pub id: i64,
    pub title: String,
    pub summary: Option<String>,
    pub source_url: String,
    pub source_name: String,
    pub image_url: Option<String>,
    pub scraped_at: DateTime<Utc>,
}

/// A verified item as produced by a collector, before the store assigns its id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVerifiedItem {
    pub title: String,
    pub summary: Option<String>,
    pub source_url: String,
    pub source_name: String,
    pub image_url: Option<String>,
    pub scraped_at: DateTime<Utc>,
}

// --- Flagged Claim store (`fake_claims`) ---

/// A misinformation claim. Collected unverified, later filled in by the bulk verifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedClaim {
    pub id: i64,
    pub claim_text: String,
    pub content: Option<String>,
    pub source_url: String,
    pub platform: String,
    pub raw_label: Option<String>,
    pub category: Option<String>,
    pub impact: Option<String>,
    pub real_evidence: Option<String>,
    pub verdict_score: Option<f64>,
}

impl FlaggedClaim {
    /// Collected but not yet run through the verifier.
    pub fn is_verified(&self) -> bool {
        self.raw_label.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewFlaggedClaim {
    pub claim_text: String,
    pub content: Option<String>,
    pub source_url: String,
    pub platform: String,
}

/// Fields the bulk verifier writes onto a previously unverified claim.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimVerification {
    pub raw_label: String,
    pub real_evidence: Option<String>,
    pub verdict_score: Option<f64>,
    pub category: String,
    pub impact: Impact,
}
