//! Client-facing record shapes. Field names are the ones the dashboard reads.

use serde::Serialize;

use crisistruth_common::{
    normalize_stored_label, CategoryTable, Classification, FlaggedClaim, ImpactSource,
    VerifiedItem, DEFAULT_CATEGORY,
};
use crisistruth_store::{CategoryCount, PlatformCount};

pub const DEFAULT_NEWS_IMAGE: &str =
    "https://images.unsplash.com/photo-1504711432869-efd597cdd042?w=400";
pub const FLAGGED_IMAGE: &str =
    "https://images.unsplash.com/photo-1585241936939-be4099591252?w=400";
pub const EVIDENCE_PENDING: &str =
    "Flagged by fact-checkers. AI is analyzing local datasets for counter-evidence...";
pub const DEFAULT_VERDICT_SCORE: f64 = 0.45;
pub const DEFAULT_SEVERITY: &str = "medium";
/// Claims above this many flip the dashboard threat level to "High".
pub const THREAT_THRESHOLD: i64 = 20;

const REGION: &str = "Global";
const VERIFICATION_SCORE: u32 = 98;
const VERIFICATION_METHODS: [&str; 2] = ["Cross-referenced via RSS", "Verified Official Source"];
const TRENDING_VERIFICATION: [&str; 2] = ["Official Channel", "AI Cross-Check"];
const EVIDENCE_FALLBACK: &str = "Cross-referencing...";
const UNSCORED_FAKE_SCORE: f64 = 0.5;

/// First `max` characters of `text`, never splitting a code point.
fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// --- Verified feed ---

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedFeedRecord {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub source_url: String,
    pub source_name: String,
    pub category: String,
    pub verification_score: u32,
    pub published_time: &'static str,
    pub impact_level: &'static str,
    pub verification_methods: [&'static str; 2],
    pub region: &'static str,
}

impl VerifiedFeedRecord {
    pub fn new(item: VerifiedItem, classification: Classification) -> Self {
        let description = match item.summary.as_deref() {
            Some(summary) if !summary.is_empty() => format!("{}...", truncate(summary, 200)),
            _ => String::new(),
        };
        Self {
            id: item.id,
            title: item.title,
            description,
            image_url: item
                .image_url
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| DEFAULT_NEWS_IMAGE.to_string()),
            source_url: item.source_url,
            source_name: item.source_name,
            category: classification.category,
            verification_score: VERIFICATION_SCORE,
            published_time: "Recently Verified",
            impact_level: classification.impact.as_str(),
            verification_methods: VERIFICATION_METHODS,
            region: REGION,
        }
    }

    /// Classify the title at read time. Impact is drawn fresh on every call.
    pub fn classified(item: VerifiedItem, table: &CategoryTable, impact: &dyn ImpactSource) -> Self {
        let classification = crisistruth_common::classify(table, impact, &item.title);
        Self::new(item, classification)
    }
}

// --- Flagged feed ---

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlaggedFeedRecord {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub image_url: &'static str,
    pub source_url: String,
    pub platform: String,
    /// `None` until the bulk verifier has labelled the claim.
    pub label: Option<String>,
    pub category: String,
    pub severity: String,
    pub real_evidence: String,
    pub verdict_score: f64,
    pub time_detected: &'static str,
}

impl From<FlaggedClaim> for FlaggedFeedRecord {
    fn from(claim: FlaggedClaim) -> Self {
        Self {
            id: claim.id,
            title: claim.claim_text,
            description: claim.content,
            image_url: FLAGGED_IMAGE,
            source_url: claim.source_url,
            platform: claim.platform,
            label: claim.raw_label.as_deref().map(normalize_stored_label),
            category: claim
                .category
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            severity: claim
                .impact
                .filter(|i| !i.is_empty())
                .unwrap_or_else(|| DEFAULT_SEVERITY.to_string()),
            real_evidence: claim
                .real_evidence
                .filter(|e| !e.is_empty() && e != "N/A")
                .unwrap_or_else(|| EVIDENCE_PENDING.to_string()),
            verdict_score: claim
                .verdict_score
                .filter(|s| *s != 0.0)
                .unwrap_or(DEFAULT_VERDICT_SCORE),
            time_detected: "Recently Debunked",
        }
    }
}

// --- Dashboard ---

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub stats: Kpis,
    pub category_distribution: Vec<CategorySlice>,
    pub toxicity_data: Vec<PlatformToxicity>,
    pub trending_fake: Vec<TrendingFake>,
    pub trending_real: Vec<TrendingReal>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub total_scraped: i64,
    pub fake_detected: i64,
    pub real_verified: i64,
    pub threat_level: &'static str,
}

impl Kpis {
    pub fn new(real_verified: i64, fake_detected: i64) -> Self {
        Self {
            total_scraped: real_verified + fake_detected,
            fake_detected,
            real_verified,
            threat_level: threat_level(fake_detected),
        }
    }
}

pub fn threat_level(fake_detected: i64) -> &'static str {
    if fake_detected > THREAT_THRESHOLD {
        "High"
    } else {
        "Moderate"
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategorySlice {
    pub name: String,
    pub value: i64,
}

impl From<CategoryCount> for CategorySlice {
    fn from(c: CategoryCount) -> Self {
        Self {
            name: c.name,
            value: c.count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlatformToxicity {
    pub source: String,
    pub count: i64,
}

impl From<PlatformCount> for PlatformToxicity {
    fn from(p: PlatformCount) -> Self {
        Self {
            source: p.platform,
            count: p.count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingFake {
    pub id: i64,
    pub rank: usize,
    pub title: String,
    pub description: String,
    pub platforms: Vec<String>,
    pub url: String,
    pub fake_score: i64,
    pub evidence: Vec<String>,
    pub region: &'static str,
}

impl TrendingFake {
    /// `rank` is 1-based.
    pub fn new(rank: usize, claim: FlaggedClaim) -> Self {
        let score = claim
            .verdict_score
            .filter(|s| *s != 0.0)
            .unwrap_or(UNSCORED_FAKE_SCORE);
        let evidence = match claim.real_evidence.as_deref() {
            Some(e) if !e.is_empty() => truncate(e, 200).to_string(),
            _ => EVIDENCE_FALLBACK.to_string(),
        };
        Self {
            id: claim.id,
            rank,
            title: claim.claim_text,
            description: format!("{}...", truncate(claim.content.as_deref().unwrap_or(""), 100)),
            platforms: vec![claim.platform],
            url: claim.source_url,
            fake_score: (score * 100.0) as i64,
            evidence: vec![evidence],
            region: REGION,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingReal {
    pub id: i64,
    pub rank: usize,
    pub title: String,
    pub source: String,
    pub url: String,
    pub verification: [&'static str; 2],
    pub credibility_score: u32,
    pub region: &'static str,
}

impl TrendingReal {
    /// `rank` is 1-based.
    pub fn new(rank: usize, item: VerifiedItem) -> Self {
        Self {
            id: item.id,
            rank,
            title: item.title,
            source: item.source_name,
            url: item.source_url,
            verification: TRENDING_VERIFICATION,
            credibility_score: VERIFICATION_SCORE,
            region: REGION,
        }
    }
}
