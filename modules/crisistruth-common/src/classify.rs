//! Category / impact classification for display.
//!
//! Category is a pure function of the title and the keyword table. Impact is a
//! fresh random draw on every call, so the same item can show different impact
//! levels across reads. Dashboard clients rely on that variation; it is not a
//! stable attribute of the item.

use std::fmt;
use std::path::Path;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::CrisisTruthError;

pub const DEFAULT_CATEGORY: &str = "General";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Low,
    Medium,
    High,
    Critical,
}

impl Impact {
    pub const ALL: [Impact; 4] = [Impact::Low, Impact::Medium, Impact::High, Impact::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Impact::Low => "low",
            Impact::Medium => "medium",
            Impact::High => "high",
            Impact::Critical => "critical",
        }
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Impact source
// ---------------------------------------------------------------------------

/// Where impact levels come from. Shared between request handlers and the
/// bulk verifier, so draws take `&self`.
pub trait ImpactSource: Send + Sync {
    fn draw(&self) -> Impact;
}

/// Uniform draw over [`Impact::ALL`].
pub struct RandomImpact {
    rng: Mutex<StdRng>,
}

impl RandomImpact {
    pub fn from_os_rng() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Deterministic sequence for tests and replays.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl ImpactSource for RandomImpact {
    fn draw(&self) -> Impact {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        Impact::ALL[rng.random_range(0..Impact::ALL.len())]
    }
}

/// Always the same level.
pub struct FixedImpact(pub Impact);

impl ImpactSource for FixedImpact {
    fn draw(&self) -> Impact {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Keyword table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    pub keywords: Vec<String>,
}

/// Ordered category rules. The first rule with any keyword contained in the
/// lower-cased title wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    rules: Vec<CategoryRule>,
}

impl Default for CategoryTable {
    fn default() -> Self {
        let rules: &[(&str, &[&str])] = &[
            (
                "Health",
                &["health", "vaccine", "who", "medical", "doctor", "disease", "hospital", "pharma"],
            ),
            (
                "Finance",
                &["economy", "market", "bank", "finance", "stocks", "investment", "trade", "budget"],
            ),
            (
                "Environment",
                &[
                    "climate",
                    "environment",
                    "green",
                    "carbon",
                    "pollution",
                    "sustainability",
                    "wildlife",
                    "ocean",
                ],
            ),
            (
                "Science",
                &["science", "research", "discovery", "space", "physics", "biology", "lab", "study"],
            ),
            (
                "Technology",
                &["tech", "ai", "google", "apple", "software", "innovation", "cyber", "digital"],
            ),
            (
                "Legal",
                &["legal", "court", "law", "judge", "attorney", "suit", "verdict", "justice"],
            ),
        ];

        Self {
            rules: rules
                .iter()
                .map(|(name, keywords)| CategoryRule {
                    name: name.to_string(),
                    keywords: keywords.iter().map(|k| k.to_string()).collect(),
                })
                .collect(),
        }
    }
}

impl CategoryTable {
    /// Keywords are lower-cased; rules without a name or keywords are rejected.
    pub fn new(rules: Vec<CategoryRule>) -> Result<Self, CrisisTruthError> {
        let mut normalized = Vec::with_capacity(rules.len());
        for rule in rules {
            let name = rule.name.trim().to_string();
            if name.is_empty() {
                return Err(CrisisTruthError::CategoryTable(
                    "category name must not be empty".into(),
                ));
            }
            let keywords: Vec<String> = rule
                .keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect();
            if keywords.is_empty() {
                return Err(CrisisTruthError::CategoryTable(format!(
                    "category {name:?} has no keywords"
                )));
            }
            normalized.push(CategoryRule { name, keywords });
        }
        Ok(Self { rules: normalized })
    }

    /// Load a JSON array of `{"name": ..., "keywords": [...]}` objects.
    pub fn from_json_file(path: &Path) -> Result<Self, CrisisTruthError> {
        let raw = std::fs::read_to_string(path).map_err(|source| {
            CrisisTruthError::CategoryTableIo {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CrisisTruthError> {
        let rules: Vec<CategoryRule> = serde_json::from_str(raw)
            .map_err(|e| CrisisTruthError::CategoryTable(e.to_string()))?;
        Self::new(rules)
    }

    /// The configured table if a path is given, else the built-in one.
    pub fn load(path: Option<&Path>) -> Result<Self, CrisisTruthError> {
        match path {
            Some(p) => Self::from_json_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// Substring match, so "ai" also fires inside longer words.
    pub fn category_for(&self, title: &str) -> &str {
        let lowered = title.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| lowered.contains(k.as_str())))
            .map(|rule| rule.name.as_str())
            .unwrap_or(DEFAULT_CATEGORY)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub category: String,
    pub impact: Impact,
}

/// Classify a title for display. See the module docs for impact semantics.
pub fn classify(table: &CategoryTable, impact: &dyn ImpactSource, title: &str) -> Classification {
    Classification {
        category: table.category_for(title).to_string(),
        impact: impact.draw(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::io::Write;

    use super::*;

    #[test]
    fn first_matching_category_wins() {
        let table = CategoryTable::default();
        // "vaccine" (Health) and "market" (Finance) both match; Health is listed first.
        assert_eq!(table.category_for("Vaccine market collapses"), "Health");
        assert_eq!(table.category_for("Stocks rally on budget news"), "Finance");
        assert_eq!(table.category_for("Supreme COURT rules"), "Legal");
    }

    #[test]
    fn unmatched_title_is_general() {
        let table = CategoryTable::default();
        assert_eq!(table.category_for("Local bakery opens"), DEFAULT_CATEGORY);
        assert_eq!(table.category_for(""), DEFAULT_CATEGORY);
    }

    #[test]
    fn keywords_match_as_substrings() {
        let table = CategoryTable::default();
        // "ai" inside "said" lands in Technology.
        assert_eq!(table.category_for("Mayor said nothing"), "Technology");
    }

    #[test]
    fn category_is_deterministic() {
        let table = CategoryTable::default();
        let impact = RandomImpact::from_os_rng();
        let title = "Ocean carbon levels rise";
        let first = classify(&table, &impact, title).category;
        for _ in 0..50 {
            assert_eq!(classify(&table, &impact, title).category, first);
        }
        assert_eq!(first, "Environment");
    }

    #[test]
    fn impact_varies_across_draws() {
        let impact = RandomImpact::seeded(7);
        let seen: HashSet<Impact> = (0..200).map(|_| impact.draw()).collect();
        assert_eq!(seen.len(), Impact::ALL.len());
    }

    #[test]
    fn seeded_impact_is_reproducible() {
        let a = RandomImpact::seeded(42);
        let b = RandomImpact::seeded(42);
        let left: Vec<Impact> = (0..20).map(|_| a.draw()).collect();
        let right: Vec<Impact> = (0..20).map(|_| b.draw()).collect();
        assert_eq!(left, right);
    }

    #[test]
    fn custom_table_from_json_keeps_order_and_lowercases() {
        let table = CategoryTable::from_json_str(
            r#"[{"name": "Elections", "keywords": ["Ballot", "vote"]},
                {"name": "Health", "keywords": ["vote"]}]"#,
        )
        .unwrap();
        assert_eq!(table.rules()[0].keywords, vec!["ballot", "vote"]);
        assert_eq!(table.category_for("Vote counts disputed"), "Elections");
        assert_eq!(table.category_for("Hospital beds"), DEFAULT_CATEGORY);
    }

    #[test]
    fn rule_without_keywords_is_rejected() {
        let err = CategoryTable::from_json_str(r#"[{"name": "Empty", "keywords": [" "]}]"#)
            .unwrap_err();
        assert!(matches!(err, CrisisTruthError::CategoryTable(_)));
    }

    #[test]
    fn table_loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"name": "Sports", "keywords": ["match"]}}]"#).unwrap();
        let table = CategoryTable::load(Some(file.path())).unwrap();
        assert_eq!(table.category_for("Final match tonight"), "Sports");
    }

    #[test]
    fn missing_table_file_is_an_io_error() {
        let err = CategoryTable::load(Some(Path::new("/nonexistent/table.json"))).unwrap_err();
        assert!(matches!(err, CrisisTruthError::CategoryTableIo { .. }));
    }

    #[test]
    fn impact_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(Impact::Critical).unwrap(),
            serde_json::json!("critical")
        );
    }
}
