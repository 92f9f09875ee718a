//! Ingestion run report: one JSON file per pipeline run.
//!
//! Each run produces `{DATA_DIR}/ingest-runs/{run_id}.json` with the outcome of
//! every step in order. Nothing reads these back; they exist for operators.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    CollectNews,
    CollectPagedClaims,
    CollectDisinfo,
    VerifyClaims,
    SyncIndex,
}

impl Step {
    /// Execution order within one run.
    pub const ALL: [Step; 5] = [
        Step::CollectNews,
        Step::CollectPagedClaims,
        Step::CollectDisinfo,
        Step::VerifyClaims,
        Step::SyncIndex,
    ];
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::CollectNews => "collect_news",
            Step::CollectPagedClaims => "collect_paged_claims",
            Step::CollectDisinfo => "collect_disinfo",
            Step::VerifyClaims => "verify_claims",
            Step::SyncIndex => "sync_index",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Completed { detail: String },
    Skipped { reason: String },
    Failed { error: String },
    /// An earlier step failed and the run was configured to stop.
    NotAttempted,
}

impl StepOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub step: Step,
    pub started_at: DateTime<Utc>,
    pub duration_ms: i64,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub steps: Vec<StepRecord>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            finished_at: None,
            steps: Vec::new(),
        }
    }

    pub fn record(&mut self, step: Step, started_at: DateTime<Utc>, outcome: StepOutcome) {
        let duration_ms = (Utc::now() - started_at).num_milliseconds();
        self.steps.push(StepRecord {
            step,
            started_at,
            duration_ms,
            outcome,
        });
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn outcome(&self, step: Step) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|r| r.step == step)
            .map(|r| &r.outcome)
    }

    pub fn failed_steps(&self) -> usize {
        self.steps.iter().filter(|r| r.outcome.is_failed()).count()
    }

    /// Serialize the report to JSON under `data_dir`. Returns the file path.
    pub fn save(&self, data_dir: &Path) -> Result<PathBuf> {
        let dir = data_dir.join("ingest-runs");
        std::fs::create_dir_all(&dir)?;

        let path = dir.join(format!("{}.json", self.run_id));
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        info!(path = %path.display(), steps = self.steps.len(), "Ingest run report saved");

        Ok(path)
    }
}
