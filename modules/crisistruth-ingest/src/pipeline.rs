use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tracing::{error, info, warn};

use crisistruth_common::{CategoryTable, Config, ImpactSource};
use crisistruth_store::{ClaimStore, NewsStore, StoreLocation};
use fact_checker_client::FactChecker;

use crate::collectors::{
    ClaimFeedCollector, CollectStats, Collector, FeedFetcher, HttpFeedFetcher, NewsFeedCollector,
    PagedClaimCollector,
};
use crate::run_log::{RunReport, Step, StepOutcome};
use crate::verifier::BulkVerifier;

const PAGED_CLAIMS_PLATFORM: &str = "Politifact";

/// The periodic ingestion job: collect, verify, then sync the model's index.
pub struct IngestPipeline {
    news_collectors: Vec<Arc<dyn Collector>>,
    paged_claims: Arc<dyn Collector>,
    disinfo: Arc<dyn Collector>,
    news: NewsStore,
    claims: ClaimStore,
    fact_checker: Option<Arc<dyn FactChecker>>,
    categories: Arc<CategoryTable>,
    impact: Arc<dyn ImpactSource>,
    verify_limit: u32,
    fail_fast: bool,
}

pub struct PipelineParts {
    pub news_collectors: Vec<Arc<dyn Collector>>,
    pub paged_claims: Arc<dyn Collector>,
    pub disinfo: Arc<dyn Collector>,
    pub news: NewsStore,
    pub claims: ClaimStore,
    pub fact_checker: Option<Arc<dyn FactChecker>>,
    pub categories: Arc<CategoryTable>,
    pub impact: Arc<dyn ImpactSource>,
    pub verify_limit: u32,
    pub fail_fast: bool,
}

impl IngestPipeline {
    pub fn new(parts: PipelineParts) -> Self {
        Self {
            news_collectors: parts.news_collectors,
            paged_claims: parts.paged_claims,
            disinfo: parts.disinfo,
            news: parts.news,
            claims: parts.claims,
            fact_checker: parts.fact_checker,
            categories: parts.categories,
            impact: parts.impact,
            verify_limit: parts.verify_limit,
            fail_fast: parts.fail_fast,
        }
    }

    /// Wire the pipeline from configuration using HTTP feed collectors.
    pub fn from_config(
        config: &Config,
        fact_checker: Option<Arc<dyn FactChecker>>,
        categories: Arc<CategoryTable>,
        impact: Arc<dyn ImpactSource>,
    ) -> Result<Self> {
        let fetcher: Arc<dyn FeedFetcher> = Arc::new(HttpFeedFetcher::new()?);
        Ok(Self::with_fetcher(config, fetcher, fact_checker, categories, impact))
    }

    pub fn with_fetcher(
        config: &Config,
        fetcher: Arc<dyn FeedFetcher>,
        fact_checker: Option<Arc<dyn FactChecker>>,
        categories: Arc<CategoryTable>,
        impact: Arc<dyn ImpactSource>,
    ) -> Self {
        let news = NewsStore::new(StoreLocation::new(
            config.news_db_path.clone(),
            config.store_busy_timeout,
        ));
        let claims = ClaimStore::new(StoreLocation::new(
            config.claims_db_path.clone(),
            config.store_busy_timeout,
        ));

        let news_collectors = config
            .news_feeds
            .iter()
            .map(|source| {
                Arc::new(NewsFeedCollector::new(
                    source.clone(),
                    fetcher.clone(),
                    news.clone(),
                )) as Arc<dyn Collector>
            })
            .collect();

        Self::new(PipelineParts {
            news_collectors,
            paged_claims: Arc::new(PagedClaimCollector::new(
                PAGED_CLAIMS_PLATFORM,
                config.politifact_feed_url.clone(),
                config.politifact_pages,
                fetcher.clone(),
                claims.clone(),
            )),
            disinfo: Arc::new(ClaimFeedCollector::new(
                config.disinfo_source_name.clone(),
                config.disinfo_feed_url.clone(),
                fetcher,
                claims.clone(),
            )),
            news,
            claims,
            fact_checker,
            categories,
            impact,
            verify_limit: config.verify_limit,
            fail_fast: config.ingest_fail_fast,
        })
    }

    /// Execute one run. Never returns an error: every step's result lands in the report.
    pub async fn run(&self) -> RunReport {
        let mut report = RunReport::new();
        info!(run_id = report.run_id.as_str(), "Ingest run starting");

        let mut aborted = false;
        for step in Step::ALL {
            let started_at = Utc::now();
            if aborted {
                report.record(step, started_at, StepOutcome::NotAttempted);
                continue;
            }

            let outcome = self.run_step(step).await;
            match &outcome {
                StepOutcome::Completed { detail } => info!(%step, detail = detail.as_str(), "Step completed"),
                StepOutcome::Skipped { reason } => warn!(%step, reason = reason.as_str(), "Step skipped"),
                StepOutcome::Failed { error } => {
                    error!(%step, error = error.as_str(), "Step failed");
                    aborted = self.fail_fast;
                }
                StepOutcome::NotAttempted => {}
            }
            report.record(step, started_at, outcome);
        }

        report.finish();
        info!(
            run_id = report.run_id.as_str(),
            failed_steps = report.failed_steps(),
            "Ingest run finished"
        );
        report
    }

    async fn run_step(&self, step: Step) -> StepOutcome {
        match step {
            Step::CollectNews => self.collect_news().await,
            Step::CollectPagedClaims => collect_one(self.paged_claims.as_ref()).await,
            Step::CollectDisinfo => collect_one(self.disinfo.as_ref()).await,
            Step::VerifyClaims => self.verify_claims().await,
            Step::SyncIndex => self.sync_index().await,
        }
    }

    /// Every news source runs; the step only fails if all of them do.
    async fn collect_news(&self) -> StepOutcome {
        if self.news_collectors.is_empty() {
            return StepOutcome::Skipped {
                reason: "no news sources configured".into(),
            };
        }

        let mut stats = CollectStats::default();
        let mut errors = Vec::new();
        for collector in &self.news_collectors {
            match collector.collect().await {
                Ok(s) => stats.merge(s),
                Err(e) => {
                    stats.failed += 1;
                    errors.push(format!("{}: {e:#}", collector.name()));
                }
            }
        }

        if errors.len() == self.news_collectors.len() {
            StepOutcome::Failed {
                error: errors.join("; "),
            }
        } else {
            StepOutcome::Completed {
                detail: stats.to_string(),
            }
        }
    }

    async fn verify_claims(&self) -> StepOutcome {
        let Some(checker) = self.fact_checker.clone() else {
            return StepOutcome::Skipped {
                reason: "fact checker not initialized".into(),
            };
        };

        let verifier = BulkVerifier::new(
            self.claims.clone(),
            checker,
            self.categories.clone(),
            self.impact.clone(),
        );
        match verifier.verify_pending(self.verify_limit).await {
            Ok(stats) => StepOutcome::Completed {
                detail: stats.to_string(),
            },
            Err(e) => StepOutcome::Failed {
                error: format!("{e:#}"),
            },
        }
    }

    async fn sync_index(&self) -> StepOutcome {
        let Some(checker) = self.fact_checker.as_ref() else {
            warn!("Sync skipped: fact checker not initialized");
            return StepOutcome::Skipped {
                reason: "fact checker not initialized".into(),
            };
        };

        info!("Syncing new articles to the verification index");
        match checker.sync_incremental(&self.news).await {
            Ok(outcome) => StepOutcome::Completed {
                detail: format!(
                    "indexed={} last_synced_id={}",
                    outcome.indexed, outcome.last_synced_id
                ),
            },
            Err(e) => StepOutcome::Failed {
                error: e.to_string(),
            },
        }
    }
}

async fn collect_one(collector: &dyn Collector) -> StepOutcome {
    match collector.collect().await {
        Ok(stats) => StepOutcome::Completed {
            detail: stats.to_string(),
        },
        Err(e) => StepOutcome::Failed {
            error: format!("{}: {e:#}", collector.name()),
        },
    }
}
