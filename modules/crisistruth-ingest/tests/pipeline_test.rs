//! Pipeline runs against temp SQLite stores, canned feeds, and a mock fact checker.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crisistruth_common::{CategoryTable, Config, FixedImpact, Impact, ImpactSource};
use crisistruth_ingest::collectors::StaticFeedFetcher;
use crisistruth_ingest::{
    start_ingest_interval, IngestPipeline, ScheduleConfig, Step, StepOutcome,
};
use crisistruth_store::{ClaimStore, NewsStore, StoreLocation};
use fact_checker_client::{FactCheck, FactCheckError, FactChecker, SyncOutcome, VerdictMeta};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

const WIRE: &str = "https://wire.test/rss";
const BROKEN: &str = "https://broken.test/rss";
const POLITIFACT: &str = "https://pf.test/rss?page={page}";
const DISINFO: &str = "https://disinfo.test/rss";

fn rss(items: &[(&str, &str)]) -> String {
    let body: String = items
        .iter()
        .map(|(title, link)| {
            format!(
                "<item><title>{title}</title><link>{link}</link><description>About {title}</description></item>"
            )
        })
        .collect();
    format!(r#"<?xml version="1.0"?><rss version="2.0"><channel><title>t</title>{body}</channel></rss>"#)
}

fn feeds() -> StaticFeedFetcher {
    StaticFeedFetcher::new()
        .with_feed(
            WIRE,
            rss(&[
                ("Central bank holds rates", "https://wire.test/a"),
                ("Court upholds ruling", "https://wire.test/b"),
            ]),
        )
        .with_feed(
            "https://pf.test/rss?page=1",
            rss(&[
                ("Vaccines contain microchips", "https://pf.test/c1"),
                ("Moon landing was staged", "https://pf.test/c2"),
            ]),
        )
        .with_feed(
            "https://pf.test/rss?page=2",
            rss(&[("Tap water causes amnesia", "https://pf.test/c3")]),
        )
        .with_feed(
            DISINFO,
            rss(&[("Stocks banned next week", "https://disinfo.test/d1")]),
        )
}

fn config(dir: &tempfile::TempDir, extra: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = HashMap::from([
        (
            "NEWS_DB_PATH".to_string(),
            dir.path().join("news.db").display().to_string(),
        ),
        (
            "CLAIMS_DB_PATH".to_string(),
            dir.path().join("claims.db").display().to_string(),
        ),
        ("NEWS_FEEDS".to_string(), format!("Wire={WIRE},Broken={BROKEN}")),
        ("POLITIFACT_FEED_URL".to_string(), POLITIFACT.to_string()),
        ("POLITIFACT_PAGES".to_string(), "2".to_string()),
        ("DISINFO_FEED_URL".to_string(), DISINFO.to_string()),
        ("DISINFO_SOURCE_NAME".to_string(), "Tracker".to_string()),
        ("STORE_BUSY_TIMEOUT_SECS".to_string(), "2".to_string()),
    ]);
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }
    Config::from_lookup(|k| vars.get(k).cloned()).unwrap()
}

struct MockChecker {
    verdicts: HashMap<&'static str, (&'static str, f64)>,
    failing: HashSet<&'static str>,
    syncs: AtomicU32,
}

impl MockChecker {
    fn new() -> Self {
        Self {
            verdicts: HashMap::from([("Vaccines contain microchips", ("Most likely False", 0.92))]),
            failing: HashSet::new(),
            syncs: AtomicU32::new(0),
        }
    }

    fn failing_on(mut self, claim: &'static str) -> Self {
        self.failing.insert(claim);
        self
    }
}

#[async_trait]
impl FactChecker for MockChecker {
    async fn check_fact(&self, claim: &str) -> fact_checker_client::Result<FactCheck> {
        if self.failing.contains(claim) {
            return Err(FactCheckError::Api {
                status: 500,
                message: "model overloaded".into(),
            });
        }
        let (verdict, confidence) = self.verdicts.get(claim).copied().unwrap_or(("False", 0.6));
        Ok(FactCheck {
            summary: format!("Evidence against: {claim}"),
            scores: Default::default(),
            meta: VerdictMeta {
                verdict: Some(verdict.to_string()),
                confidence: Some(confidence),
                evidence: None,
                extra: Default::default(),
            },
        })
    }

    async fn sync_incremental(&self, store: &NewsStore) -> fact_checker_client::Result<SyncOutcome> {
        self.syncs.fetch_add(1, Ordering::SeqCst);
        let mut session = store.open().await?;
        let count = session.count().await?;
        session.close().await?;
        Ok(SyncOutcome {
            indexed: count as u64,
            last_synced_id: count,
        })
    }
}

fn pipeline(config: &Config, checker: Option<Arc<dyn FactChecker>>) -> IngestPipeline {
    let impact: Arc<dyn ImpactSource> = Arc::new(FixedImpact(Impact::Critical));
    IngestPipeline::with_fetcher(
        config,
        Arc::new(feeds()),
        checker,
        Arc::new(CategoryTable::default()),
        impact,
    )
}

fn claim_store(config: &Config) -> ClaimStore {
    ClaimStore::new(StoreLocation::new(
        config.claims_db_path.clone(),
        Duration::from_secs(2),
    ))
}

fn news_store(config: &Config) -> NewsStore {
    NewsStore::new(StoreLocation::new(
        config.news_db_path.clone(),
        Duration::from_secs(2),
    ))
}

fn is_completed(outcome: Option<&StepOutcome>) -> bool {
    matches!(outcome, Some(StepOutcome::Completed { .. }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_run_collects_verifies_and_syncs() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir, &[]);
    let checker = Arc::new(MockChecker::new());
    let report = pipeline(&config, Some(checker.clone())).run().await;

    for step in Step::ALL {
        assert!(is_completed(report.outcome(step)), "{step} => {:?}", report.outcome(step));
    }
    assert_eq!(report.failed_steps(), 0);
    assert_eq!(checker.syncs.load(Ordering::SeqCst), 1);

    let mut news = news_store(&config).open().await.unwrap();
    assert_eq!(news.count().await.unwrap(), 2);

    let mut claims = claim_store(&config).open().await.unwrap();
    assert_eq!(claims.count().await.unwrap(), 4);
    assert!(claims.pending(80).await.unwrap().is_empty());

    let all = claims.recent(50).await.unwrap();
    let vaccine = all
        .iter()
        .find(|c| c.claim_text == "Vaccines contain microchips")
        .unwrap();
    assert_eq!(vaccine.platform, "Politifact");
    assert_eq!(vaccine.raw_label.as_deref(), Some("Most likely False"));
    assert_eq!(vaccine.verdict_score, Some(0.92));
    assert_eq!(vaccine.category.as_deref(), Some("Health"));
    assert_eq!(vaccine.impact.as_deref(), Some("critical"));
    assert_eq!(
        vaccine.real_evidence.as_deref(),
        Some("Evidence against: Vaccines contain microchips")
    );

    let stocks = all
        .iter()
        .find(|c| c.claim_text == "Stocks banned next week")
        .unwrap();
    assert_eq!(stocks.platform, "Tracker");
    assert_eq!(stocks.category.as_deref(), Some("Finance"));
}

#[tokio::test]
async fn one_broken_news_feed_does_not_fail_the_step() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir, &[]);
    let report = pipeline(&config, None).run().await;

    match report.outcome(Step::CollectNews) {
        Some(StepOutcome::Completed { detail }) => assert!(detail.contains("failed=1")),
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[tokio::test]
async fn verification_and_sync_are_skipped_without_a_fact_checker() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir, &[]);
    let report = pipeline(&config, None).run().await;

    assert!(matches!(
        report.outcome(Step::VerifyClaims),
        Some(StepOutcome::Skipped { .. })
    ));
    assert!(matches!(
        report.outcome(Step::SyncIndex),
        Some(StepOutcome::Skipped { .. })
    ));

    let mut claims = claim_store(&config).open().await.unwrap();
    assert_eq!(claims.pending(80).await.unwrap().len(), 4);
}

#[tokio::test]
async fn failed_step_does_not_stop_later_steps_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir, &[("DISINFO_FEED_URL", "https://missing.test/rss")]);
    let checker = Arc::new(MockChecker::new());
    let report = pipeline(&config, Some(checker)).run().await;

    assert!(report.outcome(Step::CollectDisinfo).unwrap().is_failed());
    assert!(is_completed(report.outcome(Step::VerifyClaims)));
    assert!(is_completed(report.outcome(Step::SyncIndex)));
}

#[tokio::test]
async fn fail_fast_abandons_the_rest_of_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(
        &dir,
        &[
            ("DISINFO_FEED_URL", "https://missing.test/rss"),
            ("INGEST_FAIL_FAST", "true"),
        ],
    );
    let checker = Arc::new(MockChecker::new());
    let report = pipeline(&config, Some(checker.clone())).run().await;

    assert!(report.outcome(Step::CollectDisinfo).unwrap().is_failed());
    assert_eq!(
        report.outcome(Step::VerifyClaims),
        Some(&StepOutcome::NotAttempted)
    );
    assert_eq!(
        report.outcome(Step::SyncIndex),
        Some(&StepOutcome::NotAttempted)
    );
    assert_eq!(checker.syncs.load(Ordering::SeqCst), 0);

    // Collected claims stay unverified for the next run.
    let mut claims = claim_store(&config).open().await.unwrap();
    assert_eq!(claims.pending(80).await.unwrap().len(), 3);
}

#[tokio::test]
async fn claims_that_fail_verification_are_retried_next_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir, &[]);

    let flaky = Arc::new(MockChecker::new().failing_on("Moon landing was staged"));
    let report = pipeline(&config, Some(flaky)).run().await;
    match report.outcome(Step::VerifyClaims) {
        Some(StepOutcome::Completed { detail }) => {
            assert_eq!(detail, "attempted=4 verified=3 failed=1")
        }
        other => panic!("unexpected outcome {other:?}"),
    }

    let mut claims = claim_store(&config).open().await.unwrap();
    let pending = claims.pending(80).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].claim_text, "Moon landing was staged");
    claims.close().await.unwrap();

    pipeline(&config, Some(Arc::new(MockChecker::new()))).run().await;

    let mut claims = claim_store(&config).open().await.unwrap();
    assert!(claims.pending(80).await.unwrap().is_empty());
    // Re-collecting the same feeds adds no duplicates.
    assert_eq!(claims.count().await.unwrap(), 4);
}

#[tokio::test]
async fn verify_limit_caps_a_single_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir, &[("VERIFY_LIMIT", "2")]);
    pipeline(&config, Some(Arc::new(MockChecker::new()))).run().await;

    let mut claims = claim_store(&config).open().await.unwrap();
    assert_eq!(claims.pending(80).await.unwrap().len(), 2);
}

#[test]
fn scheduler_runs_on_start_and_stops_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir, &[]);
    let report_dir = dir.path().join("reports");

    let handle = start_ingest_interval(
        Arc::new(pipeline(&config, None)),
        ScheduleConfig {
            interval: Duration::from_secs(3600),
            run_on_start: true,
            report_dir: Some(report_dir.clone()),
        },
    )
    .unwrap();

    let runs_dir = report_dir.join("ingest-runs");
    let mut written = 0;
    for _ in 0..100 {
        written = std::fs::read_dir(&runs_dir)
            .map(|entries| entries.count())
            .unwrap_or(0);
        if written > 0 {
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    handle.shutdown();
    assert_eq!(written, 1);
}

#[test]
fn scheduler_rejects_an_out_of_range_interval() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir, &[]);

    let result = start_ingest_interval(
        Arc::new(pipeline(&config, None)),
        ScheduleConfig {
            interval: Duration::MAX,
            run_on_start: false,
            report_dir: None,
        },
    );
    assert!(result.is_err());
}
