pub mod error;
pub mod types;

pub use error::{FactCheckError, Result};
pub use types::{FactCheck, SyncOutcome, VerdictMeta};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crisistruth_store::NewsStore;

use crate::types::{CheckRequest, HealthResponse, IndexDocument, IndexRequest, IndexResponse};

const SYNC_BATCH_SIZE: u32 = 200;

/// The claim verification service.
///
/// One instance is shared by request handlers and the ingestion scheduler.
/// Implementations must tolerate `sync_incremental` running while `check_fact`
/// calls are in flight.
#[async_trait]
pub trait FactChecker: Send + Sync {
    /// Verify a single free-text claim.
    async fn check_fact(&self, claim: &str) -> Result<FactCheck>;

    /// Bring the service's index up to date with items added to the news store.
    async fn sync_incremental(&self, store: &NewsStore) -> Result<SyncOutcome>;
}

/// Initialize the shared fact checker if one is configured. Any failure is logged
/// and leaves verification unavailable; the caller keeps running without it.
pub async fn connect_optional(
    base_url: Option<&str>,
    timeout: Duration,
) -> Option<Arc<dyn FactChecker>> {
    let Some(base_url) = base_url else {
        warn!("FACT_CHECKER_URL not set; verification disabled");
        return None;
    };
    match HttpFactChecker::connect(base_url, timeout).await {
        Ok(checker) => Some(Arc::new(checker)),
        Err(e) => {
            error!(base_url, error = %e, "Failed to initialize fact checker");
            None
        }
    }
}

/// Talks to the verification model over HTTP.
pub struct HttpFactChecker {
    client: reqwest::Client,
    base_url: String,
    /// Highest news id already pushed. Held across the whole sync so two syncs
    /// never push overlapping batches.
    sync_cursor: Mutex<i64>,
}

impl HttpFactChecker {
    /// Connect and confirm the service is up. An error here means verification
    /// is unavailable for the life of the process.
    pub async fn connect(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FactCheckError::Network(e.to_string()))?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let resp = client.get(format!("{base_url}/health")).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(FactCheckError::Api {
                status: status.as_u16(),
                message,
            });
        }
        let health: HealthResponse = resp.json().await.unwrap_or_default();
        let cursor = health.last_indexed_id.unwrap_or(0);

        info!(
            base_url = base_url.as_str(),
            last_indexed_id = cursor,
            "Fact checker connected"
        );

        Ok(Self {
            client,
            base_url,
            sync_cursor: Mutex::new(cursor),
        })
    }

    pub async fn last_synced_id(&self) -> i64 {
        *self.sync_cursor.lock().await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: serde::Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let resp = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(FactCheckError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| FactCheckError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl FactChecker for HttpFactChecker {
    async fn check_fact(&self, claim: &str) -> Result<FactCheck> {
        debug!(chars = claim.len(), "Checking claim");
        self.post_json("/check", &CheckRequest { claim }).await
    }

    async fn sync_incremental(&self, store: &NewsStore) -> Result<SyncOutcome> {
        let mut cursor = self.sync_cursor.lock().await;
        let mut session = store.open().await?;
        let mut indexed = 0;

        loop {
            let batch = session.inserted_after(*cursor, SYNC_BATCH_SIZE).await?;
            let Some(last) = batch.last().map(|item| item.id) else {
                break;
            };

            let request = IndexRequest {
                documents: batch.iter().map(IndexDocument::from).collect(),
            };
            let resp: IndexResponse = self.post_json("/index", &request).await?;
            indexed += resp.indexed;
            *cursor = last;
            debug!(indexed = resp.indexed, last_id = last, "Index batch synced");

            if (batch.len() as u32) < SYNC_BATCH_SIZE {
                break;
            }
        }

        session.close().await?;
        Ok(SyncOutcome {
            indexed,
            last_synced_id: *cursor,
        })
    }
}
