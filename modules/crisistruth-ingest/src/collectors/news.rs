use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

use crisistruth_common::{NewVerifiedItem, NewsSource};
use crisistruth_store::NewsStore;

use super::{CollectStats, Collector, FeedFetcher};

/// Collects verified news from one trusted source's feed.
pub struct NewsFeedCollector {
    source: NewsSource,
    fetcher: Arc<dyn FeedFetcher>,
    store: NewsStore,
}

impl NewsFeedCollector {
    pub fn new(source: NewsSource, fetcher: Arc<dyn FeedFetcher>, store: NewsStore) -> Self {
        Self {
            source,
            fetcher,
            store,
        }
    }
}

#[async_trait]
impl Collector for NewsFeedCollector {
    fn name(&self) -> &str {
        &self.source.name
    }

    async fn collect(&self) -> Result<CollectStats> {
        let entries = match self.fetcher.fetch(&self.source.feed_url).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(source = self.source.name.as_str(), error = %e, "Failed to fetch news feed");
                return Err(e);
            }
        };

        let scraped_at = Utc::now();
        let items: Vec<NewVerifiedItem> = entries
            .iter()
            .filter_map(|entry| {
                let title = entry.title.clone().filter(|t| !t.is_empty())?;
                Some(NewVerifiedItem {
                    title,
                    summary: entry.summary.clone(),
                    source_url: entry.url.clone(),
                    source_name: self.source.name.clone(),
                    image_url: entry.image_url.clone(),
                    scraped_at,
                })
            })
            .collect();

        let mut session = self.store.open_for_write().await?;
        let inserted = session.insert_many(&items).await?;
        session.close().await?;

        info!(
            source = self.source.name.as_str(),
            entries = entries.len(),
            inserted,
            "News feed collected"
        );

        Ok(CollectStats {
            fetched: 1,
            failed: 0,
            entries: entries.len() as u32,
            inserted,
        })
    }
}
