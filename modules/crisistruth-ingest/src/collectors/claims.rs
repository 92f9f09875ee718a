use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use crisistruth_common::NewFlaggedClaim;
use crisistruth_store::ClaimStore;

use super::{CollectStats, Collector, FeedEntry, FeedFetcher};

const PAGE_PLACEHOLDER: &str = "{page}";

fn to_claims(entries: &[FeedEntry], platform: &str) -> Vec<NewFlaggedClaim> {
    entries
        .iter()
        .filter_map(|entry| {
            let claim_text = entry.title.clone().filter(|t| !t.is_empty())?;
            Some(NewFlaggedClaim {
                claim_text,
                content: entry.summary.clone(),
                source_url: entry.url.clone(),
                platform: platform.to_string(),
            })
        })
        .collect()
}

async fn store_claims(store: &ClaimStore, claims: &[NewFlaggedClaim]) -> Result<u64> {
    let mut session = store.open_for_write().await?;
    let inserted = session.insert_many(claims).await?;
    session.close().await?;
    Ok(inserted)
}

/// Fact-check listing paged through a `{page}` url template, pages `1..=pages`.
pub struct PagedClaimCollector {
    platform: String,
    url_template: String,
    pages: u32,
    fetcher: Arc<dyn FeedFetcher>,
    store: ClaimStore,
}

impl PagedClaimCollector {
    pub fn new(
        platform: impl Into<String>,
        url_template: impl Into<String>,
        pages: u32,
        fetcher: Arc<dyn FeedFetcher>,
        store: ClaimStore,
    ) -> Self {
        Self {
            platform: platform.into(),
            url_template: url_template.into(),
            pages,
            fetcher,
            store,
        }
    }

    /// Urls to fetch. A template without a placeholder is a single page.
    pub fn page_urls(&self) -> Vec<String> {
        if !self.url_template.contains(PAGE_PLACEHOLDER) {
            return vec![self.url_template.clone()];
        }
        (1..=self.pages)
            .map(|page| self.url_template.replace(PAGE_PLACEHOLDER, &page.to_string()))
            .collect()
    }
}

#[async_trait]
impl Collector for PagedClaimCollector {
    fn name(&self) -> &str {
        &self.platform
    }

    async fn collect(&self) -> Result<CollectStats> {
        let mut stats = CollectStats::default();
        let mut last_error = None;

        for url in self.page_urls() {
            let entries = match self.fetcher.fetch(&url).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(
                        platform = self.platform.as_str(),
                        url = url.as_str(),
                        error = %e,
                        "Failed to fetch claim page"
                    );
                    stats.failed += 1;
                    last_error = Some(e);
                    continue;
                }
            };
            stats.fetched += 1;
            stats.entries += entries.len() as u32;

            if entries.is_empty() {
                // Past the last page.
                break;
            }
            stats.inserted += store_claims(&self.store, &to_claims(&entries, &self.platform)).await?;
        }

        if stats.fetched == 0 {
            if let Some(e) = last_error {
                return Err(e.context(format!("no {} pages could be fetched", self.platform)));
            }
            bail!("{} has no pages configured", self.platform);
        }

        info!(platform = self.platform.as_str(), %stats, "Paged claims collected");
        Ok(stats)
    }
}

/// Single-pass disinformation tracker feed.
pub struct ClaimFeedCollector {
    platform: String,
    feed_url: String,
    fetcher: Arc<dyn FeedFetcher>,
    store: ClaimStore,
}

impl ClaimFeedCollector {
    pub fn new(
        platform: impl Into<String>,
        feed_url: impl Into<String>,
        fetcher: Arc<dyn FeedFetcher>,
        store: ClaimStore,
    ) -> Self {
        Self {
            platform: platform.into(),
            feed_url: feed_url.into(),
            fetcher,
            store,
        }
    }
}

#[async_trait]
impl Collector for ClaimFeedCollector {
    fn name(&self) -> &str {
        &self.platform
    }

    async fn collect(&self) -> Result<CollectStats> {
        let entries = self.fetcher.fetch(&self.feed_url).await?;
        let inserted = store_claims(&self.store, &to_claims(&entries, &self.platform)).await?;

        let stats = CollectStats {
            fetched: 1,
            failed: 0,
            entries: entries.len() as u32,
            inserted,
        };
        info!(platform = self.platform.as_str(), %stats, "Claim feed collected");
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::collectors::StaticFeedFetcher;
    use crisistruth_store::StoreLocation;

    fn collector(template: &str, pages: u32) -> PagedClaimCollector {
        PagedClaimCollector::new(
            "Politifact",
            template,
            pages,
            Arc::new(StaticFeedFetcher::new()),
            ClaimStore::new(StoreLocation::new("unused.db", Duration::from_secs(1))),
        )
    }

    #[test]
    fn page_urls_expand_the_placeholder() {
        assert_eq!(
            collector("https://pf.example.com/list?page={page}", 3).page_urls(),
            vec![
                "https://pf.example.com/list?page=1",
                "https://pf.example.com/list?page=2",
                "https://pf.example.com/list?page=3",
            ]
        );
    }

    #[test]
    fn template_without_placeholder_is_one_page() {
        assert_eq!(
            collector("https://pf.example.com/rss", 4).page_urls(),
            vec!["https://pf.example.com/rss"]
        );
    }

    #[test]
    fn entries_without_titles_are_not_claims() {
        let entries = vec![
            FeedEntry {
                url: "https://a".into(),
                title: Some("Claim A".into()),
                summary: Some("Body".into()),
                image_url: None,
                published: None,
            },
            FeedEntry {
                url: "https://b".into(),
                title: None,
                summary: None,
                image_url: None,
                published: None,
            },
        ];
        let claims = to_claims(&entries, "Snopes");
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].platform, "Snopes");
        assert_eq!(claims[0].content.as_deref(), Some("Body"));
    }
}
