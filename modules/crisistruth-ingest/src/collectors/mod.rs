//! Source collectors. Each pulls one kind of source into one store.

pub mod claims;
pub mod feed;
pub mod news;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

pub use claims::{ClaimFeedCollector, PagedClaimCollector};
pub use feed::{FeedEntry, FeedFetcher, HttpFeedFetcher, StaticFeedFetcher};
pub use news::NewsFeedCollector;

/// Counters for one collector pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectStats {
    /// Feeds or pages fetched successfully.
    pub fetched: u32,
    /// Feeds or pages that failed and were skipped.
    pub failed: u32,
    /// Entries seen across all fetched feeds.
    pub entries: u32,
    /// New rows written; duplicates are not counted.
    pub inserted: u64,
}

impl CollectStats {
    pub fn merge(&mut self, other: CollectStats) {
        self.fetched += other.fetched;
        self.failed += other.failed;
        self.entries += other.entries;
        self.inserted += other.inserted;
    }
}

impl std::fmt::Display for CollectStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "fetched={} failed={} entries={} inserted={}",
            self.fetched, self.failed, self.entries, self.inserted
        )
    }
}

#[async_trait]
pub trait Collector: Send + Sync {
    fn name(&self) -> &str;

    /// Run one pass. An `Err` means nothing could be collected at all;
    /// individual feed failures are counted in the stats instead.
    async fn collect(&self) -> Result<CollectStats>;
}
