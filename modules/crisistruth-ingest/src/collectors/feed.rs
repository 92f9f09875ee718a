// RSS/Atom feed fetching shared by every collector.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

const FEED_MAX_ITEMS: usize = 50;

/// One entry of a parsed feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub url: String,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub image_url: Option<String>,
    pub published: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, feed_url: &str) -> Result<Vec<FeedEntry>>;
}

/// Fetches feeds over HTTP.
pub struct HttpFeedFetcher {
    client: reqwest::Client,
}

impl HttpFeedFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(concat!("crisistruth-ingest/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build feed HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, feed_url: &str) -> Result<Vec<FeedEntry>> {
        let resp = self
            .client
            .get(feed_url)
            .send()
            .await
            .context("Feed fetch failed")?
            .error_for_status()
            .context("Feed returned an error status")?;

        let bytes = resp.bytes().await.context("Failed to read feed body")?;
        let entries = parse_feed(&bytes)?;
        info!(feed_url, items = entries.len(), "feed: parsed successfully");
        Ok(entries)
    }
}

/// Serves canned feed bodies keyed by url. Used by tests and offline runs.
#[derive(Default)]
pub struct StaticFeedFetcher {
    bodies: HashMap<String, String>,
}

impl StaticFeedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feed(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.bodies.insert(url.into(), body.into());
        self
    }
}

#[async_trait]
impl FeedFetcher for StaticFeedFetcher {
    async fn fetch(&self, feed_url: &str) -> Result<Vec<FeedEntry>> {
        let body = self
            .bodies
            .get(feed_url)
            .with_context(|| format!("no feed registered for {feed_url}"))?;
        parse_feed(body.as_bytes())
    }
}

/// Parse an RSS/Atom/JSON feed body. Entries without a link are dropped;
/// the result is newest first and capped.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<FeedEntry>> {
    let feed = feed_rs::parser::parse(bytes).context("Failed to parse RSS/Atom feed")?;

    let mut entries: Vec<FeedEntry> = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let url = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()))?;

            let image_url = entry.media.iter().find_map(|m| {
                m.content
                    .iter()
                    .find_map(|c| c.url.as_ref().map(|u| u.to_string()))
                    .or_else(|| m.thumbnails.first().map(|t| t.image.uri.clone()))
            });

            Some(FeedEntry {
                url,
                title: entry.title.map(|t| t.content.trim().to_string()),
                summary: entry
                    .summary
                    .map(|t| t.content.trim().to_string())
                    .filter(|s| !s.is_empty()),
                image_url,
                published: entry
                    .published
                    .or(entry.updated)
                    .map(|dt| dt.with_timezone(&Utc)),
            })
        })
        .collect();

    entries.sort_by(|a, b| b.published.cmp(&a.published));
    entries.truncate(FEED_MAX_ITEMS);
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>Wire</title>
    <item>
      <title> Older story </title>
      <link>https://wire.example.com/older</link>
      <description>Earlier</description>
      <pubDate>Mon, 01 Jan 2024 08:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Newer story</title>
      <link>https://wire.example.com/newer</link>
      <description></description>
      <media:content url="https://img.example.com/newer.jpg" medium="image"/>
      <pubDate>Tue, 02 Jan 2024 08:00:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn parses_rss_newest_first() {
        let entries = parse_feed(RSS.as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].url, "https://wire.example.com/newer");
        assert_eq!(
            entries[0].image_url.as_deref(),
            Some("https://img.example.com/newer.jpg")
        );
        assert!(entries[0].summary.is_none());
        assert_eq!(entries[1].title.as_deref(), Some("Older story"));
        assert_eq!(entries[1].summary.as_deref(), Some("Earlier"));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(parse_feed(b"<html>not a feed</html>").is_err());
    }

    #[tokio::test]
    async fn static_fetcher_errors_for_unknown_urls() {
        let fetcher = StaticFeedFetcher::new().with_feed("https://a", RSS);
        assert_eq!(fetcher.fetch("https://a").await.unwrap().len(), 2);
        assert!(fetcher.fetch("https://b").await.is_err());
    }
}
