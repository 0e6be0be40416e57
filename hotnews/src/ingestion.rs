use anyhow::{Context, Result};
use common::FetchMode;
use feed_rs::parser;
use reqwest::{header, Client};
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info, warn};
use url::Url;

/// One raw entry as returned by a feed, before summarization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub url: String,
    /// Raw description HTML, the input of the plain-text fallback summary
    pub description_html: String,
    pub publish_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AggregatorResponse {
    items: Vec<AggregatorItem>,
}

#[derive(Debug, Deserialize)]
struct AggregatorItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, rename = "pubDate")]
    pub_date: Option<String>,
}

impl From<AggregatorItem> for FeedEntry {
    fn from(item: AggregatorItem) -> Self {
        Self {
            title: item.title.unwrap_or_default(),
            url: item.link.unwrap_or_default(),
            description_html: item.description.unwrap_or_default(),
            publish_date: item.pub_date,
        }
    }
}

/// Retrieves a capped number of entries for a feed URL.
///
/// Every failure (transport, non-200, malformed body) is logged and turned into
/// an empty list; `fetch` never returns an error.
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: Client,
    endpoint: Url,
    mode: FetchMode,
}

impl FeedFetcher {
    pub fn new(endpoint: &str, mode: FetchMode, timeout_secs: u64) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .with_context(|| format!("invalid aggregator endpoint: {}", endpoint))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("HotNews/0.1.0")
            .build()
            .context("failed to build reqwest client")?;
        Ok(Self { client, endpoint, mode })
    }

    pub fn from_config(config: &common::AggregatorConfig) -> Result<Self> {
        Self::new(config.endpoint(), config.mode(), config.timeout_seconds())
    }

    pub fn mode(&self) -> FetchMode {
        self.mode
    }

    /// Fetch at most `max_items` entries of `feed_url`, in the feed's own order.
    pub async fn fetch(&self, feed_url: &str, max_items: usize) -> Vec<FeedEntry> {
        info!("Getting rss from {}", feed_url);
        let result = match self.mode {
            FetchMode::Aggregator => self.fetch_from_aggregator(feed_url, max_items).await,
            FetchMode::Direct => self.fetch_direct(feed_url, max_items).await,
        };
        match result {
            Ok(entries) => {
                info!("Fetched {} entries from {}", entries.len(), feed_url);
                entries
            }
            Err(e) => {
                error!("Error: unable to get rss content for {}: {:#}", feed_url, e);
                Vec::new()
            }
        }
    }

    async fn fetch_from_aggregator(&self, feed_url: &str, max_items: usize) -> Result<Vec<FeedEntry>> {
        let max = max_items.to_string();
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("url", feed_url), ("max", max.as_str())])
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .context("aggregator request failed")?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            warn!(
                "Error: {} - {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown")
            );
            return Ok(Vec::new());
        }

        let body = response.text().await.context("failed to read aggregator body")?;
        parse_aggregator_body(&body, max_items)
    }

    async fn fetch_direct(&self, feed_url: &str, max_items: usize) -> Result<Vec<FeedEntry>> {
        let response = self
            .client
            .get(feed_url)
            .send()
            .await
            .context("feed request failed")?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                "Error: {} - {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown")
            );
            return Ok(Vec::new());
        }

        let bytes = response.bytes().await.context("failed to read response body")?;
        parse_feed_document(bytes.as_ref(), max_items)
    }
}

/// Parse the aggregator's `{ items: [...] }` JSON, keeping the first `max_items` entries.
pub fn parse_aggregator_body(body: &str, max_items: usize) -> Result<Vec<FeedEntry>> {
    let parsed: AggregatorResponse =
        serde_json::from_str(body).context("Unable to get rss json content")?;
    Ok(parsed.items.into_iter().take(max_items).map(FeedEntry::from).collect())
}

/// Parse an RSS/Atom/JSON Feed document, keeping the first `max_items` entries.
pub fn parse_feed_document(bytes: &[u8], max_items: usize) -> Result<Vec<FeedEntry>> {
    let feed = parser::parse(bytes).context("failed to parse feed")?;
    let entries = feed
        .entries
        .into_iter()
        .take(max_items)
        .map(|entry| {
            let description_html = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body))
                .unwrap_or_default();
            FeedEntry {
                title: entry.title.map(|t| t.content).unwrap_or_default(),
                url: entry.links.first().map(|l| l.href.clone()).unwrap_or_default(),
                description_html,
                publish_date: entry.published.or(entry.updated).map(|d| d.to_rfc3339()),
            }
        })
        .collect();
    Ok(entries)
}
