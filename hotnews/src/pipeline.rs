use common::FeedSource;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::ingestion::{FeedEntry, FeedFetcher};
use crate::llm::summarizer::{summarize_with_fallback, AiSummarizer};
use crate::text::TextSummarizer;

/// A fetched entry enriched with its summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsItem {
    pub title: String,
    pub url: String,
    pub publish_date: Option<String>,
    /// Either `"AI: ..."` or truncated description text ending in `...`
    pub summary: String,
}

/// Fetch + summarize for one news source.
#[derive(Clone)]
pub struct SourcePipeline {
    fetcher: Arc<FeedFetcher>,
    ai: Option<AiSummarizer>,
    text: TextSummarizer,
    max_items: usize,
    concurrency: usize,
}

impl SourcePipeline {
    pub fn new(fetcher: Arc<FeedFetcher>, ai: Option<AiSummarizer>, text: TextSummarizer) -> Self {
        Self {
            fetcher,
            ai,
            text,
            max_items: common::DEFAULT_MAX_ITEMS,
            concurrency: 1,
        }
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    /// Number of entries summarized at the same time. Output order is unaffected.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Produce at most `max_items` summarized items for `source`, in fetch order.
    pub async fn build(&self, source: &FeedSource) -> Vec<NewsItem> {
        let mut entries = self.fetcher.fetch(&source.feed_url, self.max_items).await;
        entries.truncate(self.max_items);

        let items: Vec<NewsItem> = stream::iter(entries)
            .map(|entry| enrich(self.ai.clone(), self.text, entry))
            .buffered(self.concurrency)
            .collect()
            .await;

        info!("{}: {} items ready", source.key, items.len());
        items
    }
}

async fn enrich(ai: Option<AiSummarizer>, text: TextSummarizer, entry: FeedEntry) -> NewsItem {
    debug!("summarizing {}", entry.url);
    let summary = summarize_with_fallback(ai.as_ref(), &text, &entry.url, &entry.description_html).await;
    NewsItem {
        title: entry.title,
        url: entry.url,
        publish_date: entry.publish_date,
        summary,
    }
}
