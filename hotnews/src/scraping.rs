use anyhow::{Context, Result};
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, warn};

use crate::text::html_to_text;

// Heuristic order: the first selector that yields text wins.
const CONTENT_SELECTORS: [&str; 5] = ["article", "main", ".post-content", ".entry-content", "#content"];

/// Fetches article pages and extracts their readable text.
#[derive(Debug, Clone)]
pub struct ArticleScraper {
    client: Client,
    max_chars: usize,
}

impl ArticleScraper {
    pub fn new(timeout_secs: u64, max_chars: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("HotNews/0.1.0")
            .build()
            .context("failed to build reqwest client")?;
        Ok(Self { client, max_chars })
    }

    /// Scrapes the content of an article from the given URL.
    pub async fn scrape(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("failed to fetch article page")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("article fetch failed with status: {}", status);
        }

        let html = response.text().await.context("failed to read response body")?;
        let text = extract_article_text(&html);
        if text.is_empty() {
            anyhow::bail!("no readable content found at {}", url);
        }
        debug!("scraping: extracted {} chars from {}", text.chars().count(), url);
        Ok(text.chars().take(self.max_chars).collect())
    }
}

/// Pull the main text out of an article page. Returns an empty string when nothing is found.
pub fn extract_article_text(html: &str) -> String {
    let document = Html::parse_document(html);

    for selector_str in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text = html_to_text(&element.html());
            if !text.trim().is_empty() {
                return text.trim().to_string();
            }
        }
    }

    // Fallback: every paragraph on the page
    let Ok(p_selector) = Selector::parse("p") else {
        return String::new();
    };
    let paragraphs: String = document
        .select(&p_selector)
        .map(|element| element.html())
        .collect::<Vec<_>>()
        .join("\n");
    if paragraphs.is_empty() {
        warn!("scraping: page has no article, main or paragraph content");
        return String::new();
    }
    html_to_text(&paragraphs).trim().to_string()
}
