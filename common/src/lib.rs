/*!
common/src/lib.rs

Shared configuration types and loaders for hotnews.

This file provides:
- Config data structures (deserialized from TOML)
- An async loader that merges a default and an override TOML file
- The feed source mapping (deserialized from JSON) and source selection
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_AGGREGATOR_ENDPOINT: &str = "https://rss-worker.thinkingincrowd.workers.dev/";
pub const DEFAULT_SUMMARY_PROMPT: &str = "请用中文简短概括这篇文章的内容。";
pub const DEFAULT_MAX_ITEMS: usize = 3;
pub const DEFAULT_MAX_CHARS: usize = 300;
pub const DEFAULT_AI_TIMEOUT_SECONDS: u64 = 600;
pub const DEFAULT_SOURCE_TIMEOUT_SECONDS: u64 = 600;
pub const DEFAULT_FETCH_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_MAX_BLOCKS_PER_MESSAGE: usize = 50;

/// How entries are retrieved for a feed URL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// JSON aggregator endpoint templated with `?url=<feed>&max=<n>`
    #[default]
    Aggregator,
    /// Fetch and parse the RSS/Atom document directly
    Direct,
}

/// Feed retrieval configuration section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregatorConfig {
    pub endpoint: Option<String>,
    pub mode: Option<FetchMode>,
    pub timeout_seconds: Option<u64>,
    /// Cap on the number of items kept per source
    pub max_items: Option<usize>,
}

impl AggregatorConfig {
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_AGGREGATOR_ENDPOINT)
    }

    pub fn mode(&self) -> FetchMode {
        self.mode.unwrap_or_default()
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds.unwrap_or(DEFAULT_FETCH_TIMEOUT_SECONDS)
    }

    pub fn max_items(&self) -> usize {
        self.max_items.unwrap_or(DEFAULT_MAX_ITEMS)
    }
}

/// Summarization configuration section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryConfig {
    pub max_chars: Option<usize>,
    pub prompt: Option<String>,
    pub ai_timeout_seconds: Option<u64>,
    /// Number of items of one source summarized at the same time
    pub concurrency: Option<usize>,
}

impl SummaryConfig {
    pub fn max_chars(&self) -> usize {
        self.max_chars.unwrap_or(DEFAULT_MAX_CHARS)
    }

    pub fn prompt(&self) -> &str {
        self.prompt.as_deref().unwrap_or(DEFAULT_SUMMARY_PROMPT)
    }

    pub fn ai_timeout_seconds(&self) -> u64 {
        self.ai_timeout_seconds.unwrap_or(DEFAULT_AI_TIMEOUT_SECONDS)
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency.unwrap_or(1).max(1)
    }
}

/// Where the source mapping lives and which keys are active
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Path to the JSON source mapping (e.g. "data/hot_news_rss.json")
    pub file: String,
    /// Ordered list of active keys; empty means every key in the mapping
    #[serde(default)]
    pub enabled: Vec<String>,
}

/// Fan-out driver configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriverConfig {
    pub source_timeout_seconds: Option<u64>,
}

impl DriverConfig {
    pub fn source_timeout_seconds(&self) -> u64 {
        self.source_timeout_seconds.unwrap_or(DEFAULT_SOURCE_TIMEOUT_SECONDS)
    }
}

/// Remote LLM config (used if `llm.adapter = "remote"`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteLlmConfig {
    pub api_url: Option<String>,
    pub api_key_env: Option<String>,
    pub model: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub max_tokens: Option<usize>,
    /// Upper bound on scraped article text sent along with the prompt
    pub article_max_chars: Option<usize>,
}

/// LLM top-level config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub adapter: Option<String>, // "remote", "none"
    pub remote: Option<RemoteLlmConfig>,
}

/// Outbound chat delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Name of the environment variable holding the webhook URL
    pub webhook_url_env: Option<String>,
    pub max_blocks_per_message: Option<usize>,
}

impl DeliveryConfig {
    pub fn max_blocks_per_message(&self) -> usize {
        self.max_blocks_per_message
            .unwrap_or(DEFAULT_MAX_BLOCKS_PER_MESSAGE)
            .max(1)
    }
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub aggregator: AggregatorConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
    pub sources: SourcesConfig,
    #[serde(default)]
    pub driver: DriverConfig,
    pub llm: Option<LlmConfig>,
    pub delivery: Option<DeliveryConfig>,
}

impl Config {
    /// Load configuration from a TOML file asynchronously.
    ///
    /// Example:
    ///   let cfg = Config::from_file("config.toml").await?;
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let cfg: Config = toml::from_str(&data).context("Failed to parse TOML configuration")?;
        Ok(cfg)
    }

    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence).
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        for path in [default_path, override_path].into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            let data = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let val: toml::Value = toml::from_str(&data)
                .with_context(|| format!("Failed to parse configuration: {}", path.display()))?;
            merge_toml(&mut config_value, val);
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        Ok(cfg)
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}

/// One configured origin of news items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub key: String,
    pub feed_url: String,
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
struct SourceEntry {
    rss: RssGroup,
}

#[derive(Debug, Deserialize)]
struct RssGroup {
    hot: HotFeed,
}

#[derive(Debug, Deserialize)]
struct HotFeed {
    url: String,
    name: String,
}

/// The immutable source mapping: key -> feed URL + display name.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: BTreeMap<String, FeedSource>,
}

impl SourceRegistry {
    /// Parse the `{key: {rss: {hot: {url, name}}}}` mapping.
    pub fn from_json(data: &str) -> Result<Self> {
        let raw: BTreeMap<String, SourceEntry> =
            serde_json::from_str(data).context("Failed to parse source mapping JSON")?;
        let sources = raw
            .into_iter()
            .map(|(key, entry)| {
                let source = FeedSource {
                    key: key.clone(),
                    feed_url: entry.rss.hot.url,
                    display_name: entry.rss.hot.name,
                };
                (key, source)
            })
            .collect();
        Ok(Self { sources })
    }

    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read source mapping: {}", path.as_ref().display()))?;
        Self::from_json(&data)
    }

    pub fn get(&self, key: &str) -> Option<&FeedSource> {
        self.sources.get(key)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Resolve the given keys in order. An empty list selects every source, sorted by key.
    pub fn select(&self, keys: &[String]) -> Result<Vec<FeedSource>> {
        if keys.is_empty() {
            return Ok(self.sources.values().cloned().collect());
        }
        keys.iter()
            .map(|key| {
                self.get(key)
                    .cloned()
                    .with_context(|| format!("Unknown source key '{}' in configuration", key))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MAPPING: &str = r#"{
        "hackernews": {"rss": {"hot": {"url": "https://news.ycombinator.com/rss", "name": "Hacker News"}}},
        "1point3acres": {"rss": {"hot": {"url": "https://example.org/1p3a.xml", "name": "一亩三分地"}}}
    }"#;

    #[test]
    fn config_from_string_uses_defaults() {
        let toml = r#"
            [sources]
            file = "data/hot_news_rss.json"
            enabled = ["1point3acres"]
        "#;

        let cfg: Config = toml::from_str(toml).expect("parse config");
        assert_eq!(cfg.sources.enabled, vec!["1point3acres".to_string()]);
        assert_eq!(cfg.aggregator.endpoint(), DEFAULT_AGGREGATOR_ENDPOINT);
        assert_eq!(cfg.aggregator.mode(), FetchMode::Aggregator);
        assert_eq!(cfg.aggregator.max_items(), 3);
        assert_eq!(cfg.summary.max_chars(), 300);
        assert_eq!(cfg.summary.ai_timeout_seconds(), 600);
        assert_eq!(cfg.summary.concurrency(), 1);
        assert_eq!(cfg.driver.source_timeout_seconds(), 600);
        assert!(cfg.llm.is_none());
    }

    #[tokio::test]
    async fn override_file_is_merged_over_defaults() {
        let mut default_file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            default_file,
            r#"
            [aggregator]
            mode = "direct"
            max_items = 5

            [sources]
            file = "sources.json"
            "#
        )
        .expect("write default");

        let mut override_file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            override_file,
            r#"
            [aggregator]
            max_items = 2

            [summary]
            concurrency = 4
            "#
        )
        .expect("write override");

        let cfg = Config::load_with_defaults(Some(default_file.path()), Some(override_file.path()))
            .await
            .expect("load config");

        assert_eq!(cfg.aggregator.mode(), FetchMode::Direct);
        assert_eq!(cfg.aggregator.max_items(), 2);
        assert_eq!(cfg.summary.concurrency(), 4);
        assert_eq!(cfg.sources.file, "sources.json");
    }

    #[test]
    fn registry_parses_mapping_and_selects_in_order() {
        let registry = SourceRegistry::from_json(MAPPING).expect("parse mapping");
        assert_eq!(registry.len(), 2);

        let hn = registry.get("hackernews").expect("hackernews");
        assert_eq!(hn.feed_url, "https://news.ycombinator.com/rss");
        assert_eq!(hn.display_name, "Hacker News");

        let selected = registry
            .select(&["hackernews".to_string(), "1point3acres".to_string()])
            .expect("select");
        assert_eq!(selected[0].key, "hackernews");
        assert_eq!(selected[1].key, "1point3acres");

        let all = registry.select(&[]).expect("select all");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].key, "1point3acres");
    }

    #[test]
    fn registry_rejects_unknown_key() {
        let registry = SourceRegistry::from_json(MAPPING).expect("parse mapping");
        let err = registry.select(&["producthunt".to_string()]).unwrap_err();
        assert!(err.to_string().contains("producthunt"));
    }

    #[tokio::test]
    async fn registry_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(MAPPING.as_bytes()).expect("write mapping");

        let registry = SourceRegistry::from_file(file.path()).await.expect("load mapping");
        assert!(!registry.is_empty());
        assert_eq!(registry.get("1point3acres").map(|s| s.display_name.as_str()), Some("一亩三分地"));
    }
}
