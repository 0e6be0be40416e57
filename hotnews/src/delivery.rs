use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::info;

use crate::blocks::DisplayBlock;

/// Posts rendered blocks to a chat incoming-webhook.
pub struct SlackWebhook {
    webhook_url: String,
    max_blocks_per_message: usize,
    client: Client,
}

impl SlackWebhook {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            max_blocks_per_message: common::DEFAULT_MAX_BLOCKS_PER_MESSAGE,
            client: Client::new(),
        }
    }

    /// Build from the `[delivery]` section; `None` when no webhook URL is available.
    pub fn from_config(config: &common::DeliveryConfig) -> Option<Self> {
        let env_name = config.webhook_url_env.as_deref()?;
        let Ok(url) = std::env::var(env_name) else {
            tracing::debug!("delivery disabled ({} not set)", env_name);
            return None;
        };
        Some(Self::new(url).with_max_blocks(config.max_blocks_per_message()))
    }

    pub fn with_max_blocks(mut self, max_blocks: usize) -> Self {
        self.max_blocks_per_message = max_blocks.max(1);
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.client = Client::builder()
            .timeout(Duration::from_secs(secs))
            .build()
            .unwrap_or_default();
        self
    }

    /// Post all blocks, split into messages of at most `max_blocks_per_message`.
    /// Returns the number of messages sent.
    pub async fn send(&self, blocks: &[DisplayBlock]) -> Result<usize> {
        let mut sent = 0;
        for chunk in blocks.chunks(self.max_blocks_per_message) {
            let body = serde_json::json!({ "blocks": chunk });
            self.client
                .post(&self.webhook_url)
                .json(&body)
                .send()
                .await
                .context("webhook post")?
                .error_for_status()
                .context("webhook non-2xx")?;
            sent += 1;
        }
        info!("delivered {} blocks in {} messages", blocks.len(), sent);
        Ok(sent)
    }
}
