// Summarizer module
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use super::{LlmProvider, LlmRequest};
use crate::text::TextSummarizer;

/// Marker put in front of every AI-generated summary
pub const AI_PREFIX: &str = "AI: ";

/// Wraps an answer provider with a hard deadline. Failures become `None`.
#[derive(Clone)]
pub struct AiSummarizer {
    provider: Arc<dyn LlmProvider>,
    prompt: String,
    timeout: Duration,
}

impl AiSummarizer {
    pub fn new(provider: Arc<dyn LlmProvider>, prompt: impl Into<String>, timeout: Duration) -> Self {
        Self {
            provider,
            prompt: prompt.into(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Ask the provider for a summary of the article at `url`.
    ///
    /// The call runs on its own task raced against the timeout. Errors, panics
    /// and timeouts are logged and yield `None`; a timed out task is aborted.
    pub async fn summarize(&self, url: &str) -> Option<String> {
        let provider = Arc::clone(&self.provider);
        let request = LlmRequest::new(self.prompt.clone(), url);

        let handle = tokio::spawn(async move { provider.generate(request).await });
        let abort = handle.abort_handle();

        match tokio::time::timeout(self.timeout, handle).await {
            Ok(Ok(Ok(response))) => {
                info!(
                    "AI summary for {} received from {} ({} tokens)",
                    url, response.model, response.usage.total_tokens
                );
                Some(response.content)
            }
            Ok(Ok(Err(e))) => {
                warn!("AI summary for {} failed: {:#}", url, e);
                None
            }
            Ok(Err(join_err)) => {
                error!("AI summary task for {} could not be joined: {}", url, join_err);
                None
            }
            Err(_) => {
                abort.abort();
                warn!("AI summary for {} timed out after {:?}", url, self.timeout);
                None
            }
        }
    }
}

/// Produce the summary for one entry: AI first, plain-text truncation as fallback.
pub async fn summarize_with_fallback(
    ai: Option<&AiSummarizer>,
    fallback: &TextSummarizer,
    url: &str,
    description_html: &str,
) -> String {
    if let Some(ai) = ai {
        if let Some(answer) = ai.summarize(url).await {
            return format!("{}{}", AI_PREFIX, answer);
        }
    }
    fallback.summarize(description_html)
}
