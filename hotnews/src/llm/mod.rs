use anyhow::Result;

/// Core trait for answer-generation backends.
///
/// A request carries one or more instructions plus the URLs of the documents
/// the answer should be grounded on.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate an answer for the given prompts and source URLs
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse>;
}

/// Request structure for answer generation
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub prompts: Vec<String>,
    pub urls: Vec<String>,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
    pub timeout_seconds: Option<u64>,
}

impl LlmRequest {
    pub fn new(prompt: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            prompts: vec![prompt.into()],
            urls: vec![url.into()],
            max_tokens: None,
            temperature: None,
            timeout_seconds: None,
        }
    }
}

/// Response from answer generation
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub usage: UsageMetadata,
    pub model: String,
}

/// Token usage metadata
#[derive(Debug, Clone, Default)]
pub struct UsageMetadata {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

pub mod remote;
pub mod summarizer;

pub use summarizer::AiSummarizer;
