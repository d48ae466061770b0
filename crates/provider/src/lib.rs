//! Structured language-model completion
//!
//! One request shape: a fully rendered prompt, optionally with JSON output
//! forced, answered by a single completion. Implementations handle their own
//! bounded retries on transient failures.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use thiserror::Error;

pub mod deepseek;
pub mod structured;

pub use deepseek::DeepSeekProvider;
pub use structured::parse_structured;

/// Provider errors
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("response decode failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("api error: {0}")]
    Api(String),

    #[error("no api key configured")]
    NoApiKey,

    #[error("malformed response")]
    InvalidResponse,

    #[error("rate limited")]
    RateLimited,

    #[error("server error: {0}")]
    Server(String),
}

impl ProviderError {
    /// Whether a retry can reasonably be expected to succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderError::Request(_) | ProviderError::RateLimited | ProviderError::Server(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Automatic retries on transient failure, per request
pub const MAX_RETRIES: u32 = 2;

/// Completion request parameters
#[derive(Debug, Clone)]
pub struct CompletionParams {
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Force the model to emit a single JSON object
    pub json_output: bool,
}

impl Default for CompletionParams {
    fn default() -> Self {
        Self {
            model: String::new(),
            prompt: String::new(),
            max_tokens: 4096,
            temperature: 0.7,
            json_output: false,
        }
    }
}

/// A single model completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub content: String,
    #[serde(default)]
    pub finish_reason: String,
    #[serde(default)]
    pub usage: Usage,
}

impl Completion {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            finish_reason: "stop".to_string(),
            usage: Usage::default(),
        }
    }
}

/// Token consumption
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Structured completion provider
#[async_trait]
pub trait Provider: Send + Sync {
    async fn complete(&self, params: CompletionParams) -> Result<Completion>;
    fn default_model(&self) -> String;
    fn is_configured(&self) -> bool;
}
