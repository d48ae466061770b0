//! Web document retrieval
//!
//! A query in, a bounded list of documents with raw page content out.
//! Implementations handle their own bounded retries on transient failures.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod tavily;

pub use tavily::TavilyProvider;

/// Retrieval errors
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("response decode failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("api error: {0}")]
    Api(String),

    #[error("no api key configured")]
    NoApiKey,

    #[error("rate limited")]
    RateLimited,

    #[error("server error: {0}")]
    Server(String),
}

impl SearchError {
    /// Whether a retry can reasonably be expected to succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SearchError::Request(_) | SearchError::RateLimited | SearchError::Server(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;

/// Automatic retries on transient failure, per request
pub const MAX_RETRIES: u32 = 2;

/// One retrieved document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub url: String,
    #[serde(default)]
    pub title: String,
    pub raw_content: String,
}

impl Document {
    pub fn new(url: impl Into<String>, title: impl Into<String>, raw_content: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            raw_content: raw_content.into(),
        }
    }
}

/// Document retrieval provider
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run one search, returning at most `max_results` documents
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<Document>>;
    fn is_configured(&self) -> bool;
}
