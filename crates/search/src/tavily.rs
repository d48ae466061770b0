//! Tavily search provider

use crate::*;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_API_BASE: &str = "https://api.tavily.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Tavily retrieval provider
pub struct TavilyProvider {
    client: Client,
    api_key: String,
    api_base: String,
}

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    topic: &'a str,
    max_results: u32,
    include_raw_content: bool,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    raw_content: Option<String>,
}

impl TavilyProvider {
    pub fn new(api_key: impl Into<String>, api_base: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        }
    }

    fn parse_response(&self, response: TavilyResponse, max_results: u32) -> Vec<Document> {
        response
            .results
            .into_iter()
            .take(max_results as usize)
            .map(|r| {
                // Fall back to the snippet when no raw page content came back
                let raw_content = match r.raw_content {
                    Some(raw) if !raw.is_empty() => raw,
                    _ => r.content,
                };
                Document {
                    url: r.url,
                    title: r.title,
                    raw_content,
                }
            })
            .collect()
    }

    async fn dispatch(&self, query: &str, max_results: u32) -> Result<Vec<Document>> {
        let body = TavilyRequest {
            query,
            topic: "general",
            max_results,
            include_raw_content: true,
        };

        let response = self
            .client
            .post(format!("{}/search", self.api_base))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            if status.as_u16() == 429 {
                return Err(SearchError::RateLimited);
            }
            if status.is_server_error() {
                return Err(SearchError::Server(format!("{}: {}", status, message)));
            }
            return Err(SearchError::Api(format!("{}: {}", status, message)));
        }

        let parsed: TavilyResponse = response.json().await?;
        Ok(self.parse_response(parsed, max_results))
    }
}

#[async_trait::async_trait]
impl SearchProvider for TavilyProvider {
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<Document>> {
        if self.api_key.is_empty() {
            return Err(SearchError::NoApiKey);
        }

        debug!("web search: {}", query);

        let mut attempt: u32 = 0;
        loop {
            match self.dispatch(query, max_results).await {
                Ok(documents) => {
                    debug!("{} documents for: {}", documents.len(), query);
                    return Ok(documents);
                }
                Err(err) if attempt < MAX_RETRIES && err.is_transient() => {
                    attempt += 1;
                    warn!(
                        "transient search failure (attempt {}/{}): {}",
                        attempt, MAX_RETRIES, err
                    );
                    tokio::time::sleep(RETRY_DELAY * attempt).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}
