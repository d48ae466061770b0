//! DeepSeek provider
//!
//! OpenAI-compatible chat-completions access with bounded retry.

use crate::*;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_API_BASE: &str = "https://api.deepseek.com/v1";
const DEFAULT_MODEL: &str = "deepseek-chat";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// DeepSeek completion provider
pub struct DeepSeekProvider {
    client: Client,
    api_key: String,
    api_base: String,
    default_model: String,
}

impl DeepSeekProvider {
    pub fn new(
        api_key: impl Into<String>,
        api_base: Option<String>,
        default_model: Option<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            default_model: default_model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    fn build_request(&self, params: &CompletionParams) -> serde_json::Value {
        let mut body = json!({
            "model": params.model,
            "messages": [{ "role": "user", "content": params.prompt }],
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
        });

        if params.json_output {
            body["response_format"] = json!({ "type": "json_object" });
        }

        body
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<Completion> {
        let choice = json["choices"]
            .get(0)
            .ok_or(ProviderError::InvalidResponse)?;
        let content = choice["message"]["content"]
            .as_str()
            .ok_or(ProviderError::InvalidResponse)?
            .to_string();
        let finish_reason = choice["finish_reason"]
            .as_str()
            .unwrap_or("stop")
            .to_string();

        let usage = if let Some(usage) = json["usage"].as_object() {
            Usage {
                prompt_tokens: usage["prompt_tokens"].as_u64().unwrap_or(0) as u32,
                completion_tokens: usage["completion_tokens"].as_u64().unwrap_or(0) as u32,
                total_tokens: usage["total_tokens"].as_u64().unwrap_or(0) as u32,
            }
        } else {
            Usage::default()
        };

        Ok(Completion {
            content,
            finish_reason,
            usage,
        })
    }

    async fn dispatch(&self, url: &str, body: &serde_json::Value) -> Result<Completion> {
        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .timeout(REQUEST_TIMEOUT)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let json: serde_json::Value = response.json().await?;

        if !status.is_success() {
            let message = json["error"]["message"]
                .as_str()
                .unwrap_or("unknown error")
                .to_string();
            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }
            if status.is_server_error() {
                return Err(ProviderError::Server(format!("{}: {}", status, message)));
            }
            return Err(ProviderError::Api(message));
        }

        self.parse_response(json)
    }
}

#[async_trait::async_trait]
impl Provider for DeepSeekProvider {
    async fn complete(&self, params: CompletionParams) -> Result<Completion> {
        if self.api_key.is_empty() {
            return Err(ProviderError::NoApiKey);
        }

        debug!("completion request to {} (model {})", self.api_base, params.model);

        let url = format!("{}/chat/completions", self.api_base);
        let body = self.build_request(&params);

        let mut attempt: u32 = 0;
        loop {
            match self.dispatch(&url, &body).await {
                Ok(completion) => return Ok(completion),
                Err(err) if attempt < MAX_RETRIES && err.is_transient() => {
                    attempt += 1;
                    warn!(
                        "transient completion failure (attempt {}/{}): {}",
                        attempt, MAX_RETRIES, err
                    );
                    tokio::time::sleep(RETRY_DELAY * attempt).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn default_model(&self) -> String {
        self.default_model.clone()
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}
