//! Configuration management for Scout
//!
//! Handles loading and saving research parameters and provider credentials.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod paths;

pub use paths::{config_path, data_dir, ensure_dir};

/// Errors in configuration systems
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config not found: {0}")]
    NotFound(PathBuf),

    #[error("missing credential: {0} is not set")]
    MissingCredential(&'static str),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Environment variable holding the model-provider API key
pub const MODEL_API_KEY_VAR: &str = "DEEPSEEK_API_KEY";

/// Environment variable holding the search-provider API key
pub const SEARCH_API_KEY_VAR: &str = "TAVILY_API_KEY";

/// Credentials and endpoint for one external provider
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

/// All external providers
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub deepseek: ProviderConfig,
    #[serde(default)]
    pub tavily: ProviderConfig,
}

/// Default research parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchDefaults {
    #[serde(default = "default_query_generator_model")]
    pub query_generator_model: String,
    #[serde(default = "default_summarize_model")]
    pub summarize_model: String,
    #[serde(default = "default_reflection_model")]
    pub reflection_model: String,
    #[serde(default = "default_answer_model")]
    pub answer_model: String,
    #[serde(default = "default_initial_search_query_count")]
    pub initial_search_query_count: u32,
    #[serde(default = "default_max_research_loops")]
    pub max_research_loops: u32,
    #[serde(default = "default_max_search_results")]
    pub max_search_results: u32,
}

impl Default for ResearchDefaults {
    fn default() -> Self {
        Self {
            query_generator_model: default_query_generator_model(),
            summarize_model: default_summarize_model(),
            reflection_model: default_reflection_model(),
            answer_model: default_answer_model(),
            initial_search_query_count: default_initial_search_query_count(),
            max_research_loops: default_max_research_loops(),
            max_search_results: default_max_search_results(),
        }
    }
}

fn default_query_generator_model() -> String {
    "deepseek-chat".to_string()
}

fn default_summarize_model() -> String {
    "deepseek-chat".to_string()
}

fn default_reflection_model() -> String {
    "deepseek-chat".to_string()
}

fn default_answer_model() -> String {
    "deepseek-reasoner".to_string()
}

fn default_initial_search_query_count() -> u32 {
    3
}

fn default_max_research_loops() -> u32 {
    2
}

fn default_max_search_results() -> u32 {
    3
}

/// Research configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResearchConfig {
    #[serde(default)]
    pub defaults: ResearchDefaults,
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub research: ResearchConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl Config {
    /// Load configuration from the default location
    pub async fn load() -> Result<Self> {
        let path = config_path();
        Self::load_from(&path).await
    }

    /// Load from specific location
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("no config found at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        debug!("loading config from {:?}", path);
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub async fn save(&self) -> Result<()> {
        let path = config_path();
        self.save_to(&path).await
    }

    /// Save to specific location
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        debug!("writing config to {:?}", path);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Model-provider API key: environment first, config file as fallback
    pub fn model_api_key(&self) -> Option<String> {
        if let Ok(key) = std::env::var(MODEL_API_KEY_VAR) {
            if !key.is_empty() {
                return Some(key);
            }
        }

        let key = self.providers.deepseek.api_key.clone();
        if !key.is_empty() {
            return Some(key);
        }

        None
    }

    /// Search-provider API key: environment first, config file as fallback
    pub fn search_api_key(&self) -> Option<String> {
        if let Ok(key) = std::env::var(SEARCH_API_KEY_VAR) {
            if !key.is_empty() {
                return Some(key);
            }
        }

        let key = self.providers.tavily.api_key.clone();
        if !key.is_empty() {
            return Some(key);
        }

        None
    }

    /// Resolve both credentials or fail; missing keys are fatal at startup
    pub fn require_credentials(&self) -> Result<(String, String)> {
        let model_key = self
            .model_api_key()
            .ok_or(ConfigError::MissingCredential(MODEL_API_KEY_VAR))?;
        let search_key = self
            .search_api_key()
            .ok_or(ConfigError::MissingCredential(SEARCH_API_KEY_VAR))?;
        Ok((model_key, search_key))
    }

    /// Override endpoint for the model provider, if configured
    pub fn model_api_base(&self) -> Option<String> {
        self.providers.deepseek.api_base.clone()
    }

    /// Override endpoint for the search provider, if configured
    pub fn search_api_base(&self) -> Option<String> {
        self.providers.tavily.api_base.clone()
    }

    /// Verify both credentials are resolvable
    pub fn has_credentials(&self) -> bool {
        self.model_api_key().is_some() && self.search_api_key().is_some()
    }

    pub fn query_generator_model(&self) -> String {
        self.research.defaults.query_generator_model.clone()
    }

    pub fn summarize_model(&self) -> String {
        self.research.defaults.summarize_model.clone()
    }

    pub fn reflection_model(&self) -> String {
        self.research.defaults.reflection_model.clone()
    }

    pub fn answer_model(&self) -> String {
        self.research.defaults.answer_model.clone()
    }

    pub fn initial_search_query_count(&self) -> u32 {
        self.research.defaults.initial_search_query_count
    }

    pub fn max_research_loops(&self) -> u32 {
        self.research.defaults.max_research_loops
    }

    pub fn max_search_results(&self) -> u32 {
        self.research.defaults.max_search_results
    }
}

/// Initialize the config file and data directory
pub async fn init() -> Result<Config> {
    let config_path = config_path();

    if config_path.exists() {
        warn!("config already exists at {:?}", config_path);
    } else {
        let config = Config::default();
        config.save().await?;
        info!("config created at {:?}", config_path);
    }

    let data = data_dir();
    tokio::fs::create_dir_all(&data).await?;

    Config::load().await
}
