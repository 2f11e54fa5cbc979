//! Inference client configuration
//!
//! Values come from an optional TOML file (`[ai]` table) and are then
//! overridden by the environment. The bearer token is only ever read from
//! the environment.

use std::path::Path;
use std::time::Duration;

use newsdigest_core::Task;
use serde::Deserialize;

use crate::backoff::BackoffPolicy;
use crate::error::ConfigError;

pub const TOKEN_VAR: &str = "HF_TOKEN";
pub const ENDPOINT_VAR: &str = "NEWSDIGEST_INFERENCE_URL";
pub const PROVIDER_VAR: &str = "NEWSDIGEST_PROVIDER";
pub const DEFAULT_ENDPOINT: &str = "https://api-inference.huggingface.co/models";

/// Model identifier per inference task.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub summarization: String,
    pub sentiment: String,
    pub zero_shot: String,
}

impl ModelConfig {
    pub fn for_task(&self, task: Task) -> &str {
        match task {
            Task::Summarization => &self.summarization,
            Task::Sentiment => &self.sentiment,
            Task::ZeroShot => &self.zero_shot,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            summarization: "facebook/bart-large-cnn".to_string(),
            sentiment: "distilbert-base-uncased-finetuned-sst-2-english".to_string(),
            zero_shot: "facebook/bart-large-mnli".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub warmup_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay_ms: 1000,
            warmup_delay_secs: 20,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> BackoffPolicy {
        BackoffPolicy::new(self.max_attempts, Duration::from_millis(self.base_delay_ms))
            .with_warmup_delay(Duration::from_secs(self.warmup_delay_secs))
    }
}

/// Settings for the inference client
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// `huggingface` or `local`
    pub provider: String,
    pub endpoint: String,
    pub models: ModelConfig,
    pub request_timeout_ms: u64,
    pub cache_ttl_secs: u64,
    pub retry: RetryConfig,
    /// Candidate labels for bias classification
    pub bias_labels: Vec<String>,
    #[serde(skip)]
    pub api_token: Option<String>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: "huggingface".to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            models: ModelConfig::default(),
            request_timeout_ms: 60_000,
            cache_ttl_secs: 60 * 60 * 24,
            retry: RetryConfig::default(),
            bias_labels: ["left-leaning", "center", "right-leaning", "neutral"]
                .into_iter()
                .map(String::from)
                .collect(),
            api_token: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    ai: AiConfig,
}

impl AiConfig {
    /// Load from an optional TOML file plus an environment lookup.
    pub fn load(
        path: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => Some(std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?),
            None => None,
        };
        Self::from_sources(file.as_deref(), env)
    }

    /// Build from TOML text and an environment lookup.
    ///
    /// Fails when the selected provider needs a token and none is set.
    pub fn from_sources(
        file: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = match file {
            Some(text) => toml::from_str::<ConfigFile>(text)?.ai,
            None => AiConfig::default(),
        };

        if let Some(provider) = env(PROVIDER_VAR).filter(|v| !v.is_empty()) {
            config.provider = provider;
        }
        if let Some(endpoint) = env(ENDPOINT_VAR).filter(|v| !v.is_empty()) {
            config.endpoint = endpoint;
        }
        config.api_token = env(TOKEN_VAR).filter(|v| !v.trim().is_empty());

        if config.requires_token() && config.api_token.is_none() {
            return Err(ConfigError::MissingCredential(TOKEN_VAR));
        }
        Ok(config)
    }

    pub fn requires_token(&self) -> bool {
        self.provider != "local"
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
