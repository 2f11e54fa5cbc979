//! Feed client configuration (`[feed]` table plus environment)

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::FeedError;

pub const API_KEY_VAR: &str = "NEWSAPI_KEY";
pub const ENDPOINT_VAR: &str = "NEWSDIGEST_NEWSAPI_URL";
pub const DEFAULT_ENDPOINT: &str = "https://newsapi.org/v2";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub endpoint: String,
    pub country: String,
    pub language: String,
    pub page_size: u32,
    pub request_timeout_ms: u64,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            country: "us".to_string(),
            language: "en".to_string(),
            page_size: 10,
            request_timeout_ms: 10_000,
            api_key: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    feed: FeedConfig,
}

impl FeedConfig {
    pub fn load(
        path: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, FeedError> {
        let file = match path {
            Some(path) => Some(std::fs::read_to_string(path).map_err(|source| FeedError::Read {
                path: path.to_path_buf(),
                source,
            })?),
            None => None,
        };
        Self::from_sources(file.as_deref(), env)
    }

    /// Build from TOML text and an environment lookup; the API key is required.
    pub fn from_sources(
        file: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, FeedError> {
        let mut config = match file {
            Some(text) => toml::from_str::<ConfigFile>(text)?.feed,
            None => FeedConfig::default(),
        };
        if let Some(endpoint) = env(ENDPOINT_VAR).filter(|v| !v.is_empty()) {
            config.endpoint = endpoint;
        }
        config.api_key = Some(
            env(API_KEY_VAR)
                .filter(|v| !v.trim().is_empty())
                .ok_or(FeedError::MissingCredential(API_KEY_VAR))?,
        );
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
