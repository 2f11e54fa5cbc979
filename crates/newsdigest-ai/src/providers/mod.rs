//! Inference provider implementations

pub mod local;

use std::sync::Arc;

use crate::bridge::InferenceProvider;
use crate::cache::ResponseCache;
use crate::config::AiConfig;
use crate::error::ConfigError;
use crate::gateway::Gateway;

/// Factory function to create inference providers
pub fn create_provider(
    config: &AiConfig,
    cache: Arc<ResponseCache>,
) -> Result<Arc<dyn InferenceProvider>, ConfigError> {
    match config.provider.as_str() {
        "huggingface" => Ok(Arc::new(Gateway::new(config, cache)?)),
        "local" => Ok(Arc::new(local::LocalProvider::new())),
        other => Err(ConfigError::UnknownProvider(other.to_string())),
    }
}
