//! Classified errors for the inference client

use std::path::PathBuf;

use newsdigest_core::Task;
use thiserror::Error;

/// Longest body excerpt carried in errors and log events.
pub const BODY_PREVIEW_CHARS: usize = 2000;

/// Outcome of a failed provider call.
///
/// `Transient` and `ModelLoading` describe a single attempt and are retried
/// by the gateway; the remaining variants are terminal for the call.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("transient provider failure: {reason}")]
    Transient { status: Option<u16>, reason: String },

    #[error("model `{model}` is still loading")]
    ModelLoading { model: String },

    #[error("model `{model}` still failing after {attempts} attempts: {reason}")]
    ExhaustedRetries {
        model: String,
        attempts: u32,
        reason: String,
    },

    #[error("model `{model}` not found or misconfigured (404 after {attempts} attempts)")]
    NotFound { model: String, attempts: u32 },

    #[error("provider rejected request for model `{model}` with status {status}")]
    Fatal {
        model: String,
        status: u16,
        body_preview: String,
    },

    #[error("unexpected {task} response: {preview}")]
    UnexpectedResponse { task: Task, preview: String },
}

impl InferenceError {
    /// Whether another attempt may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            InferenceError::Transient { .. } | InferenceError::ModelLoading { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, InferenceError::NotFound { .. })
    }
}

/// Errors raised while assembling the inference client.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not found in environment (.env)")]
    MissingCredential(&'static str),

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown inference provider: {0}")]
    UnknownProvider(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Bounded excerpt of `text`, at most `max_chars` characters.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
