//! Feed client errors

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("{0} not set in environment")]
    MissingCredential(&'static str),

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("news feed request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("news feed returned status {status}: {body_preview}")]
    Status { status: u16, body_preview: String },

    #[error("news feed error {code}: {message}")]
    Api { code: String, message: String },
}
