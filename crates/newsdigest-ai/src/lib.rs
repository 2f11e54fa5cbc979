//! Resilient inference client for Newsdigest
//!
//! This crate turns article text into a summary, a sentiment label and a
//! political-bias label by calling a hosted inference API, with response
//! caching, retry with backoff, chunked summarization of long text and
//! per-field fallbacks.

pub mod backoff;
pub mod bridge;
pub mod cache;
pub mod clock;
pub mod config;
pub mod enrich;
pub mod error;
pub mod gateway;
pub mod providers;
pub mod segmenter;


pub use backoff::{BackoffPolicy, RetryDecision, RetryState};
pub use bridge::InferenceProvider;
pub use cache::{CacheKey, CacheStats, ResponseCache};
pub use config::AiConfig;
pub use enrich::{Enricher, NEUTRAL_BIAS, TOO_SHORT_SUMMARY};
pub use error::{ConfigError, InferenceError};
pub use gateway::Gateway;
