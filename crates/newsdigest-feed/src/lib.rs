//! News feed client for Newsdigest
//!
//! Fetches articles from a NewsAPI-compatible service and maps them onto
//! [`newsdigest_core::Article`].

pub mod client;
pub mod config;
pub mod error;


pub use client::NewsClient;
pub use config::FeedConfig;
pub use error::FeedError;
