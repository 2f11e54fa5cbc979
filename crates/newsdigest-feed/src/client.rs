//! NewsAPI-compatible HTTP client

use chrono::{DateTime, Utc};
use newsdigest_core::Article;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::config::FeedConfig;
use crate::error::FeedError;

const BODY_PREVIEW_CHARS: usize = 500;
/// Placeholder NewsAPI serves in place of withdrawn articles.
const REMOVED_MARKER: &str = "[Removed]";

#[derive(Debug, Deserialize)]
struct FeedResponse {
    status: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    #[serde(default)]
    source: Option<RawSource>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    #[serde(default)]
    name: Option<String>,
}

pub struct NewsClient {
    client: reqwest::Client,
    config: FeedConfig,
}

impl NewsClient {
    pub fn new(config: FeedConfig) -> Result<Self, FeedError> {
        if config.api_key.is_none() {
            return Err(FeedError::MissingCredential(crate::config::API_KEY_VAR));
        }
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { client, config })
    }

    /// Current top headlines for the configured country, optionally filtered by `query`.
    pub async fn top_headlines(
        &self,
        query: Option<&str>,
        page_size: Option<u32>,
    ) -> Result<Vec<Article>, FeedError> {
        let page_size = page_size.unwrap_or(self.config.page_size).to_string();
        let mut params = vec![
            ("country", self.config.country.clone()),
            ("pageSize", page_size),
        ];
        if let Some(q) = query {
            params.push(("q", q.to_string()));
        }
        self.fetch("top-headlines", &params).await
    }

    /// Articles matching `query` across all sources, most relevant first.
    pub async fn everything(
        &self,
        query: &str,
        page_size: Option<u32>,
    ) -> Result<Vec<Article>, FeedError> {
        let page_size = page_size.unwrap_or(self.config.page_size).to_string();
        let params = vec![
            ("q", query.to_string()),
            ("pageSize", page_size),
            ("language", self.config.language.clone()),
            ("sortBy", "relevancy".to_string()),
        ];
        self.fetch("everything", &params).await
    }

    async fn fetch(&self, route: &str, params: &[(&str, String)]) -> Result<Vec<Article>, FeedError> {
        let url = format!("{}/{}", self.config.endpoint.trim_end_matches('/'), route);
        let api_key = self.config.api_key.as_deref().unwrap_or_default();

        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("apiKey", api_key)])
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(route, status = status.as_u16(), bytes = body.len(), "news feed response");

        let parsed: Option<FeedResponse> = serde_json::from_str(&body).ok();
        match parsed {
            Some(feed) if status.is_success() && feed.status == "ok" => {
                let articles: Vec<Article> = feed.articles.into_iter().filter_map(into_article).collect();
                tracing::info!(route, count = articles.len(), "fetched articles");
                Ok(articles)
            }
            Some(feed) if feed.status == "error" => Err(FeedError::Api {
                code: feed.code.unwrap_or_else(|| "unknown".to_string()),
                message: feed.message.unwrap_or_else(|| "Unknown error".to_string()),
            }),
            _ => Err(FeedError::Status {
                status: status.as_u16(),
                body_preview: body.chars().take(BODY_PREVIEW_CHARS).collect(),
            }),
        }
    }
}

/// Stable identifier for an article URL: the first 8 bytes of its SHA-256, big-endian.
pub fn article_id(url: &str) -> u64 {
    let digest = Sha256::digest(url.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

fn into_article(raw: RawArticle) -> Option<Article> {
    let url = raw.url.filter(|u| !u.is_empty())?;
    let title = raw.title.unwrap_or_default();
    if title == REMOVED_MARKER {
        return None;
    }

    let raw_text = raw
        .content
        .as_deref()
        .map(strip_truncation_marker)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .or(raw.description.filter(|d| !d.trim().is_empty()))
        .or_else(|| (!title.trim().is_empty()).then(|| title.clone()));

    Some(Article {
        id: article_id(&url),
        title,
        url,
        source: raw.source.and_then(|s| s.name),
        published_at: raw.published_at,
        raw_text,
    })
}

/// Drop the `… [+1234 chars]` suffix the feed appends to clipped content.
fn strip_truncation_marker(content: &str) -> &str {
    let content = content.trim();
    if content.ends_with("chars]") {
        if let Some(idx) = content.rfind("[+") {
            return content[..idx].trim_end();
        }
    }
    content
}
