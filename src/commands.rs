//! CLI command implementations

use anyhow::Context;
use newsdigest_ai::config::PROVIDER_VAR;
use newsdigest_ai::providers::create_provider;
use newsdigest_ai::{AiConfig, Enricher, ResponseCache};
use newsdigest_core::Article;
use newsdigest_feed::{FeedConfig, NewsClient};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncReadExt;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "newsdigest.toml";

/// Query used by `fetch --everything` when none is given.
const DEFAULT_QUERY: &str = "world";

pub struct Options {
    pub config: Option<PathBuf>,
    pub offline: bool,
}

pub struct FetchRequest {
    pub query: Option<String>,
    pub limit: u32,
    pub everything: bool,
    pub enrich: bool,
    pub concurrency: usize,
}

pub fn resolve_config_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(|| {
        let default = PathBuf::from(DEFAULT_CONFIG_FILE);
        default.exists().then_some(default)
    })
}

/// Environment lookup, with `--offline` forcing the local provider.
fn env_lookup(offline: bool) -> impl Fn(&str) -> Option<String> {
    move |name| {
        if offline && name == PROVIDER_VAR {
            return Some("local".to_string());
        }
        std::env::var(name).ok()
    }
}

pub fn build_enricher(options: &Options) -> anyhow::Result<Enricher> {
    let config = AiConfig::load(options.config.as_deref(), env_lookup(options.offline))
        .context("failed to load inference configuration")?;

    let cache = Arc::new(ResponseCache::new(config.cache_ttl()));
    let provider = create_provider(&config, cache)?;
    tracing::info!(provider = provider.name(), "inference provider ready");

    Ok(Enricher::new(provider, config.bias_labels))
}

pub async fn enrich(options: &Options, file: Option<PathBuf>) -> anyhow::Result<()> {
    let text = match file {
        Some(path) => read_text(&path)?,
        None => {
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .context("failed to read stdin")?;
            text
        }
    };

    let enricher = build_enricher(options)?;
    let result = enricher.enrich(&text).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

pub async fn fetch(options: &Options, request: FetchRequest) -> anyhow::Result<()> {
    let feed_config = FeedConfig::load(options.config.as_deref(), env_lookup(false))
        .context("failed to load news feed configuration")?;
    let client = NewsClient::new(feed_config)?;

    let articles: Vec<Article> = if request.everything {
        let query = request.query.as_deref().unwrap_or(DEFAULT_QUERY);
        client.everything(query, Some(request.limit)).await?
    } else {
        client
            .top_headlines(request.query.as_deref(), Some(request.limit))
            .await?
    };
    tracing::info!("Fetched {} articles", articles.len());

    if !request.enrich {
        println!("{}", serde_json::to_string_pretty(&articles)?);
        return Ok(());
    }

    let enricher = build_enricher(options)?;
    let outcomes = enricher.enrich_all(&articles, request.concurrency).await;
    let enriched = outcomes.iter().filter(|o| o.is_enriched()).count();
    tracing::info!("Enriched {} of {} articles", enriched, outcomes.len());

    println!("{}", serde_json::to_string_pretty(&outcomes)?);
    Ok(())
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
