//! Integration tests for Newsdigest
//!
//! These tests verify that the feed client, the inference client and the
//! CLI work together correctly.

use std::collections::HashMap;
use std::sync::Arc;

use newsdigest_ai::clock::RecordingSleeper;
use newsdigest_ai::{AiConfig, Enricher, Gateway, ResponseCache};
use newsdigest_core::{OutcomeStatus, Sentiment};
use newsdigest_feed::{FeedConfig, NewsClient};
use serde_json::{Value, json};
use tokio::process::Command;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BIN: &str = env!("CARGO_BIN_EXE_newsdigest");

const TRANSIT_CONTENT: &str = "The city council approved a new transit budget on Tuesday after a long \
    debate over fares, routes and the future of the downtown bus network.";

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

/// Mount a feed with one enrichable article and one without usable text.
async fn mount_feed(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/top-headlines"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "totalResults": 2,
            "articles": [
                {
                    "source": {"name": "Daily Example"},
                    "title": "Council approves transit budget",
                    "description": "Budget passes.",
                    "content": TRANSIT_CONTENT,
                    "url": "https://news.example/transit",
                    "publishedAt": "2025-10-08T12:30:00Z"
                },
                {
                    "source": {"name": "Wire"},
                    "title": "   ",
                    "description": null,
                    "content": null,
                    "url": "https://news.example/empty"
                }
            ]
        })))
        .mount(server)
        .await;
}

/// Mount all three inference models.
async fn mount_models(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/facebook/bart-large-cnn"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"summary_text": "Council passes transit budget."}])),
        )
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/distilbert-base-uncased-finetuned-sst-2-english"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[
            {"label": "POSITIVE", "score": 0.91},
            {"label": "NEGATIVE", "score": 0.09}
        ]])))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/facebook/bart-large-mnli"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "labels": ["center", "neutral", "left-leaning", "right-leaning"],
            "scores": [0.7, 0.2, 0.05, 0.05]
        })))
        .mount(server)
        .await;
}

/// Fetch from the feed and enrich every article through the hosted gateway
#[tokio::test]
async fn test_fetch_then_enrich_all() {
    let server = MockServer::start().await;
    mount_feed(&server).await;
    mount_models(&server).await;
    let uri = server.uri();

    let feed_config = FeedConfig::from_sources(
        None,
        env_of(&[("NEWSAPI_KEY", "k"), ("NEWSDIGEST_NEWSAPI_URL", uri.as_str())]),
    )
    .unwrap();
    let articles = NewsClient::new(feed_config)
        .unwrap()
        .top_headlines(None, Some(2))
        .await
        .unwrap();
    assert_eq!(articles.len(), 2);

    let ai_config = AiConfig::from_sources(
        None,
        env_of(&[("HF_TOKEN", "t"), ("NEWSDIGEST_INFERENCE_URL", uri.as_str())]),
    )
    .unwrap();
    let gateway = Gateway::new(&ai_config, Arc::new(ResponseCache::new(ai_config.cache_ttl())))
        .unwrap()
        .with_sleeper(Arc::new(RecordingSleeper::new()));
    let enricher = Enricher::new(Arc::new(gateway), ai_config.bias_labels.clone());

    let outcomes = enricher.enrich_all(&articles, 4).await;
    assert_eq!(outcomes.len(), 2);
    match &outcomes[0].status {
        OutcomeStatus::Enriched(result) => {
            assert_eq!(result.summary, "Council passes transit budget.");
            assert_eq!(result.sentiment, Sentiment::Positive);
            assert_eq!(result.bias, "center");
        }
        other => panic!("expected enriched article, got {other:?}"),
    }
    assert!(matches!(outcomes[1].status, OutcomeStatus::Skipped { .. }));

    // A second pass is served entirely from cache.
    let before = server.received_requests().await.unwrap().len();
    enricher.enrich_all(&articles[..1], 1).await;
    assert_eq!(server.received_requests().await.unwrap().len(), before);
}

/// Test that the CLI can be invoked
#[tokio::test]
async fn test_cli_invocation() {
    let output = Command::new(BIN).arg("--help").output().await.unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("News fetching and AI enrichment"));

    let output = Command::new(BIN).arg("version").output().await.unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

/// Offline enrichment needs no credentials
#[tokio::test]
async fn test_cli_offline_enrich() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("article.txt");
    std::fs::write(&file, TRANSIT_CONTENT).unwrap();

    let output = Command::new(BIN)
        .current_dir(dir.path())
        .env_remove("HF_TOKEN")
        .args(["--offline", "enrich", "--file"])
        .arg(&file)
        .output()
        .await
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let result: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(result["summary"].as_str().unwrap().starts_with("The city council"));
    assert!(["POSITIVE", "NEGATIVE", "NEUTRAL"].contains(&result["sentiment"].as_str().unwrap()));
    assert!(result["bias"].is_string());
}

/// Missing inference token is fatal at startup
#[tokio::test]
async fn test_cli_requires_token() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("article.txt");
    std::fs::write(&file, TRANSIT_CONTENT).unwrap();

    let output = Command::new(BIN)
        .current_dir(dir.path())
        .env_remove("HF_TOKEN")
        .env_remove("NEWSDIGEST_PROVIDER")
        .args(["enrich", "--file"])
        .arg(&file)
        .output()
        .await
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("HF_TOKEN"));
}

/// Fetch and enrich end to end through the binary
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cli_fetch_and_enrich() {
    let server = MockServer::start().await;
    mount_feed(&server).await;
    mount_models(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(BIN)
        .current_dir(dir.path())
        .env("HF_TOKEN", "t")
        .env("NEWSAPI_KEY", "k")
        .env("NEWSDIGEST_INFERENCE_URL", server.uri())
        .env("NEWSDIGEST_NEWSAPI_URL", server.uri())
        .env_remove("NEWSDIGEST_PROVIDER")
        .args(["fetch", "--limit", "2", "--enrich"])
        .output()
        .await
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let outcomes: Value = serde_json::from_slice(&output.stdout).unwrap();
    let outcomes = outcomes.as_array().unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0]["status"], "enriched");
    assert_eq!(outcomes[0]["summary"], "Council passes transit budget.");
    assert_eq!(outcomes[0]["sentiment"], "POSITIVE");
    assert_eq!(outcomes[0]["bias"], "center");
    assert_eq!(outcomes[1]["status"], "skipped");
}
