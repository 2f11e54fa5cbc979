//! Best-effort article enrichment
//!
//! Each field is resolved on its own and degrades to a fixed fallback, so a
//! provider failure on one field (or one article) never costs the others.

use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use newsdigest_core::{
    Article, ArticleOutcome, EnrichmentResult, InferenceRequest, OutcomeStatus, Parameters,
    Sentiment, Task,
};
use serde_json::Value;

use crate::bridge::InferenceProvider;
use crate::error::{InferenceError, preview};
use crate::segmenter::{self, SINGLE_PASS_CHARS};

/// Returned by [`Enricher::summarize`] for input too short to summarize.
pub const TOO_SHORT_SUMMARY: &str = "Text too short to summarize.";
/// Inputs with fewer characters than this are not sent for summarization.
pub const MIN_SUMMARY_CHARS: usize = 50;
/// Bias label used whenever classification is impossible.
pub const NEUTRAL_BIAS: &str = "neutral";

const FALLBACK_REASON_CHARS: usize = 200;

pub struct Enricher {
    provider: Arc<dyn InferenceProvider>,
    bias_labels: Vec<String>,
}

impl Enricher {
    pub fn new(provider: Arc<dyn InferenceProvider>, bias_labels: Vec<String>) -> Self {
        Self {
            provider,
            bias_labels,
        }
    }

    pub fn provider(&self) -> &Arc<dyn InferenceProvider> {
        &self.provider
    }

    pub fn bias_labels(&self) -> &[String] {
        &self.bias_labels
    }

    /// Summary of `text`, or a readable fallback. Never fails.
    pub async fn summarize(&self, text: &str) -> String {
        let text = text.trim();
        if text.chars().count() < MIN_SUMMARY_CHARS {
            return TOO_SHORT_SUMMARY.to_string();
        }
        match segmenter::summarize_text(self.provider.as_ref(), text).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!(provider = self.provider.name(), error = %e, "summary unavailable, using fallback");
                summary_fallback(&e)
            }
        }
    }

    /// Sentiment of `text`; [`Sentiment::Neutral`] when unknown. Never fails.
    pub async fn sentiment(&self, text: &str) -> Sentiment {
        let text = text.trim();
        if text.is_empty() {
            return Sentiment::Neutral;
        }
        let request =
            InferenceRequest::new(Task::Sentiment, segmenter::trim(text, SINGLE_PASS_CHARS));
        match self.provider.infer(&request).await {
            Ok(value) => match top_sentiment_label(&value) {
                Some(label) => Sentiment::from_label(&label),
                None => {
                    tracing::warn!(response = %preview(&value.to_string(), 200), "unrecognized sentiment response");
                    Sentiment::Neutral
                }
            },
            Err(e) => {
                tracing::warn!(provider = self.provider.name(), error = %e, "sentiment unavailable, using neutral");
                Sentiment::Neutral
            }
        }
    }

    /// Bias label from the configured set; [`NEUTRAL_BIAS`] when unknown. Never fails.
    pub async fn bias(&self, text: &str) -> String {
        let text = text.trim();
        if text.is_empty() || self.bias_labels.is_empty() {
            return NEUTRAL_BIAS.to_string();
        }
        let parameters = Parameters::new().with("candidate_labels", self.bias_labels.clone());
        let request = InferenceRequest::new(Task::ZeroShot, segmenter::trim(text, SINGLE_PASS_CHARS))
            .with_parameters(parameters);

        match self.provider.infer(&request).await {
            Ok(value) => top_zero_shot_label(&value)
                .and_then(|label| self.known_label(&label))
                .unwrap_or_else(|| {
                    tracing::warn!(response = %preview(&value.to_string(), 200), "unrecognized bias response");
                    NEUTRAL_BIAS.to_string()
                }),
            Err(e) => {
                tracing::warn!(provider = self.provider.name(), error = %e, "bias unavailable, using neutral");
                NEUTRAL_BIAS.to_string()
            }
        }
    }

    /// All three fields for `text`, resolved concurrently.
    pub async fn enrich(&self, text: &str) -> EnrichmentResult {
        let (summary, sentiment, bias) =
            tokio::join!(self.summarize(text), self.sentiment(text), self.bias(text));
        EnrichmentResult {
            summary,
            sentiment,
            bias,
        }
    }

    /// Enrich a batch with at most `concurrency` articles in flight.
    ///
    /// Outcomes come back in input order. Articles without text are skipped,
    /// never aborting the batch.
    pub async fn enrich_all(&self, articles: &[Article], concurrency: usize) -> Vec<ArticleOutcome> {
        stream::iter(articles)
            .map(|article| async move {
                let status = match article.text() {
                    Some(text) => {
                        let result = self.enrich(text).await;
                        tracing::info!(article = article.id, sentiment = %result.sentiment, bias = %result.bias, "article enriched");
                        OutcomeStatus::Enriched(result)
                    }
                    None => {
                        tracing::warn!(article = article.id, url = %article.url, "no text to analyze, skipping");
                        OutcomeStatus::Skipped {
                            reason: "no text to analyze".to_string(),
                        }
                    }
                };
                ArticleOutcome {
                    article_id: article.id,
                    url: article.url.clone(),
                    status,
                }
            })
            .buffered(concurrency.max(1))
            .collect()
            .await
    }

    fn known_label(&self, label: &str) -> Option<String> {
        self.bias_labels
            .iter()
            .find(|candidate| candidate.eq_ignore_ascii_case(label.trim()))
            .cloned()
    }
}

fn summary_fallback(error: &InferenceError) -> String {
    format!(
        "Summary unavailable: {}",
        preview(&error.to_string(), FALLBACK_REASON_CHARS)
    )
}

/// Highest-scoring label from a sentiment payload.
///
/// Handles `[{label, score}]`, the nested `[[{label, score}, ..]]` form and a
/// bare `{label}` object. Without scores the first label wins.
fn top_sentiment_label(value: &Value) -> Option<String> {
    let candidates: Vec<&Value> = match value {
        Value::Array(items) => items
            .iter()
            .flat_map(|item| match item {
                Value::Array(inner) => inner.iter().collect::<Vec<_>>(),
                other => vec![other],
            })
            .collect(),
        Value::Object(_) => vec![value],
        _ => return None,
    };

    let mut best: Option<(&str, f64)> = None;
    for candidate in candidates {
        let Some(label) = candidate.get("label").and_then(Value::as_str) else {
            continue;
        };
        let score = candidate
            .get("score")
            .and_then(Value::as_f64)
            .unwrap_or(f64::NEG_INFINITY);
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((label, score));
        }
    }
    best.map(|(label, _)| label.to_string())
}

/// First (highest-ranked) label from a zero-shot payload.
fn top_zero_shot_label(value: &Value) -> Option<String> {
    let object = match value {
        Value::Array(items) => items.first()?,
        other => other,
    };
    object
        .get("labels")?
        .as_array()?
        .first()?
        .as_str()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_top_sentiment_label_shapes() {
        let nested = json!([[{"label": "NEGATIVE", "score": 0.1}, {"label": "POSITIVE", "score": 0.9}]]);
        assert_eq!(top_sentiment_label(&nested).as_deref(), Some("POSITIVE"));

        let flat = json!([{"label": "NEGATIVE", "score": 0.97}]);
        assert_eq!(top_sentiment_label(&flat).as_deref(), Some("NEGATIVE"));

        let object = json!({"label": "neutral"});
        assert_eq!(top_sentiment_label(&object).as_deref(), Some("neutral"));

        assert_eq!(top_sentiment_label(&json!([])), None);
        assert_eq!(top_sentiment_label(&json!("POSITIVE")), None);
        assert_eq!(top_sentiment_label(&json!([{"score": 1.0}])), None);
    }

    #[test]
    fn test_top_zero_shot_label_shapes() {
        let object = json!({"sequence": "s", "labels": ["center", "left-leaning"], "scores": [0.6, 0.4]});
        assert_eq!(top_zero_shot_label(&object).as_deref(), Some("center"));

        let listed = json!([{"labels": ["right-leaning"], "scores": [1.0]}]);
        assert_eq!(top_zero_shot_label(&listed).as_deref(), Some("right-leaning"));

        assert_eq!(top_zero_shot_label(&json!({"labels": []})), None);
        assert_eq!(top_zero_shot_label(&json!({"error": "x"})), None);
    }

    #[test]
    fn test_summary_fallback_is_bounded() {
        let error = InferenceError::ExhaustedRetries {
            model: "m".to_string(),
            attempts: 4,
            reason: "r".repeat(1000),
        };
        let fallback = summary_fallback(&error);
        assert!(fallback.starts_with("Summary unavailable: "));
        assert!(fallback.chars().count() <= "Summary unavailable: ".len() + FALLBACK_REASON_CHARS + 3);
    }

    #[test]
    fn test_summary_fallback_not_found() {
        let error = InferenceError::NotFound {
            model: "facebook/bart-large-cnn".to_string(),
            attempts: 4,
        };
        insta::assert_snapshot!(
            summary_fallback(&error),
            @"Summary unavailable: model `facebook/bart-large-cnn` not found or misconfigured (404 after 4 attempts)"
        );
    }
}
