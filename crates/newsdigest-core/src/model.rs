//! Core data structures for articles and AI enrichment

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inference task a request is issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Task {
    Summarization,
    Sentiment,
    ZeroShot,
}

impl Task {
    pub fn as_str(&self) -> &'static str {
        match self {
            Task::Summarization => "summarization",
            Task::Sentiment => "sentiment",
            Task::ZeroShot => "zero-shot",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider options for a request.
///
/// Keys are kept sorted so two parameter sets built in a different order
/// serialize to the same bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(BTreeMap<String, Value>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Canonical JSON form, stable across insertion order.
    pub fn canonical_json(&self) -> String {
        // A BTreeMap of JSON values always serializes.
        serde_json::to_string(&self.0).unwrap_or_default()
    }
}

/// A single call to the inference provider. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceRequest {
    task: Task,
    inputs: String,
    #[serde(default, skip_serializing_if = "Parameters::is_empty")]
    parameters: Parameters,
}

impl InferenceRequest {
    pub fn new(task: Task, inputs: impl Into<String>) -> Self {
        Self {
            task,
            inputs: inputs.into(),
            parameters: Parameters::new(),
        }
    }

    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn task(&self) -> Task {
        self.task
    }

    pub fn inputs(&self) -> &str {
        &self.inputs
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }
}

/// Normalized sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "POSITIVE",
            Sentiment::Negative => "NEGATIVE",
            Sentiment::Neutral => "NEUTRAL",
        }
    }

    /// Map a raw provider label onto the three-value set.
    ///
    /// Matching is a case-insensitive substring test, so `LABEL_POS`,
    /// `positive` and `POSITIVE` all land on [`Sentiment::Positive`].
    pub fn from_label(label: &str) -> Self {
        let upper = label.to_uppercase();
        if upper.contains("NEG") {
            Sentiment::Negative
        } else if upper.contains("POS") {
            Sentiment::Positive
        } else {
            Sentiment::Neutral
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three AI-derived fields for one piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentResult {
    pub summary: String,
    pub sentiment: Sentiment,
    pub bias: String,
}

/// A news article as ingested from the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: u64,
    pub title: String,
    pub url: String,
    pub source: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub raw_text: Option<String>,
}

impl Article {
    /// Text to enrich, if the article carries any non-blank text.
    pub fn text(&self) -> Option<&str> {
        self.raw_text
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }
}

/// What happened to one article during batch enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Enriched(EnrichmentResult),
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleOutcome {
    pub article_id: u64,
    pub url: String,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

impl ArticleOutcome {
    pub fn is_enriched(&self) -> bool {
        matches!(self.status, OutcomeStatus::Enriched(_))
    }
}
