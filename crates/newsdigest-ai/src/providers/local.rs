//! Local provider for offline enrichment
//!
//! Answers every task with simple text heuristics and the same response
//! shapes the hosted API uses, so the rest of the pipeline cannot tell the
//! difference.

use newsdigest_core::{InferenceRequest, Task};
use serde_json::{Value, json};

use crate::bridge::InferenceProvider;
use crate::error::InferenceError;

const POSITIVE_WORDS: &[&str] = &[
    "gain", "growth", "win", "success", "improve", "record", "hope", "celebrate", "recovery",
    "breakthrough", "agreement", "rise",
];
const NEGATIVE_WORDS: &[&str] = &[
    "loss", "crisis", "war", "death", "fail", "decline", "attack", "fear", "collapse", "scandal",
    "fall", "killed",
];
const LEFT_WORDS: &[&str] = &[
    "progressive", "liberal", "democrat", "union", "climate", "equality", "welfare",
];
const RIGHT_WORDS: &[&str] = &[
    "conservative", "republican", "tax cut", "border", "deregulation", "tradition", "gun rights",
];

pub struct LocalProvider;

impl LocalProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl InferenceProvider for LocalProvider {
    async fn infer(&self, request: &InferenceRequest) -> Result<Value, InferenceError> {
        let text = request.inputs();
        let value = match request.task() {
            Task::Summarization => json!([{ "summary_text": lead_sentences(text, 2) }]),
            Task::Sentiment => {
                let lower = text.to_lowercase();
                let positive = count_hits(&lower, POSITIVE_WORDS);
                let negative = count_hits(&lower, NEGATIVE_WORDS);
                let (label, score) = match positive.cmp(&negative) {
                    std::cmp::Ordering::Greater => ("POSITIVE", ratio(positive, negative)),
                    std::cmp::Ordering::Less => ("NEGATIVE", ratio(negative, positive)),
                    std::cmp::Ordering::Equal => ("NEUTRAL", 0.5),
                };
                json!([[{ "label": label, "score": score }]])
            }
            Task::ZeroShot => {
                let labels: Vec<String> = request
                    .parameters()
                    .get("candidate_labels")
                    .and_then(Value::as_array)
                    .map(|labels| {
                        labels
                            .iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();
                json!({ "sequence": text, "labels": rank_bias_labels(text, labels) })
            }
        };
        Ok(value)
    }

    fn name(&self) -> &str {
        "local (heuristic)"
    }
}

/// First `count` sentences of `text`.
fn lead_sentences(text: &str, count: usize) -> String {
    let mut end = text.len();
    let mut seen = 0;
    for (idx, ch) in text.char_indices() {
        if matches!(ch, '.' | '!' | '?') {
            seen += 1;
            if seen == count {
                end = idx + ch.len_utf8();
                break;
            }
        }
    }
    text[..end].trim().to_string()
}

fn count_hits(lower: &str, words: &[&str]) -> usize {
    words.iter().map(|w| lower.matches(w).count()).sum()
}

fn ratio(winner: usize, loser: usize) -> f64 {
    winner as f64 / (winner + loser) as f64
}

/// Order candidate labels by keyword evidence; the neutral/center label leads on a tie.
fn rank_bias_labels(text: &str, mut labels: Vec<String>) -> Vec<String> {
    let lower = text.to_lowercase();
    let left = count_hits(&lower, LEFT_WORDS);
    let right = count_hits(&lower, RIGHT_WORDS);
    let preferred = match left.cmp(&right) {
        std::cmp::Ordering::Greater => "left",
        std::cmp::Ordering::Less => "right",
        std::cmp::Ordering::Equal => "center",
    };
    if let Some(pos) = labels
        .iter()
        .position(|l| l.to_lowercase().contains(preferred))
    {
        let label = labels.remove(pos);
        labels.insert(0, label);
    }
    labels
}
