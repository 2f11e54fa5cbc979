//! Fitting article text into the provider's input budget
//!
//! All sizes are counted in characters, never bytes, so a cut can never land
//! inside a multi-byte code point.

use newsdigest_core::{InferenceRequest, Parameters, Task};
use serde_json::Value;

use crate::bridge::InferenceProvider;
use crate::error::{InferenceError, preview};

/// Inputs longer than this are summarized chunk by chunk.
pub const LONG_TEXT_THRESHOLD: usize = 4000;
/// Size of each chunk in the map step.
pub const CHUNK_CHARS: usize = 3000;
/// Budget for a single-pass summary or classification input.
pub const SINGLE_PASS_CHARS: usize = 3500;
/// Budget for the reduce step over joined chunk summaries.
pub const REDUCE_CHARS: usize = 3000;

const SUMMARY_MAX_LENGTH: u32 = 120;
const SUMMARY_MIN_LENGTH: u32 = 30;

/// Cut `text` to at most `max_chars`, preferring to end on a sentence.
///
/// When the hard cut leaves a `.` past 60% of the window, the text is cut
/// just after that period instead.
pub fn trim(text: &str, max_chars: usize) -> &str {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text;
    };
    let window = &text[..cut];
    if let Some(period) = window.rfind('.') {
        let period_char = window[..period].chars().count();
        if period_char > max_chars * 6 / 10 {
            return &window[..=period];
        }
    }
    window
}

/// Split into consecutive pieces of `chunk_chars` characters (the last may be shorter).
pub fn split_chunks(text: &str, chunk_chars: usize) -> Vec<&str> {
    let chunk_chars = chunk_chars.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    for (count, (idx, _)) in text.char_indices().enumerate() {
        if count > 0 && count % chunk_chars == 0 {
            chunks.push(&text[start..idx]);
            start = idx;
        }
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }
    chunks
}

pub fn summary_parameters() -> Parameters {
    Parameters::new()
        .with("max_length", SUMMARY_MAX_LENGTH)
        .with("min_length", SUMMARY_MIN_LENGTH)
}

/// Pull the summary text out of a summarization payload.
///
/// Accepts `[{"summary_text": ..}]`, `{"summary_text": ..}` and the
/// `generated_text` spelling some models use.
pub fn extract_summary(value: &Value) -> Option<String> {
    let object = match value {
        Value::Array(items) => items.first()?,
        other => other,
    };
    ["summary_text", "generated_text"]
        .iter()
        .find_map(|field| object.get(field)?.as_str())
        .map(|s| s.trim().to_string())
}

async fn summarize_once(
    provider: &dyn InferenceProvider,
    text: &str,
) -> Result<String, InferenceError> {
    let request =
        InferenceRequest::new(Task::Summarization, text).with_parameters(summary_parameters());
    let value = provider.infer(&request).await?;
    extract_summary(&value).ok_or_else(|| InferenceError::UnexpectedResponse {
        task: Task::Summarization,
        preview: preview(&value.to_string(), 200),
    })
}

/// Map-then-reduce summary for text above [`LONG_TEXT_THRESHOLD`].
///
/// Issues `ceil(len / CHUNK_CHARS) + 1` provider calls: one per chunk and a
/// final pass over the joined chunk summaries.
pub async fn summarize_long(
    provider: &dyn InferenceProvider,
    text: &str,
) -> Result<String, InferenceError> {
    let chunks = split_chunks(text, CHUNK_CHARS);
    tracing::debug!(chunks = chunks.len(), chars = text.chars().count(), "summarizing long text");

    let mut summaries = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        summaries.push(summarize_once(provider, trim(chunk, CHUNK_CHARS)).await?);
    }
    let combined = summaries.join(" ");
    summarize_once(provider, trim(&combined, REDUCE_CHARS)).await
}

/// Summarize text of any length, choosing single-pass or map-then-reduce.
pub async fn summarize_text(
    provider: &dyn InferenceProvider,
    text: &str,
) -> Result<String, InferenceError> {
    if text.chars().count() > LONG_TEXT_THRESHOLD {
        summarize_long(provider, text).await
    } else {
        summarize_once(provider, trim(text, SINGLE_PASS_CHARS)).await
    }
}
