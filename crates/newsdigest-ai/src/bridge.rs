//! Inference provider abstraction

use newsdigest_core::InferenceRequest;
use serde_json::Value;

use crate::error::InferenceError;

/// A backend able to run one inference request.
///
/// Responses are returned as raw JSON; interpreting the task-specific shape
/// is left to the caller.
#[async_trait::async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Run `request`, returning the provider payload or a classified error.
    async fn infer(&self, request: &InferenceRequest) -> Result<Value, InferenceError>;

    /// Get provider name
    fn name(&self) -> &str;
}
