//! HTTP gateway to the hosted inference API
//!
//! Every call goes through the response cache first. Misses are sent to
//! `{endpoint}/{model}` and retried according to the [`BackoffPolicy`]:
//! network failures and 404/429/500/502/503 are transient, a 503 mentioning
//! "loading" is a cold start with its own fixed wait, anything else is fatal.

use std::sync::Arc;

use newsdigest_core::{InferenceRequest, Parameters, Task};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;

use crate::backoff::{BackoffPolicy, FailureKind, RetryDecision, RetryState};
use crate::bridge::InferenceProvider;
use crate::cache::{CacheKey, ResponseCache};
use crate::clock::{Sleeper, TokioSleeper};
use crate::config::{AiConfig, ModelConfig};
use crate::error::{BODY_PREVIEW_CHARS, ConfigError, InferenceError, preview};

const TRANSIENT_STATUSES: [u16; 5] = [404, 429, 500, 502, 503];

#[derive(Debug, Serialize)]
struct InferencePayload<'a> {
    inputs: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<&'a Parameters>,
}

pub struct Gateway {
    client: reqwest::Client,
    endpoint: String,
    api_token: String,
    models: ModelConfig,
    cache: Arc<ResponseCache>,
    policy: BackoffPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl Gateway {
    pub fn new(config: &AiConfig, cache: Arc<ResponseCache>) -> Result<Self, ConfigError> {
        let api_token = config
            .api_token
            .clone()
            .ok_or(ConfigError::MissingCredential(crate::config::TOKEN_VAR))?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_token,
            models: config.models.clone(),
            cache,
            policy: config.retry.policy(),
            sleeper: Arc::new(TokioSleeper),
        })
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Run `request`, serving it from cache when a live entry exists.
    pub async fn call(&self, request: &InferenceRequest) -> Result<Value, InferenceError> {
        let key = CacheKey::for_request(request);
        if let Some(value) = self.cache.get(&key) {
            tracing::debug!(task = %request.task(), "inference served from cache");
            return Ok(value);
        }

        let model = self.models.for_task(request.task());
        let url = format!("{}/{}", self.endpoint, model);
        let payload = InferencePayload {
            inputs: request.inputs(),
            parameters: (!request.parameters().is_empty()).then(|| request.parameters()),
        };

        let mut retry = RetryState::new(self.policy.clone());
        loop {
            let attempt = retry.begin_attempt();
            let failure = match self.attempt(&url, model, request.task(), &payload, attempt).await {
                Ok(value) => {
                    self.cache.put(key, value.clone());
                    return Ok(value);
                }
                Err(failure) => failure,
            };

            let kind = match failure {
                InferenceError::ModelLoading { .. } => FailureKind::ColdStart,
                InferenceError::Transient { .. } => FailureKind::Transient,
                fatal => {
                    tracing::error!(model, task = %request.task(), error = %fatal, "inference failed");
                    return Err(fatal);
                }
            };

            match retry.on_failure(kind) {
                RetryDecision::Wait(delay) => {
                    tracing::info!(
                        model,
                        attempt,
                        max_attempts = retry.max_attempts(),
                        delay_ms = delay.as_millis() as u64,
                        reason = %failure,
                        "retrying inference request"
                    );
                    self.sleeper.sleep(delay).await;
                }
                RetryDecision::GiveUp => {
                    let exhausted = exhausted(model, attempt, failure);
                    tracing::error!(model, task = %request.task(), error = %exhausted, "inference failed");
                    return Err(exhausted);
                }
            }
        }
    }

    /// One HTTP round trip, classified.
    async fn attempt(
        &self,
        url: &str,
        model: &str,
        task: Task,
        payload: &InferencePayload<'_>,
        attempt: u32,
    ) -> Result<Value, InferenceError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_token)
            .json(payload)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(model, %task, attempt, error = %e, "inference request error");
                return Err(network_failure(&e));
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(model, %task, attempt, status = status.as_u16(), error = %e, "failed to read inference response");
                return Err(network_failure(&e));
            }
        };

        tracing::info!(
            model,
            %task,
            attempt,
            status = status.as_u16(),
            body = %preview(&body, BODY_PREVIEW_CHARS),
            "inference response"
        );

        classify(model, status, body)
    }
}

#[async_trait::async_trait]
impl InferenceProvider for Gateway {
    async fn infer(&self, request: &InferenceRequest) -> Result<Value, InferenceError> {
        self.call(request).await
    }

    fn name(&self) -> &str {
        "huggingface"
    }
}

/// Map a completed HTTP exchange onto a payload or a classified error.
fn classify(model: &str, status: StatusCode, body: String) -> Result<Value, InferenceError> {
    if status.is_success() {
        return Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)));
    }

    let code = status.as_u16();
    if code == 503 && body.to_lowercase().contains("loading") {
        return Err(InferenceError::ModelLoading {
            model: model.to_string(),
        });
    }
    if TRANSIENT_STATUSES.contains(&code) {
        return Err(InferenceError::Transient {
            status: Some(code),
            reason: format!("HTTP {code}"),
        });
    }
    Err(InferenceError::Fatal {
        model: model.to_string(),
        status: code,
        body_preview: preview(&body, BODY_PREVIEW_CHARS),
    })
}

fn network_failure(error: &reqwest::Error) -> InferenceError {
    let reason = if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_connect() {
        "connection failed".to_string()
    } else {
        format!("request error: {error}")
    };
    InferenceError::Transient {
        status: None,
        reason,
    }
}

/// Terminal error for a call whose attempt budget ran out on `last`.
fn exhausted(model: &str, attempts: u32, last: InferenceError) -> InferenceError {
    match last {
        InferenceError::Transient {
            status: Some(404), ..
        } => InferenceError::NotFound {
            model: model.to_string(),
            attempts,
        },
        other => InferenceError::ExhaustedRetries {
            model: model.to_string(),
            attempts,
            reason: other.to_string(),
        },
    }
}
