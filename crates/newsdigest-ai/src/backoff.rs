//! Retry policy for provider calls
//!
//! The policy is a pure function of the attempt number; [`RetryState`]
//! walks it one failure at a time so the schedule can be checked without
//! any time passing.

use std::time::Duration;

/// Default attempt budget per logical call.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;
/// Default delay before the first retry, before jitter.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
/// Fixed wait applied when the provider reports a cold start.
pub const DEFAULT_WARMUP_DELAY: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub warmup_delay: Duration,
}

impl BackoffPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            warmup_delay: DEFAULT_WARMUP_DELAY,
        }
    }

    pub fn with_warmup_delay(mut self, warmup_delay: Duration) -> Self {
        self.warmup_delay = warmup_delay;
        self
    }

    /// Wait after the `attempt`-th failure (1-indexed).
    ///
    /// `base * 2^(n-1)`, plus a deterministic jitter of 20% on odd attempts
    /// and 10% on even ones.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let backoff = self.base_delay.saturating_mul(1u32 << exponent);
        let jitter = backoff.mul_f64(0.1 * f64::from(1 + attempt % 2));
        backoff.saturating_add(jitter)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_DELAY)
    }
}

/// Why an attempt failed, as far as retrying is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transient,
    ColdStart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Wait(Duration),
    GiveUp,
}

/// Attempt bookkeeping for one logical call.
#[derive(Debug, Clone)]
pub struct RetryState {
    attempt: u32,
    policy: BackoffPolicy,
}

impl RetryState {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self { attempt: 0, policy }
    }

    /// Start the next attempt and return its 1-indexed number.
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempt += 1;
        self.attempt
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn max_attempts(&self) -> u32 {
        self.policy.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.policy.base_delay
    }

    /// Decide what follows a failure of the current attempt.
    pub fn on_failure(&self, kind: FailureKind) -> RetryDecision {
        if self.attempt >= self.policy.max_attempts {
            return RetryDecision::GiveUp;
        }
        match kind {
            FailureKind::ColdStart => RetryDecision::Wait(self.policy.warmup_delay),
            FailureKind::Transient => RetryDecision::Wait(self.policy.delay(self.attempt)),
        }
    }
}
