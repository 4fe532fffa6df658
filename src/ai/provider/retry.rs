//! Retry policy for provider calls.
//!
//! Exponential backoff (`base * 2^(attempt-1)`, capped) with optional jitter.
//! Rate-limit errors carrying a retry-after hint wait exactly that long.
//! Auth, validation and unclassified errors are never retried.

use std::time::Duration;

use rand::Rng;

use crate::config::RetryConfig;
use crate::types::{ErrorCategory, LlmError};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            jitter: config.jitter,
        }
    }

    /// Single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Whether another attempt follows `attempt` (1-based) failing with `err`
    pub fn should_retry(&self, err: &LlmError, attempt: u32) -> bool {
        err.is_retryable() && attempt < self.max_attempts
    }

    /// Wait before the attempt after `attempt` (1-based)
    pub fn delay_for(&self, err: &LlmError, attempt: u32) -> Duration {
        if err.category == ErrorCategory::RateLimit
            && let Some(hint) = err.retry_after
        {
            // Bounded by `MAX_RETRY_AFTER_SECS` when attached, not by backoff caps
            return hint;
        }

        let backoff = calculate_backoff(self.base_delay, attempt, self.max_delay);
        if self.jitter {
            std::cmp::min(backoff + random_jitter(backoff), self.max_delay)
        } else {
            backoff
        }
    }
}

/// `base * 2^(attempt-1)`, capped at `max`
fn calculate_backoff(base: Duration, attempt: u32, max: Duration) -> Duration {
    let exponent = attempt.saturating_sub(1).min(31);
    let next = base.saturating_mul(1u32 << exponent);
    std::cmp::min(next, max)
}

/// Up to 25% of `base_delay`
fn random_jitter(base_delay: Duration) -> Duration {
    let max_jitter_ms = (base_delay.as_millis() as u64) / 4;
    if max_jitter_ms == 0 {
        return Duration::ZERO;
    }
    let jitter_ms = rand::rng().random_range(0..max_jitter_ms);
    Duration::from_millis(jitter_ms)
}
