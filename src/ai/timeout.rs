//! Per-attempt timeouts for provider calls.
//!
//! A timed-out attempt becomes a `Timeout` provider error, which the retry
//! policy treats like any other retryable failure.
//!
//! ```ignore
//! use crate::ai::timeout::with_timeout;
//!
//! let response = with_timeout(
//!     Duration::from_secs(120),
//!     provider.complete(&request),
//!     provider.name(),
//! ).await?;
//! ```

use std::future::Future;
use std::time::Duration;

use crate::types::LlmError;

/// Execute a provider call with a timeout
pub async fn with_timeout<T, F>(timeout: Duration, future: F, provider: &str) -> Result<T, LlmError>
where
    F: Future<Output = Result<T, LlmError>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(LlmError::timeout(provider, timeout)),
    }
}

/// Execute an infallible wait (e.g. the next stream item) with a timeout
pub async fn with_timeout_map<T, F>(timeout: Duration, future: F, provider: &str) -> Result<T, LlmError>
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => Ok(result),
        Err(_) => Err(LlmError::timeout(provider, timeout)),
    }
}
