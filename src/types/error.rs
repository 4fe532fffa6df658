//! Unified Error Type System
//!
//! Centralized error types for the entire pipeline.
//! Provides error classification for retry decisions and for the HTTP boundary.
//!
//! ## Error Categories
//!
//! - **Auth**: Credentials rejected (fail fast)
//! - **RateLimit**: Provider throttling (wait, honoring retry-after)
//! - **Validation**: Request rejected as malformed (fail fast)
//! - **Timeout**: Attempt exceeded its deadline (retry with backoff)
//! - **Network**: Connectivity or broken stream (retry with backoff)
//! - **ServerError**: Provider-side 5xx / overload (retry with backoff)
//! - **Unknown**: Anything else (never retried)

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::constants::retry as retry_constants;

// =============================================================================
// Error Categories
// =============================================================================

/// Classified provider failure kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Auth,
    RateLimit,
    Validation,
    Timeout,
    Network,
    ServerError,
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "AUTH",
            Self::RateLimit => "RATE_LIMIT",
            Self::Validation => "VALIDATION",
            Self::Timeout => "TIMEOUT",
            Self::Network => "NETWORK",
            Self::ServerError => "SERVER_ERROR",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Check if this category may be retried on the same provider
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimit | Self::Network | Self::Timeout | Self::ServerError
        )
    }

    /// Status code the HTTP boundary reports for this category
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Auth => 401,
            Self::RateLimit => 429,
            Self::Validation => 400,
            Self::Timeout => 504,
            Self::Network => 502,
            Self::ServerError => 503,
            Self::Unknown => 500,
        }
    }
}

// =============================================================================
// LLM Error
// =============================================================================

/// Classified provider error with retry hints and the original cause
#[derive(Debug, Clone)]
pub struct LlmError {
    /// Error category for retry decisions
    pub category: ErrorCategory,
    /// Detailed error message
    pub message: String,
    /// Provider that produced the error
    pub provider: Option<String>,
    /// HTTP status, when the provider answered
    pub status: Option<u16>,
    /// Provider-supplied wait before retrying
    pub retry_after: Option<Duration>,
    /// Attempts made before this error was surfaced
    pub attempts: u32,
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(provider) = &self.provider {
            write!(f, "[{}:{}] {}", provider, self.category, self.message)
        } else {
            write!(f, "[{}] {}", self.category, self.message)
        }
    }
}

impl std::error::Error for LlmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl LlmError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            provider: None,
            status: None,
            retry_after: None,
            attempts: 0,
            source: None,
        }
    }

    pub fn with_provider(
        category: ErrorCategory,
        message: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self::new(category, message).provider(provider)
    }

    /// Add provider context to existing error
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Add suggested retry delay (capped)
    pub fn retry_after(mut self, duration: Duration) -> Self {
        let cap = Duration::from_secs(retry_constants::MAX_RETRY_AFTER_SECS);
        self.retry_after = Some(duration.min(cap));
        self
    }

    /// Attach the underlying error for diagnostics
    pub fn caused_by<E>(mut self, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Arc::new(err));
        self
    }

    pub fn attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.category.is_retryable()
    }

    pub fn timeout(provider: &str, after: Duration) -> Self {
        Self::with_provider(
            ErrorCategory::Timeout,
            format!("attempt timed out after {}ms", after.as_millis()),
            provider,
        )
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Maps transport failures, HTTP statuses and messages to categories
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify HTTP status code directly (more accurate than string matching)
    pub fn classify_http_status(status: u16, message: &str, provider: &str) -> LlmError {
        let category = match status {
            401 | 403 => ErrorCategory::Auth,
            429 => ErrorCategory::RateLimit,
            400 | 404 | 413 | 422 => ErrorCategory::Validation,
            408 => ErrorCategory::Timeout,
            500..=599 => ErrorCategory::ServerError,
            _ => ErrorCategory::Unknown,
        };
        LlmError::with_provider(category, message, provider).status(status)
    }

    /// Classify a transport-level failure from the HTTP client
    pub fn classify_transport(err: reqwest::Error, provider: &str) -> LlmError {
        let category = if err.is_timeout() {
            ErrorCategory::Timeout
        } else if let Some(status) = err.status() {
            return Self::classify_http_status(status.as_u16(), &err.to_string(), provider)
                .caused_by(err);
        } else if err.is_connect() || err.is_request() || err.is_body() {
            ErrorCategory::Network
        } else if err.is_decode() {
            ErrorCategory::ServerError
        } else {
            Self::classify_message(&err.to_string())
        };
        LlmError::with_provider(category, err.to_string(), provider).caused_by(err)
    }

    /// Classify a free-form error message (last resort)
    pub fn classify(message: &str, provider: &str) -> LlmError {
        LlmError::with_provider(Self::classify_message(message), message, provider)
    }

    fn classify_message(message: &str) -> ErrorCategory {
        let lower = message.to_lowercase();

        if lower.contains("rate limit")
            || lower.contains("too many requests")
            || lower.contains("quota exceeded")
        {
            return ErrorCategory::RateLimit;
        }

        if lower.contains("unauthorized")
            || lower.contains("api key")
            || lower.contains("invalid key")
            || lower.contains("permission denied")
            || lower.contains("authentication")
        {
            return ErrorCategory::Auth;
        }

        if lower.contains("timed out") || lower.contains("timeout") {
            return ErrorCategory::Timeout;
        }

        if lower.contains("connection")
            || lower.contains("network")
            || lower.contains("dns")
            || lower.contains("unreachable")
            || lower.contains("broken pipe")
        {
            return ErrorCategory::Network;
        }

        if lower.contains("overloaded")
            || lower.contains("service unavailable")
            || lower.contains("internal server error")
            || lower.contains("bad gateway")
        {
            return ErrorCategory::ServerError;
        }

        if lower.contains("bad request") || lower.contains("invalid request") {
            return ErrorCategory::Validation;
        }

        ErrorCategory::Unknown
    }

    /// Parse a `Retry-After` header value: delta-seconds or an HTTP-date
    pub fn parse_retry_after(value: &str) -> Option<Duration> {
        let value = value.trim();
        if let Ok(secs) = value.parse::<u64>() {
            return Some(Duration::from_secs(secs));
        }
        if let Ok(secs) = value.parse::<f64>()
            && secs.is_finite()
            && secs >= 0.0
        {
            // Out-of-range hints saturate; `LlmError::retry_after` caps them
            return Some(Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX));
        }
        let when = chrono::DateTime::parse_from_rfc2822(value).ok()?;
        let delta = when.with_timezone(&chrono::Utc) - chrono::Utc::now();
        Some(delta.to_std().unwrap_or(Duration::ZERO))
    }

    /// Extract a retry hint from response headers (`retry-after-ms` wins)
    pub fn retry_after_from_headers(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
        if let Some(ms) = headers
            .get("retry-after-ms")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            return Some(Duration::from_millis(ms));
        }
        headers
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(Self::parse_retry_after)
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Structured validation error with context
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// What validation failed
    pub kind: ValidationErrorKind,
    /// Field or component that failed validation
    pub field: Option<String>,
    /// Detailed message
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(field) = &self.field {
            write!(f, "Validation failed for '{}': {}", field, self.message)
        } else {
            write!(f, "Validation failed: {}", self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: None,
            message: message.into(),
        }
    }

    /// Add field context
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// Validation error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Doc type not recognized
    UnknownDocType,
    /// Source empty or whitespace only
    EmptySource,
    /// Source larger than the accepted maximum
    OversizedSource,
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum DocError {
    #[error("{0}")]
    Validation(ValidationError),

    /// Classified provider failure (after retries were exhausted)
    #[error("Provider error: {0}")]
    Provider(LlmError),

    #[error("Config error: {0}")]
    Config(String),

    /// Structural parse failure; the analyzer converts this into fallback mode
    #[error("Parse error ({language}): {message}")]
    Parse { language: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<LlmError> for DocError {
    fn from(err: LlmError) -> Self {
        DocError::Provider(err)
    }
}

impl From<ValidationError> for DocError {
    fn from(err: ValidationError) -> Self {
        DocError::Validation(err)
    }
}

pub type Result<T> = std::result::Result<T, DocError>;

impl DocError {
    pub fn validation(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self::Validation(ValidationError::new(kind, message))
    }

    pub fn parse(language: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            language: language.into(),
            message: message.into(),
        }
    }

    /// Classified kind reported to callers
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Provider(e) => e.category.as_str(),
            Self::Config(_) => "CONFIG_ERROR",
            Self::Parse { .. } => "PARSE_ERROR",
            Self::Io(_) | Self::Json(_) => "INTERNAL_ERROR",
        }
    }

    /// Status code for the HTTP boundary
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Provider(e) => e.category.http_status(),
            Self::Config(_) | Self::Parse { .. } | Self::Io(_) | Self::Json(_) => 500,
        }
    }

    /// Retry hint to surface alongside a rate-limit response
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Provider(e) => e.retry_after,
            _ => None,
        }
    }

    pub fn as_provider_error(&self) -> Option<&LlmError> {
        match self {
            Self::Provider(e) => Some(e),
            _ => None,
        }
    }
}
