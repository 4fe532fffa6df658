//! LLM Provider Abstraction
//!
//! Defines the LlmProvider trait for documentation text generation.
//! All providers return `LlmResponse` with token usage metrics; streaming
//! providers yield `StreamEvent`s terminated by `Done`.
//!
//! ## Modules
//!
//! - `client`: retrying, timing, streaming front end used by the pipeline
//! - `retry`: backoff policy and retry decisions
//! - `sse`: line buffering for server-sent events and NDJSON bodies

mod anthropic;
mod client;
#[cfg(test)]
pub(crate) mod mock;
mod ollama;
mod openai;
mod retry;
mod sse;

pub use anthropic::AnthropicProvider;
pub use client::{ProviderClient, ProviderMetadata, ProviderResult, StreamOutcome};
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use retry::RetryPolicy;

// Re-export error types from centralized location
pub use crate::types::{ErrorCategory, ErrorClassifier, LlmError};

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{LlmConfig, ProviderKind};
use crate::constants::network as net_constants;
use crate::types::{DocError, PromptRequest, Result};

// =============================================================================
// Responses and Usage
// =============================================================================

/// Token usage metrics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Input tokens (prompt)
    pub input_tokens: u32,
    /// Output tokens (response)
    pub output_tokens: u32,
    /// Prompt tokens served from the provider cache
    pub cache_read_tokens: Option<u32>,
    /// Prompt tokens written to the provider cache
    pub cache_write_tokens: Option<u32>,
}

impl TokenUsage {
    /// Total tokens used (input + output)
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }

    pub fn was_cached(&self) -> bool {
        self.cache_read_tokens.is_some_and(|n| n > 0)
    }

    /// Fold a partial usage report (streams report input and output separately)
    pub fn merge(&mut self, other: &TokenUsage) {
        if other.input_tokens > 0 {
            self.input_tokens = other.input_tokens;
        }
        if other.output_tokens > 0 {
            self.output_tokens = other.output_tokens;
        }
        if other.cache_read_tokens.is_some() {
            self.cache_read_tokens = other.cache_read_tokens;
        }
        if other.cache_write_tokens.is_some() {
            self.cache_write_tokens = other.cache_write_tokens;
        }
    }
}

/// Complete single-shot response
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub usage: TokenUsage,
    /// Model that answered (may differ from the requested alias)
    pub model: String,
}

/// Incremental event from a streaming call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Text fragment, in order
    Delta(String),
    /// Usage report; may arrive more than once
    Usage(TokenUsage),
    /// Provider signalled the end of the message
    Done,
}

pub type ChunkStream =
    Pin<Box<dyn Stream<Item = std::result::Result<StreamEvent, LlmError>> + Send>>;

/// Shared LLM provider type; constructed once and injected.
pub type SharedProvider = Arc<dyn LlmProvider + Send + Sync>;

// =============================================================================
// LLM Provider Trait
// =============================================================================

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate the whole document in one call
    async fn complete(&self, request: &PromptRequest)
    -> std::result::Result<LlmResponse, LlmError>;

    /// Open a streaming call. Errors before the first event are returned
    /// here; later failures arrive as stream items.
    async fn stream(&self, request: &PromptRequest) -> std::result::Result<ChunkStream, LlmError>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model name currently in use
    fn model(&self) -> &str;

    /// Whether the provider honours `PromptRequest::caching_hint`
    fn supports_caching(&self) -> bool {
        false
    }
}

/// Create a shared provider from configuration
pub fn create_provider(config: &LlmConfig) -> Result<SharedProvider> {
    match config.provider {
        ProviderKind::Anthropic => Ok(Arc::new(AnthropicProvider::new(config)?)),
        ProviderKind::OpenAi => Ok(Arc::new(OpenAiProvider::new(config)?)),
        ProviderKind::Ollama => Ok(Arc::new(OllamaProvider::new(config)?)),
    }
}

// =============================================================================
// Shared HTTP helpers
// =============================================================================

/// HTTP client for a provider. Only connecting is bounded here; each attempt
/// is bounded by the caller so long streams are not cut off.
pub(crate) fn build_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(net_constants::CONNECTION_TIMEOUT_SECS))
        .pool_max_idle_per_host(net_constants::POOL_MAX_IDLE_PER_HOST)
        .build()
        .map_err(|e| DocError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Endpoint without a trailing slash
pub(crate) fn normalize_base(base: &str) -> String {
    base.trim_end_matches('/').to_string()
}

/// Turn a non-success response into a classified error, keeping the
/// provider's message and any retry hint.
pub(crate) async fn error_from_response(response: reqwest::Response, provider: &str) -> LlmError {
    let status = response.status().as_u16();
    let retry_after = ErrorClassifier::retry_after_from_headers(response.headers());
    let body = response.text().await.unwrap_or_default();
    let message = provider_message(&body).unwrap_or_else(|| {
        let snippet: String = body.chars().take(500).collect();
        if snippet.is_empty() {
            format!("HTTP {}", status)
        } else {
            snippet
        }
    });

    let err = ErrorClassifier::classify_http_status(status, &message, provider);
    match retry_after {
        Some(delay) => err.retry_after(delay),
        None => err,
    }
}

/// `{"error": {"message": ...}}` or `{"error": "..."}`
fn provider_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    error
        .get("message")
        .and_then(|m| m.as_str())
        .or_else(|| error.as_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_merge_keeps_partial_reports() {
        let mut usage = TokenUsage {
            input_tokens: 120,
            cache_read_tokens: Some(100),
            ..Default::default()
        };
        usage.merge(&TokenUsage {
            output_tokens: 40,
            ..Default::default()
        });
        assert_eq!(usage.input_tokens, 120);
        assert_eq!(usage.output_tokens, 40);
        assert_eq!(usage.total(), 160);
        assert!(usage.was_cached());
    }

    #[test]
    fn test_provider_message_shapes() {
        assert_eq!(
            provider_message(r#"{"type":"error","error":{"type":"rate_limit_error","message":"slow down"}}"#),
            Some("slow down".to_string())
        );
        assert_eq!(
            provider_message(r#"{"error":"model not found"}"#),
            Some("model not found".to_string())
        );
        assert_eq!(provider_message("<html>502</html>"), None);
    }

    #[test]
    fn test_create_provider_requires_key() {
        let config = LlmConfig {
            provider: ProviderKind::OpenAi,
            api_key: Some("   ".to_string()),
            ..Default::default()
        };
        // Blank keys never count; only the environment could supply one.
        if std::env::var("OPENAI_API_KEY").is_err() {
            assert!(matches!(create_provider(&config), Err(DocError::Config(_))));
        }
    }

    #[test]
    fn test_create_ollama_without_key() {
        let config = LlmConfig {
            provider: ProviderKind::Ollama,
            ..Default::default()
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "ollama");
        assert!(!provider.supports_caching());
    }
}
