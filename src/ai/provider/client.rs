//! Provider Client
//!
//! Front end over a single injected provider. Owns the retry loop, the
//! per-attempt timeout and chunk forwarding for streaming calls.
//!
//! ## Streaming
//!
//! Fragments are forwarded to the sink in wire order as soon as they arrive.
//! The accumulated text is only returned after the provider's terminal event.
//! An attempt that fails before anything was forwarded is retried; once a
//! fragment has reached the sink the failure is final.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::retry::RetryPolicy;
use super::{SharedProvider, StreamEvent, TokenUsage, create_provider};
use crate::ai::timeout::{with_timeout, with_timeout_map};
use crate::config::Config;
use crate::types::{ErrorCategory, LlmError, PromptRequest, Result};

/// Generation metadata reported alongside the text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderMetadata {
    pub provider: String,
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_read_tokens: Option<u32>,
    pub was_cached: bool,
    pub latency_ms: u64,
    /// Attempts including the successful one
    pub attempts: u32,
}

/// Final provider output. Only built once the whole text is known.
#[derive(Debug, Clone)]
pub struct ProviderResult {
    pub text: String,
    pub metadata: ProviderMetadata,
}

/// How a streaming call ended when it did not fail
#[derive(Debug)]
pub enum StreamOutcome {
    Completed(ProviderResult),
    /// The caller cancelled or stopped receiving chunks
    Cancelled,
}

/// Result of one streaming attempt
enum Attempt {
    Finished { text: String, usage: TokenUsage },
    SinkClosed,
}

/// Retrying, timed front end over one provider
#[derive(Clone)]
pub struct ProviderClient {
    provider: SharedProvider,
    retry: RetryPolicy,
    attempt_timeout: Duration,
}

impl std::fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderClient")
            .field("provider", &self.provider.name())
            .field("model", &self.provider.model())
            .field("retry", &self.retry)
            .field("attempt_timeout", &self.attempt_timeout)
            .finish()
    }
}

impl ProviderClient {
    pub fn new(provider: SharedProvider, retry: RetryPolicy, attempt_timeout: Duration) -> Self {
        Self {
            provider,
            retry,
            attempt_timeout,
        }
    }

    /// Build the configured provider and wrap it
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = create_provider(&config.llm)?;
        Ok(Self::new(
            provider,
            RetryPolicy::from_config(&config.retry),
            Duration::from_secs(config.llm.timeout_secs),
        ))
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Whether the active provider honours `PromptRequest::caching_hint`
    pub fn supports_caching(&self) -> bool {
        self.provider.supports_caching()
    }

    pub fn provider(&self) -> SharedProvider {
        Arc::clone(&self.provider)
    }

    /// Single-shot generation with retries
    #[instrument(skip_all, fields(provider = %self.provider.name(), doc_type = %request.doc_type))]
    pub async fn generate(
        &self,
        request: &PromptRequest,
    ) -> std::result::Result<ProviderResult, LlmError> {
        let started = Instant::now();
        let name = self.provider.name();
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(attempt, "Provider attempt");

            let outcome = with_timeout(self.attempt_timeout, self.provider.complete(request), name).await;
            match outcome {
                Ok(response) => {
                    let metadata = self.metadata(&response.usage, response.model, started, attempt);
                    info!(
                        attempt,
                        latency_ms = metadata.latency_ms,
                        output_tokens = metadata.output_tokens,
                        "Generation complete"
                    );
                    return Ok(ProviderResult {
                        text: response.text,
                        metadata,
                    });
                }
                Err(err) => {
                    let err = self.attribute(err);
                    if !self.retry.should_retry(&err, attempt) {
                        return Err(err.attempts(attempt));
                    }
                    let delay = self.retry.delay_for(&err, attempt);
                    warn!(
                        attempt,
                        category = %err.category,
                        delay_ms = delay.as_millis() as u64,
                        "Retryable provider failure: {}",
                        err.message
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Streaming generation. Each fragment is sent to `sink` in arrival order;
    /// the concatenation of the sent fragments equals the returned text.
    ///
    /// Cancelling `cancel` or dropping the sink's receiver ends the call with
    /// `StreamOutcome::Cancelled` and drops the provider stream.
    #[instrument(skip_all, fields(provider = %self.provider.name(), doc_type = %request.doc_type))]
    pub async fn generate_streaming(
        &self,
        request: &PromptRequest,
        sink: &mpsc::Sender<String>,
        cancel: &CancellationToken,
    ) -> std::result::Result<StreamOutcome, LlmError> {
        let started = Instant::now();
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(attempt, "Streaming attempt");

            let mut forwarded = 0usize;
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(attempt, "Stream cancelled by caller");
                    return Ok(StreamOutcome::Cancelled);
                }
                outcome = self.stream_attempt(request, sink, &mut forwarded) => outcome,
            };

            match outcome {
                Ok(Attempt::Finished { text, usage }) => {
                    let metadata =
                        self.metadata(&usage, self.provider.model().to_string(), started, attempt);
                    info!(
                        attempt,
                        chunks = forwarded,
                        latency_ms = metadata.latency_ms,
                        "Stream complete"
                    );
                    return Ok(StreamOutcome::Completed(ProviderResult { text, metadata }));
                }
                Ok(Attempt::SinkClosed) => {
                    info!(chunks = forwarded, "Chunk receiver dropped, stopping stream");
                    return Ok(StreamOutcome::Cancelled);
                }
                Err(err) => {
                    let err = self.attribute(err);
                    if forwarded > 0 {
                        warn!(
                            chunks = forwarded,
                            category = %err.category,
                            "Stream failed after forwarding text, not retrying"
                        );
                        return Err(err.attempts(attempt));
                    }
                    if !self.retry.should_retry(&err, attempt) {
                        return Err(err.attempts(attempt));
                    }
                    let delay = self.retry.delay_for(&err, attempt);
                    warn!(
                        attempt,
                        category = %err.category,
                        delay_ms = delay.as_millis() as u64,
                        "Retryable stream failure: {}",
                        err.message
                    );
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Ok(StreamOutcome::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }

    /// One streaming attempt. The timeout bounds opening the stream and each
    /// wait for the next event.
    async fn stream_attempt(
        &self,
        request: &PromptRequest,
        sink: &mpsc::Sender<String>,
        forwarded: &mut usize,
    ) -> std::result::Result<Attempt, LlmError> {
        let name = self.provider.name();
        let mut stream = with_timeout(self.attempt_timeout, self.provider.stream(request), name).await?;

        let mut text = String::new();
        let mut usage = TokenUsage::default();

        loop {
            let event = with_timeout_map(self.attempt_timeout, stream.next(), name).await?;
            match event {
                Some(Ok(StreamEvent::Delta(fragment))) => {
                    if fragment.is_empty() {
                        continue;
                    }
                    text.push_str(&fragment);
                    if sink.send(fragment).await.is_err() {
                        return Ok(Attempt::SinkClosed);
                    }
                    *forwarded += 1;
                }
                Some(Ok(StreamEvent::Usage(report))) => usage.merge(&report),
                Some(Ok(StreamEvent::Done)) => return Ok(Attempt::Finished { text, usage }),
                Some(Err(err)) => return Err(err),
                None => {
                    return Err(LlmError::with_provider(
                        ErrorCategory::Network,
                        "Stream ended before the completion event",
                        name,
                    ));
                }
            }
        }
    }

    fn attribute(&self, err: LlmError) -> LlmError {
        if err.provider.is_some() {
            err
        } else {
            err.provider(self.provider.name())
        }
    }

    fn metadata(
        &self,
        usage: &TokenUsage,
        model: String,
        started: Instant,
        attempts: u32,
    ) -> ProviderMetadata {
        ProviderMetadata {
            provider: self.provider.name().to_string(),
            model,
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            cache_read_tokens: usage.cache_read_tokens,
            was_cached: usage.was_cached(),
            latency_ms: started.elapsed().as_millis() as u64,
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::mock::{Script, ScriptedProvider, StreamStep};
    use crate::types::DocType;

    fn request(caching_hint: bool) -> PromptRequest {
        PromptRequest {
            system_instructions: "Write a README.".to_string(),
            user_content: "Document this.".to_string(),
            code_segment: "function add(a,b){return a+b}".to_string(),
            doc_type: DocType::Readme,
            caching_hint,
            max_output_tokens: 512,
        }
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            jitter: false,
        }
    }

    fn client(provider: &Arc<ScriptedProvider>) -> ProviderClient {
        ProviderClient::new(provider.clone(), fast_retry(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_server_error_retried_until_success() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Script::error(ErrorCategory::ServerError),
            Script::error(ErrorCategory::ServerError),
            Script::text("# Done"),
        ]));
        let result = client(&provider).generate(&request(false)).await.unwrap();

        assert_eq!(provider.calls(), 3);
        assert_eq!(result.text, "# Done");
        assert_eq!(result.metadata.attempts, 3);
        assert_eq!(result.metadata.provider, "scripted");
    }

    #[tokio::test]
    async fn test_auth_and_validation_fail_once() {
        for category in [ErrorCategory::Auth, ErrorCategory::Validation] {
            let provider = Arc::new(ScriptedProvider::new(vec![Script::error(category)]));
            let err = client(&provider).generate(&request(false)).await.unwrap_err();

            assert_eq!(provider.calls(), 1, "{}", category);
            assert_eq!(err.category, category);
            assert_eq!(err.attempts, 1);
        }
    }

    #[tokio::test]
    async fn test_exhausted_retries_surface_last_error() {
        let provider = Arc::new(ScriptedProvider::new(vec![Script::error(
            ErrorCategory::Network,
        )]));
        let err = client(&provider).generate(&request(false)).await.unwrap_err();

        assert_eq!(provider.calls(), 3);
        assert_eq!(err.category, ErrorCategory::Network);
        assert_eq!(err.attempts, 3);
        assert_eq!(err.provider.as_deref(), Some("scripted"));
    }

    #[tokio::test]
    async fn test_attempt_timeout_is_retried() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Script::Complete {
                delay: Duration::from_millis(500),
                result: Ok("late".to_string()),
            },
            Script::text("on time"),
        ]));
        let client = ProviderClient::new(provider.clone(), fast_retry(), Duration::from_millis(50));
        let result = client.generate(&request(false)).await.unwrap();

        assert_eq!(provider.calls(), 2);
        assert_eq!(result.text, "on time");
    }

    #[tokio::test]
    async fn test_caching_reported_from_usage() {
        let provider = Arc::new(ScriptedProvider::new(vec![Script::text("# Cached")]).with_caching());
        let result = client(&provider).generate(&request(true)).await.unwrap();
        assert!(result.metadata.was_cached);
        assert!(result.metadata.cache_read_tokens.is_some());

        let result = client(&provider).generate(&request(false)).await.unwrap();
        assert!(!result.metadata.was_cached);
    }

    #[tokio::test]
    async fn test_streaming_forwards_fragments_in_order() {
        let provider = Arc::new(ScriptedProvider::new(vec![Script::chunks(&[
            "# Tit", "le\n", "Body",
        ])]));
        let (tx, mut rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();

        let outcome = client(&provider)
            .generate_streaming(&request(false), &tx, &cancel)
            .await
            .unwrap();
        drop(tx);

        let mut received = Vec::new();
        while let Some(chunk) = rx.recv().await {
            received.push(chunk);
        }
        assert_eq!(received, vec!["# Tit", "le\n", "Body"]);

        let StreamOutcome::Completed(result) = outcome else {
            panic!("expected completion");
        };
        assert_eq!(result.text, "# Title\nBody");
        assert_eq!(result.text, received.concat());
        assert_eq!(result.metadata.output_tokens, 3);
    }

    #[tokio::test]
    async fn test_streaming_cancel_mid_flight() {
        let steps = ["a", "b", "c", "d", "e"]
            .iter()
            .flat_map(|c| {
                [
                    StreamStep::Chunk(c.to_string()),
                    StreamStep::Delay(Duration::from_millis(30)),
                ]
            })
            .collect();
        let provider = Arc::new(ScriptedProvider::new(vec![Script::Stream(steps)]));
        let client = client(&provider);
        let (tx, mut rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();

        let consumer = async {
            let mut received = Vec::new();
            while let Some(chunk) = rx.recv().await {
                received.push(chunk);
                if received.len() == 2 {
                    cancel.cancel();
                    break;
                }
            }
            received
        };
        let req = request(false);
        let (outcome, received) =
            tokio::join!(client.generate_streaming(&req, &tx, &cancel), consumer);

        assert!(matches!(outcome.unwrap(), StreamOutcome::Cancelled));
        assert_eq!(received, vec!["a", "b"]);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_dropped_receiver_counts_as_cancel() {
        let provider = Arc::new(ScriptedProvider::new(vec![Script::chunks(&["one", "two"])]));
        let (tx, rx) = mpsc::channel(4);
        drop(rx);

        let outcome = client(&provider)
            .generate_streaming(&request(false), &tx, &CancellationToken::new())
            .await
            .unwrap();
        assert!(matches!(outcome, StreamOutcome::Cancelled));
    }

    #[tokio::test]
    async fn test_stream_failure_before_first_chunk_is_retried() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Script::Stream(vec![StreamStep::Fail(LlmError::new(
                ErrorCategory::ServerError,
                "overloaded",
            ))]),
            Script::FailOpen(LlmError::new(ErrorCategory::RateLimit, "slow down")),
            Script::chunks(&["ok"]),
        ]));
        let (tx, _rx) = mpsc::channel(16);

        let outcome = client(&provider)
            .generate_streaming(&request(false), &tx, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(provider.calls(), 3);
        let StreamOutcome::Completed(result) = outcome else {
            panic!("expected completion");
        };
        assert_eq!(result.text, "ok");
        assert_eq!(result.metadata.attempts, 3);
    }

    #[tokio::test]
    async fn test_stream_failure_after_chunk_is_final() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Script::Stream(vec![
                StreamStep::Chunk("partial".to_string()),
                StreamStep::Fail(LlmError::new(ErrorCategory::ServerError, "reset")),
            ]),
            Script::chunks(&["never"]),
        ]));
        let (tx, _rx) = mpsc::channel(16);

        let err = client(&provider)
            .generate_streaming(&request(false), &tx, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(provider.calls(), 1);
        assert_eq!(err.category, ErrorCategory::ServerError);
    }

    #[tokio::test]
    async fn test_stream_without_done_is_network_error() {
        let provider = Arc::new(ScriptedProvider::new(vec![Script::Stream(vec![
            StreamStep::Chunk("half".to_string()),
            StreamStep::End,
        ])]));
        let (tx, _rx) = mpsc::channel(16);

        let err = client(&provider)
            .generate_streaming(&request(false), &tx, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.category, ErrorCategory::Network);
    }
}
