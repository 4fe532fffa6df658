//! Documentation Generation Pipeline
//!
//! Sequences analysis, prompt construction, the provider call and scoring:
//!
//! ```text
//! source ─► CodeAnalyzer ─► PromptBuilder ─► ProviderClient ─► QualityScorer ─► GenerationResult
//!                                                  │
//!                                                  └─► chunk sink (streaming)
//! ```
//!
//! Requests share nothing but the provider client's connection pool, so one
//! `DocPipeline` can serve concurrent calls without locking. Scoring only
//! runs on final text: failed and cancelled calls produce no result.

pub mod clock;
pub mod events;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use events::WireEvent;
pub use types::{
    GenerationMetadata, GenerationOptions, GenerationOutcome, GenerationRequest, GenerationResult,
};

use std::sync::Arc;

use futures::Stream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Span, debug, info, instrument, warn};
use uuid::Uuid;

use crate::ai::{PromptBuilder, ProviderClient, ProviderResult, StreamOutcome};
use crate::analyzer::CodeAnalyzer;
use crate::config::Config;
use crate::scoring::QualityScorer;
use crate::types::{CodeAnalysis, DocError, DocType, PromptRequest, Result};

/// Chunk buffer between a streaming run and its transport
const EVENT_BUFFER: usize = 64;

/// Everything derived from a request before the provider is called
struct Prepared {
    request_id: Uuid,
    doc_type: DocType,
    analysis: CodeAnalysis,
    prompt: PromptRequest,
}

/// Documentation generation orchestrator
pub struct DocPipeline {
    analyzer: CodeAnalyzer,
    prompts: PromptBuilder,
    client: ProviderClient,
    scorer: QualityScorer,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for DocPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocPipeline")
            .field("prompts", &self.prompts)
            .field("client", &self.client)
            .field("scorer", &self.scorer)
            .finish()
    }
}

impl DocPipeline {
    pub fn new(client: ProviderClient, prompts: PromptBuilder, scorer: QualityScorer) -> Self {
        Self {
            analyzer: CodeAnalyzer::new(),
            prompts,
            client,
            scorer,
            clock: Arc::new(SystemClock),
        }
    }

    /// Build the provider, prompt limits and rubric from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = ProviderClient::from_config(config)?;
        let scorer = QualityScorer::with_weights(config.scoring.weight_overrides()?);
        Ok(Self::new(client, PromptBuilder::from_config(config), scorer))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn client(&self) -> &ProviderClient {
        &self.client
    }

    pub fn scorer(&self) -> &QualityScorer {
        &self.scorer
    }

    /// Single-shot generation
    #[instrument(
        skip_all,
        fields(
            doc_type = %request.doc_type,
            language = %request.language,
            code_length = request.code_length(),
            provider = %self.client.provider_name(),
            request_id = tracing::field::Empty,
        )
    )]
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        options: &GenerationOptions,
    ) -> Result<GenerationResult> {
        let prepared = self.prepare(request, options)?;
        info!("Generating documentation");

        let output = self.client.generate(&prepared.prompt).await.map_err(|e| {
            warn!(category = %e.category, attempts = e.attempts, "Generation failed");
            DocError::from(e)
        })?;

        Ok(self.assemble(prepared, output, request))
    }

    /// Streaming generation. Fragments go to `sink` as they arrive; the
    /// returned result's documentation is their concatenation.
    ///
    /// The sink is dropped when the call returns, which closes the
    /// receiver's stream.
    #[instrument(
        skip_all,
        fields(
            doc_type = %request.doc_type,
            language = %request.language,
            code_length = request.code_length(),
            provider = %self.client.provider_name(),
            request_id = tracing::field::Empty,
        )
    )]
    pub async fn generate_streaming(
        &self,
        request: &GenerationRequest,
        options: &GenerationOptions,
        sink: mpsc::Sender<String>,
        cancel: &CancellationToken,
    ) -> Result<GenerationOutcome> {
        let prepared = self.prepare(request, options)?;
        info!("Streaming documentation");

        let outcome = self
            .client
            .generate_streaming(&prepared.prompt, &sink, cancel)
            .await
            .map_err(|e| {
                warn!(category = %e.category, attempts = e.attempts, "Streaming generation failed");
                DocError::from(e)
            })?;
        drop(sink);

        match outcome {
            StreamOutcome::Completed(output) => Ok(GenerationOutcome::Completed(Box::new(
                self.assemble(prepared, output, request),
            ))),
            StreamOutcome::Cancelled => {
                info!("Generation cancelled, skipping scoring");
                Ok(GenerationOutcome::Cancelled)
            }
        }
    }

    /// Run a streaming generation as a stream of wire events: chunks, then
    /// one terminal event. Dropping the stream cancels the run.
    pub fn event_stream(
        self: Arc<Self>,
        request: GenerationRequest,
        options: GenerationOptions,
        cancel: CancellationToken,
    ) -> impl Stream<Item = WireEvent> + Send + 'static {
        let (tx, mut rx) = mpsc::channel::<String>(EVENT_BUFFER);
        let run_cancel = cancel.child_token();
        let task_cancel = run_cancel.clone();
        let handle = tokio::spawn(async move {
            self.generate_streaming(&request, &options, tx, &task_cancel)
                .await
        });

        async_stream::stream! {
            let _guard = run_cancel.drop_guard();
            while let Some(content) = rx.recv().await {
                yield WireEvent::Chunk { content };
            }
            match handle.await {
                Ok(Ok(GenerationOutcome::Completed(result))) => yield WireEvent::complete(*result),
                Ok(Ok(GenerationOutcome::Cancelled)) => yield WireEvent::Cancelled,
                Ok(Err(err)) => yield WireEvent::error(&err),
                Err(join_err) => {
                    warn!("Generation task failed: {}", join_err);
                    yield WireEvent::Error {
                        kind: "INTERNAL_ERROR".to_string(),
                        message: "Generation task failed".to_string(),
                        status: 500,
                        retry_after_ms: None,
                    };
                }
            }
        }
    }

    /// Validate, analyze and build the prompt. Fails only on bad input.
    fn prepare(&self, request: &GenerationRequest, options: &GenerationOptions) -> Result<Prepared> {
        let request_id = Uuid::new_v4();
        Span::current().record("request_id", tracing::field::display(&request_id));

        let doc_type: DocType = request.doc_type.parse()?;
        self.prompts.validate_source(&request.source)?;

        let analysis = self.analyzer.analyze(&request.source, &request.language);
        debug!(
            mode = analysis.parse_mode.label(),
            summary = %analysis.summary_line(),
            "Analysis complete"
        );

        let caching_hint = options.is_sample && self.client.supports_caching();
        if options.is_sample && !caching_hint {
            debug!("Provider has no prompt cache, sending sample uncached");
        }

        let prompt = self.prompts.build(
            &request.source,
            &analysis,
            doc_type,
            &request.language,
            caching_hint,
        )?;

        Ok(Prepared {
            request_id,
            doc_type,
            analysis,
            prompt,
        })
    }

    fn assemble(
        &self,
        prepared: Prepared,
        output: ProviderResult,
        request: &GenerationRequest,
    ) -> GenerationResult {
        let quality_score = self
            .scorer
            .score(&output.text, &prepared.analysis, prepared.doc_type);
        info!(
            score = quality_score.score,
            grade = %quality_score.grade,
            latency_ms = output.metadata.latency_ms,
            "Documentation generated"
        );

        GenerationResult {
            documentation: output.text,
            quality_score,
            analysis: prepared.analysis,
            metadata: GenerationMetadata {
                provider: output.metadata,
                doc_type: prepared.doc_type,
                generated_at: self.clock.now(),
                code_length: request.code_length(),
                request_id: prepared.request_id,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::RetryPolicy;
    use crate::ai::provider::mock::{Script, ScriptedProvider, StreamStep};
    use crate::scoring::fixtures::ADD_README;
    use crate::types::{Criterion, CriterionStatus, ErrorCategory, Grade, ValidationErrorKind};
    use chrono::{TimeZone, Utc};
    use futures::StreamExt;
    use std::time::Duration;

    const ADD_SOURCE: &str = "function add(a,b){return a+b}";

    fn pipeline(provider: &Arc<ScriptedProvider>) -> DocPipeline {
        let retry = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            jitter: false,
        };
        let client = ProviderClient::new(provider.clone(), retry, Duration::from_secs(5));
        let fixed = Utc.with_ymd_and_hms(2026, 1, 15, 9, 30, 0).unwrap();
        DocPipeline::new(client, PromptBuilder::default(), QualityScorer::new())
            .with_clock(Arc::new(FixedClock(fixed)))
    }

    fn add_request() -> GenerationRequest {
        GenerationRequest::new(ADD_SOURCE, "README", "javascript")
    }

    #[tokio::test]
    async fn test_end_to_end_readme() {
        let provider = Arc::new(ScriptedProvider::new(vec![Script::text(ADD_README)]));
        let result = pipeline(&provider)
            .generate(&add_request(), &GenerationOptions::default())
            .await
            .unwrap();

        assert_eq!(result.analysis.functions.len(), 1);
        assert_eq!(result.analysis.functions[0].name, "add");
        assert_eq!(result.analysis.functions[0].parameters.len(), 2);

        assert!(result.quality_score.grade <= Grade::B);
        let examples = result.quality_score.criterion(Criterion::Examples).unwrap();
        assert_eq!(examples.status, CriterionStatus::Partial);
        let api = result.quality_score.criterion(Criterion::ApiDocs).unwrap();
        assert_eq!(api.status, CriterionStatus::Complete);
        assert_eq!(
            result.quality_score.score,
            result.quality_score.earned_total()
        );

        assert_eq!(result.documentation, ADD_README);
        assert_eq!(result.metadata.doc_type, DocType::Readme);
        assert_eq!(result.metadata.code_length, 29);
        assert_eq!(result.metadata.provider.provider, "scripted");
        assert_eq!(
            result.metadata.generated_at,
            Utc.with_ymd_and_hms(2026, 1, 15, 9, 30, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_result_serializes_with_wire_names() {
        let provider = Arc::new(ScriptedProvider::new(vec![Script::text(ADD_README)]));
        let result = pipeline(&provider)
            .generate(&add_request(), &GenerationOptions::default())
            .await
            .unwrap();

        let json = serde_json::to_value(&result).unwrap();
        assert!(json["qualityScore"]["breakdown"]["apiDocs"].is_object());
        assert_eq!(json["analysis"]["functions"][0]["name"], "add");
        assert_eq!(json["metadata"]["docType"], "README");
        assert_eq!(json["metadata"]["provider"], "scripted");
        assert_eq!(json["metadata"]["codeLength"], 29);
        assert!(json["metadata"]["latencyMs"].is_u64());
        assert_eq!(json["metadata"]["generatedAt"], "2026-01-15T09:30:00Z");
    }

    #[tokio::test]
    async fn test_streaming_concatenation() {
        let provider = Arc::new(ScriptedProvider::new(vec![Script::chunks(&[
            "# Tit", "le\n", "Body",
        ])]));
        let (tx, mut rx) = mpsc::channel(16);

        let outcome = pipeline(&provider)
            .generate_streaming(
                &add_request(),
                &GenerationOptions::default(),
                tx,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let mut chunks = Vec::new();
        while let Some(chunk) = rx.recv().await {
            chunks.push(chunk);
        }
        assert_eq!(chunks, vec!["# Tit", "le\n", "Body"]);

        let result = outcome.into_result().unwrap();
        assert_eq!(result.documentation, "# Title\nBody");
    }

    #[tokio::test]
    async fn test_cancel_after_two_of_five_chunks() {
        let steps = ["one", "two", "three", "four", "five"]
            .iter()
            .flat_map(|c| {
                [
                    StreamStep::Chunk(c.to_string()),
                    StreamStep::Delay(Duration::from_millis(30)),
                ]
            })
            .collect();
        let provider = Arc::new(ScriptedProvider::new(vec![Script::Stream(steps)]));
        let pipeline = pipeline(&provider);
        let (tx, mut rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();

        let consumer = async {
            let mut received = Vec::new();
            while let Some(chunk) = rx.recv().await {
                received.push(chunk);
                if received.len() == 2 {
                    cancel.cancel();
                }
            }
            received
        };
        let request = add_request();
        let options = GenerationOptions::default();
        let (outcome, received) = tokio::join!(
            pipeline.generate_streaming(&request, &options, tx, &cancel),
            consumer
        );

        assert!(matches!(outcome.unwrap(), GenerationOutcome::Cancelled));
        assert_eq!(received, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_unknown_doc_type_rejected_before_provider() {
        let provider = Arc::new(ScriptedProvider::new(vec![Script::text("unused")]));
        let request = GenerationRequest::new(ADD_SOURCE, "CHANGELOG", "javascript");
        let err = pipeline(&provider)
            .generate(&request, &GenerationOptions::default())
            .await
            .unwrap_err();

        let DocError::Validation(err) = err else {
            panic!("expected validation error");
        };
        assert_eq!(err.kind, ValidationErrorKind::UnknownDocType);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_source_rejected_before_provider() {
        let provider = Arc::new(ScriptedProvider::new(vec![Script::text("unused")]));
        let request = GenerationRequest::new("   ", "README", "javascript");
        let err = pipeline(&provider)
            .generate(&request, &GenerationOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.http_status(), 400);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_provider_error_propagates_classified() {
        let provider = Arc::new(ScriptedProvider::new(vec![Script::error(ErrorCategory::Auth)]));
        let err = pipeline(&provider)
            .generate(&add_request(), &GenerationOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "AUTH");
        assert_eq!(err.http_status(), 401);
        assert_eq!(err.as_provider_error().unwrap().attempts, 1);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_sample_requests_report_caching() {
        let provider =
            Arc::new(ScriptedProvider::new(vec![Script::text(ADD_README)]).with_caching());
        let options = GenerationOptions { is_sample: true };
        let result = pipeline(&provider)
            .generate(&add_request(), &options)
            .await
            .unwrap();
        assert!(result.metadata.provider.was_cached);
        assert!(provider.saw_caching_hint());
    }

    #[tokio::test]
    async fn test_sample_hint_dropped_without_provider_cache() {
        let provider = Arc::new(ScriptedProvider::new(vec![Script::text(ADD_README)]));
        let options = GenerationOptions { is_sample: true };
        let result = pipeline(&provider)
            .generate(&add_request(), &options)
            .await
            .unwrap();
        assert!(!provider.saw_caching_hint());
        assert!(!result.metadata.provider.was_cached);
    }

    #[tokio::test]
    async fn test_event_stream_emits_chunks_then_complete() {
        let provider = Arc::new(ScriptedProvider::new(vec![Script::chunks(&[
            "# calc\n", "Body",
        ])]));
        let pipeline = Arc::new(pipeline(&provider));
        let events: Vec<WireEvent> = pipeline
            .event_stream(add_request(), GenerationOptions::default(), CancellationToken::new())
            .collect()
            .await;

        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            WireEvent::Chunk {
                content: "# calc\n".to_string()
            }
        );
        assert!(matches!(events[2], WireEvent::Complete { .. }));
    }

    #[tokio::test]
    async fn test_event_stream_ends_with_error() {
        let provider = Arc::new(ScriptedProvider::new(vec![Script::FailOpen(
            crate::types::LlmError::new(ErrorCategory::Validation, "prompt too long"),
        )]));
        let pipeline = Arc::new(pipeline(&provider));
        let events: Vec<WireEvent> = pipeline
            .event_stream(add_request(), GenerationOptions::default(), CancellationToken::new())
            .collect()
            .await;

        assert_eq!(events.len(), 1);
        let WireEvent::Error { kind, status, .. } = &events[0] else {
            panic!("expected error event");
        };
        assert_eq!(kind, "VALIDATION");
        assert_eq!(*status, 400);
    }
}
