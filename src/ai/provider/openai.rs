//! OpenAI API Provider
//!
//! LLM provider using OpenAI's Chat Completions API.
//! Prompt caching is automatic on OpenAI's side; the source block is sent
//! first so identical code forms a stable prefix, and cached prompt tokens
//! are reported back through `TokenUsage`.

use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::sse::{body_lines, data_payload};
use super::{
    ChunkStream, LlmProvider, LlmResponse, StreamEvent, TokenUsage, build_http_client,
    error_from_response, normalize_base,
};
use crate::config::LlmConfig;
use crate::types::{DocError, ErrorCategory, ErrorClassifier, LlmError, PromptRequest, Result};

const PROVIDER: &str = "openai";
const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o";

/// OpenAI API Provider with secure API key handling
pub struct OpenAiProvider {
    /// API key stored securely - never exposed in logs or debug output
    api_key: SecretString,
    api_base: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl OpenAiProvider {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key_str = config.resolve_api_key().ok_or_else(|| {
            DocError::Config(
                "OpenAI API key not found. Set OPENAI_API_KEY env var or provide in config"
                    .to_string(),
            )
        })?;

        Ok(Self {
            api_key: SecretString::from(api_key_str),
            api_base: normalize_base(config.api_base.as_deref().unwrap_or(DEFAULT_API_BASE)),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: config.temperature,
            client: build_http_client()?,
        })
    }

    fn build_request(&self, request: &PromptRequest, stream: bool) -> ChatCompletionRequest {
        build_chat_request(&self.model, self.temperature, request, stream)
    }

    async fn send(
        &self,
        body: &ChatCompletionRequest,
    ) -> std::result::Result<reqwest::Response, LlmError> {
        let url = format!("{}/chat/completions", self.api_base);
        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(e, PROVIDER))?;

        if !response.status().is_success() {
            return Err(error_from_response(response, PROVIDER).await);
        }
        Ok(response)
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(&self, request: &PromptRequest) -> std::result::Result<LlmResponse, LlmError> {
        info!(
            "Generating with OpenAI (model: {}, temperature: {})",
            self.model, self.temperature
        );

        let response = self.send(&self.build_request(request, false)).await?;
        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(e, PROVIDER))?;

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                LlmError::with_provider(
                    ErrorCategory::ServerError,
                    "No content in OpenAI response",
                    PROVIDER,
                )
            })?;

        Ok(LlmResponse {
            text,
            usage: body.usage.map(UsageInfo::into_token_usage).unwrap_or_default(),
            model: body.model.unwrap_or_else(|| self.model.clone()),
        })
    }

    async fn stream(&self, request: &PromptRequest) -> std::result::Result<ChunkStream, LlmError> {
        debug!("Opening OpenAI stream (model: {})", self.model);
        let response = self.send(&self.build_request(request, true)).await?;

        Ok(Box::pin(try_stream! {
            let mut lines = Box::pin(body_lines(response, PROVIDER));
            while let Some(line) = lines.next().await {
                let line = line?;
                let Some(data) = data_payload(&line) else {
                    continue;
                };
                for event in decode_chunk(data) {
                    yield event;
                }
            }
        }))
    }

    fn name(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn supports_caching(&self) -> bool {
        true
    }
}

fn build_chat_request(
    model: &str,
    temperature: f32,
    request: &PromptRequest,
    stream: bool,
) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage {
                role: "system",
                content: request.system_instructions.clone(),
            },
            ChatMessage {
                role: "user",
                content: request.user_message(),
            },
        ],
        temperature,
        max_tokens: Some(request.max_output_tokens),
        stream,
        stream_options: stream.then_some(StreamOptions {
            include_usage: true,
        }),
    }
}

/// Map one SSE data payload to stream events. `[DONE]` ends the stream.
fn decode_chunk(data: &str) -> Vec<StreamEvent> {
    if data == "[DONE]" {
        return vec![StreamEvent::Done];
    }
    let chunk: ChatCompletionChunk = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(e) => {
            debug!("Skipping unparseable OpenAI chunk: {}", e);
            return Vec::new();
        }
    };

    let mut events: Vec<StreamEvent> = chunk
        .choices
        .into_iter()
        .filter_map(|c| c.delta.content)
        .filter(|text| !text.is_empty())
        .map(StreamEvent::Delta)
        .collect();
    if let Some(usage) = chunk.usage {
        events.push(StreamEvent::Usage(usage.into_token_usage()));
    }
    events
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream_options: Option<StreamOptions>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct StreamOptions {
    include_usage: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    model: Option<String>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    delta: ChunkDelta,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    prompt_tokens: u32,
    completion_tokens: u32,
    prompt_tokens_details: Option<PromptTokensDetails>,
}

#[derive(Debug, Deserialize)]
struct PromptTokensDetails {
    cached_tokens: Option<u32>,
}

impl UsageInfo {
    fn into_token_usage(self) -> TokenUsage {
        TokenUsage {
            input_tokens: self.prompt_tokens,
            output_tokens: self.completion_tokens,
            cache_read_tokens: self.prompt_tokens_details.and_then(|d| d.cached_tokens),
            cache_write_tokens: None,
        }
    }
}
