//! Anthropic Messages API Provider
//!
//! Single-shot and SSE streaming generation. When the request carries a
//! caching hint, the system block and the source block are marked
//! `cache_control: ephemeral` so repeated runs over the same code reuse the
//! provider-side prompt cache.

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
use crate::types::{
    DocError, ErrorCategory, ErrorClassifier, LlmError, PromptRequest, Result,
};

const PROVIDER: &str = "anthropic";
const DEFAULT_API_BASE: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const API_VERSION: &str = "2023-06-01";

/// Anthropic provider with secure API key handling
pub struct AnthropicProvider {
    /// API key stored securely - never exposed in logs or debug output
    api_key: SecretString,
    api_base: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl AnthropicProvider {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            DocError::Config(
                "Anthropic API key not found. Set ANTHROPIC_API_KEY env var or provide in config"
                    .to_string(),
            )
        })?;

        Ok(Self {
            api_key: SecretString::from(api_key),
            api_base: normalize_base(config.api_base.as_deref().unwrap_or(DEFAULT_API_BASE)),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: config.temperature,
            client: build_http_client()?,
        })
    }

    fn build_request(&self, request: &PromptRequest, stream: bool) -> MessagesRequest {
        build_messages_request(&self.model, self.temperature, request, stream)
    }

    async fn send(&self, body: &MessagesRequest) -> std::result::Result<reqwest::Response, LlmError> {
        let url = format!("{}/v1/messages", self.api_base);
        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
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
impl LlmProvider for AnthropicProvider {
    async fn complete(&self, request: &PromptRequest) -> std::result::Result<LlmResponse, LlmError> {
        info!(
            "Generating with Anthropic (model: {}, cached: {})",
            self.model, request.caching_hint
        );

        let response = self.send(&self.build_request(request, false)).await?;
        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(e, PROVIDER))?;

        let text: String = body
            .content
            .iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text.as_deref())
            .collect();
        if text.is_empty() {
            return Err(LlmError::with_provider(
                ErrorCategory::ServerError,
                "No text content in Anthropic response",
                PROVIDER,
            ));
        }

        Ok(LlmResponse {
            text,
            usage: body.usage.map(Usage::into_token_usage).unwrap_or_default(),
            model: body.model.unwrap_or_else(|| self.model.clone()),
        })
    }

    async fn stream(&self, request: &PromptRequest) -> std::result::Result<ChunkStream, LlmError> {
        debug!("Opening Anthropic stream (model: {})", self.model);
        let response = self.send(&self.build_request(request, true)).await?;

        Ok(Box::pin(try_stream! {
            let mut lines = Box::pin(body_lines(response, PROVIDER));
            while let Some(line) = lines.next().await {
                let line = line?;
                let Some(data) = data_payload(&line) else {
                    continue;
                };
                for event in decode_event(data)? {
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

fn build_messages_request(
    model: &str,
    temperature: f32,
    request: &PromptRequest,
    stream: bool,
) -> MessagesRequest {
    let cache = || {
        request.caching_hint.then(|| CacheControl {
            cache_type: "ephemeral",
        })
    };

    let mut content = Vec::new();
    if !request.code_segment.is_empty() {
        content.push(TextBlock::new(request.code_segment.clone(), cache()));
    }
    content.push(TextBlock::new(request.user_content.clone(), None));

    MessagesRequest {
        model: model.to_string(),
        max_tokens: request.max_output_tokens,
        temperature,
        system: vec![TextBlock::new(request.system_instructions.clone(), cache())],
        messages: vec![Message {
            role: "user",
            content,
        }],
        stream,
    }
}

/// Map one SSE data payload to stream events
fn decode_event(data: &str) -> std::result::Result<Vec<StreamEvent>, LlmError> {
    let event: StreamPayload = match serde_json::from_str(data) {
        Ok(event) => event,
        Err(e) => {
            debug!("Skipping unparseable Anthropic event: {}", e);
            return Ok(Vec::new());
        }
    };

    let events = match event.event_type.as_str() {
        "message_start" => event
            .message
            .and_then(|m| m.usage)
            .map(|u| vec![StreamEvent::Usage(u.into_token_usage())])
            .unwrap_or_default(),
        "content_block_delta" => event
            .delta
            .filter(|d| d.delta_type.as_deref() == Some("text_delta"))
            .and_then(|d| d.text)
            .map(|text| vec![StreamEvent::Delta(text)])
            .unwrap_or_default(),
        "message_delta" => event
            .usage
            .map(|u| vec![StreamEvent::Usage(u.into_token_usage())])
            .unwrap_or_default(),
        "message_stop" => vec![StreamEvent::Done],
        "error" => {
            let detail = event.error.unwrap_or_default();
            let category = match detail.error_type.as_str() {
                "overloaded_error" | "api_error" => ErrorCategory::ServerError,
                "rate_limit_error" => ErrorCategory::RateLimit,
                "authentication_error" | "permission_error" => ErrorCategory::Auth,
                "invalid_request_error" => ErrorCategory::Validation,
                _ => ErrorCategory::Unknown,
            };
            return Err(LlmError::with_provider(category, detail.message, PROVIDER));
        }
        _ => Vec::new(),
    };
    Ok(events)
}

// Request/Response types

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    system: Vec<TextBlock>,
    messages: Vec<Message>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: Vec<TextBlock>,
}

#[derive(Debug, Serialize)]
struct TextBlock {
    #[serde(rename = "type")]
    block_type: &'static str,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache_control: Option<CacheControl>,
}

impl TextBlock {
    fn new(text: String, cache_control: Option<CacheControl>) -> Self {
        Self {
            block_type: "text",
            text,
            cache_control,
        }
    }
}

#[derive(Debug, Serialize)]
struct CacheControl {
    #[serde(rename = "type")]
    cache_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    model: Option<String>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
    cache_read_input_tokens: Option<u32>,
    cache_creation_input_tokens: Option<u32>,
}

impl Usage {
    fn into_token_usage(self) -> TokenUsage {
        TokenUsage {
            input_tokens: self.input_tokens,
            output_tokens: self.output_tokens,
            cache_read_tokens: self.cache_read_input_tokens,
            cache_write_tokens: self.cache_creation_input_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StreamPayload {
    #[serde(rename = "type")]
    event_type: String,
    message: Option<StreamMessage>,
    delta: Option<StreamDelta>,
    usage: Option<Usage>,
    error: Option<StreamErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct StreamMessage {
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(rename = "type")]
    delta_type: Option<String>,
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StreamErrorDetail {
    #[serde(rename = "type", default)]
    error_type: String,
    #[serde(default)]
    message: String,
}
