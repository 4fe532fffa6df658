//! Ollama Local LLM Provider
//!
//! LLM provider for locally-running Ollama models via `/api/generate`.
//! Streaming responses are newline-delimited JSON; there is no prompt cache.

use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::sse::body_lines;
use super::{
    ChunkStream, LlmProvider, LlmResponse, StreamEvent, TokenUsage, build_http_client,
    error_from_response,
};
use crate::config::LlmConfig;
use crate::types::{DocError, ErrorCategory, ErrorClassifier, LlmError, PromptRequest, Result};

const PROVIDER: &str = "ollama";
const DEFAULT_API_BASE: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "llama3:latest";

/// Ollama Local LLM Provider
#[derive(Debug)]
pub struct OllamaProvider {
    api_base: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_base = config.api_base.as_deref().unwrap_or(DEFAULT_API_BASE);

        // Validate endpoint URL for security (SSRF prevention)
        let api_base = Self::validate_endpoint(api_base)?;

        Ok(Self {
            api_base,
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: config.temperature,
            client: build_http_client()?,
        })
    }

    /// Validate endpoint URL for security (SSRF prevention)
    ///
    /// Only allows http/https schemes and warns for non-localhost endpoints.
    fn validate_endpoint(endpoint: &str) -> Result<String> {
        let url = url::Url::parse(endpoint).map_err(|e| {
            DocError::Config(format!("Invalid Ollama endpoint URL '{}': {}", endpoint, e))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(DocError::Config(format!(
                "Ollama endpoint must use http or https scheme, got: {}",
                url.scheme()
            )));
        }

        if let Some(host) = url.host_str()
            && !matches!(host, "localhost" | "127.0.0.1" | "[::1]" | "::1")
        {
            warn!(
                "Ollama endpoint is not localhost: {}. Ensure this is intentional.",
                host
            );
        }

        let mut result = url.to_string();
        if result.ends_with('/') {
            result.pop();
        }
        Ok(result)
    }

    fn build_request(&self, request: &PromptRequest, stream: bool) -> OllamaRequest {
        OllamaRequest {
            model: self.model.clone(),
            system: request.system_instructions.clone(),
            prompt: request.user_message(),
            stream,
            options: OllamaOptions {
                temperature: self.temperature,
                num_predict: request.max_output_tokens,
            },
        }
    }

    async fn send(&self, body: &OllamaRequest) -> std::result::Result<reqwest::Response, LlmError> {
        let url = format!("{}/api/generate", self.api_base);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                let connect = e.is_connect();
                let mut err = ErrorClassifier::classify_transport(e, PROVIDER);
                if connect {
                    err.message = format!(
                        "Failed to connect to Ollama at {}. Is Ollama running? Start with: ollama serve",
                        self.api_base
                    );
                }
                err
            })?;

        if !response.status().is_success() {
            return Err(error_from_response(response, PROVIDER).await);
        }
        Ok(response)
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn complete(&self, request: &PromptRequest) -> std::result::Result<LlmResponse, LlmError> {
        info!(
            "Generating with Ollama (model: {}, temperature: {})",
            self.model, self.temperature
        );

        let response = self.send(&self.build_request(request, false)).await?;
        let body: OllamaResponse = response
            .json()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(e, PROVIDER))?;

        if let Some(error) = body.error {
            return Err(ErrorClassifier::classify(&error, PROVIDER));
        }
        if body.response.is_empty() {
            return Err(LlmError::with_provider(
                ErrorCategory::ServerError,
                "Empty response from Ollama",
                PROVIDER,
            ));
        }

        Ok(LlmResponse {
            usage: body.usage(),
            model: body.model.clone().unwrap_or_else(|| self.model.clone()),
            text: body.response,
        })
    }

    async fn stream(&self, request: &PromptRequest) -> std::result::Result<ChunkStream, LlmError> {
        debug!("Opening Ollama stream (model: {})", self.model);
        let response = self.send(&self.build_request(request, true)).await?;

        Ok(Box::pin(try_stream! {
            let mut lines = Box::pin(body_lines(response, PROVIDER));
            while let Some(line) = lines.next().await {
                let line = line?;
                for event in decode_line(&line)? {
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
}

/// One NDJSON line: a fragment, or the final record with token counts
fn decode_line(line: &str) -> std::result::Result<Vec<StreamEvent>, LlmError> {
    let record: OllamaResponse = match serde_json::from_str(line) {
        Ok(record) => record,
        Err(e) => {
            debug!("Skipping unparseable Ollama line: {}", e);
            return Ok(Vec::new());
        }
    };
    if let Some(error) = &record.error {
        return Err(ErrorClassifier::classify(error, PROVIDER));
    }

    let mut events = Vec::new();
    if !record.response.is_empty() {
        events.push(StreamEvent::Delta(record.response.clone()));
    }
    if record.done {
        events.push(StreamEvent::Usage(record.usage()));
        events.push(StreamEvent::Done);
    }
    Ok(events)
}

// Request/Response types

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    system: String,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
    #[serde(default)]
    error: Option<String>,
}

impl OllamaResponse {
    fn usage(&self) -> TokenUsage {
        TokenUsage {
            input_tokens: self.prompt_eval_count.unwrap_or(0),
            output_tokens: self.eval_count.unwrap_or(0),
            cache_read_tokens: None,
            cache_write_tokens: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let provider = OllamaProvider::new(&LlmConfig::default()).expect("Failed to create provider");
        assert_eq!(provider.api_base, DEFAULT_API_BASE);
        assert_eq!(provider.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_validate_endpoint() {
        assert_eq!(
            OllamaProvider::validate_endpoint("http://127.0.0.1:11434/").unwrap(),
            "http://127.0.0.1:11434"
        );
        assert!(OllamaProvider::validate_endpoint("file:///etc/passwd").is_err());
        assert!(OllamaProvider::validate_endpoint("not a url").is_err());
    }

    #[test]
    fn test_decode_ndjson_lines() {
        assert_eq!(
            decode_line(r##"{"model":"llama3","response":"# Tit","done":false}"##).unwrap(),
            vec![StreamEvent::Delta("# Tit".to_string())]
        );
        assert_eq!(
            decode_line(r#"{"response":"","done":true,"prompt_eval_count":30,"eval_count":7}"#).unwrap(),
            vec![
                StreamEvent::Usage(TokenUsage {
                    input_tokens: 30,
                    output_tokens: 7,
                    cache_read_tokens: None,
                    cache_write_tokens: None,
                }),
                StreamEvent::Done,
            ]
        );
        assert!(decode_line(r#"{"error":"model 'x' not found"}"#).is_err());
    }
}
