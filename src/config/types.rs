//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/codescribe/) and project (.codescribe/) level configuration.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::constants::{network, prompt, retry};
use crate::scoring::RubricWeights;
use crate::types::{DocError, DocType, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// LLM provider settings
    pub llm: LlmConfig,

    /// Retry/backoff settings for provider calls
    pub retry: RetryConfig,

    /// Prompt size limits
    pub prompt: PromptConfig,

    /// Rubric weight overrides
    pub scoring: ScoringConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            llm: LlmConfig::default(),
            retry: RetryConfig::default(),
            prompt: PromptConfig::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `DocError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(DocError::Config(format!(
                "LLM temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(DocError::Config(
                "LLM timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.llm.max_tokens == 0 {
            return Err(DocError::Config(
                "LLM max_tokens must be greater than 0".to_string(),
            ));
        }

        if let Some(base) = &self.llm.api_base {
            validate_api_base(base)?;
        }

        if !(1..=10).contains(&self.retry.max_attempts) {
            return Err(DocError::Config(format!(
                "Retry max_attempts must be between 1 and 10, got {}",
                self.retry.max_attempts
            )));
        }

        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(DocError::Config(format!(
                "Retry base_delay_ms ({}) exceeds max_delay_ms ({})",
                self.retry.base_delay_ms, self.retry.max_delay_ms
            )));
        }

        if self.prompt.max_code_chars == 0 || self.prompt.max_code_chars > self.prompt.max_input_chars
        {
            return Err(DocError::Config(format!(
                "Prompt max_code_chars must be in 1..={}, got {}",
                self.prompt.max_input_chars, self.prompt.max_code_chars
            )));
        }

        self.scoring.weight_overrides()?;

        Ok(())
    }
}

/// Only http(s) endpoints with a host are accepted
fn validate_api_base(base: &str) -> Result<()> {
    let url = url::Url::parse(base)
        .map_err(|e| DocError::Config(format!("Invalid api_base '{}': {}", base, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(DocError::Config(format!(
            "api_base must use http or https, got '{}'",
            url.scheme()
        )));
    }
    if url.host_str().is_none() {
        return Err(DocError::Config(format!("api_base '{}' has no host", base)));
    }
    Ok(())
}

// =============================================================================
// LLM Configuration
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Anthropic,
    #[serde(rename = "openai")]
    OpenAi,
    Ollama,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Ollama => "ollama",
        }
    }

    /// Environment variable consulted when no key is configured
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            ProviderKind::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderKind::OpenAi => Some("OPENAI_API_KEY"),
            ProviderKind::Ollama => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            "openai" => Ok(ProviderKind::OpenAi),
            "ollama" => Ok(ProviderKind::Ollama),
            _ => Err(format!(
                "Unknown provider: {}. Valid values: anthropic, openai, ollama",
                s
            )),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name
    pub provider: ProviderKind,

    /// Model name (provider default when unset)
    pub model: Option<String>,

    /// API key; falls back to the provider's environment variable.
    /// Never written back out.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Override for the provider endpoint
    pub api_base: Option<String>,

    /// Per-attempt request timeout in seconds
    pub timeout_secs: u64,

    /// Temperature for LLM generation (0.0 = deterministic)
    pub temperature: f32,

    /// Output token budget
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: None,
            api_key: None,
            api_base: None,
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            temperature: 0.3,
            max_tokens: prompt::DEFAULT_MAX_TOKENS,
        }
    }
}

impl LlmConfig {
    /// Configured key, else the provider's environment variable
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| {
                self.provider
                    .api_key_env()
                    .and_then(|var| std::env::var(var).ok())
                    .filter(|k| !k.trim().is_empty())
            })
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

// =============================================================================
// Retry Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first
    pub max_attempts: u32,

    /// Base delay for exponential backoff (ms)
    pub base_delay_ms: u64,

    /// Cap for a single delay (ms)
    pub max_delay_ms: u64,

    /// Add up to 25% random jitter to each delay
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: retry::DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: retry::BASE_DELAY_MS,
            max_delay_ms: retry::MAX_DELAY_MS,
            jitter: false,
        }
    }
}

// =============================================================================
// Prompt Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Source characters kept in the prompt before truncation
    pub max_code_chars: usize,

    /// Source characters accepted at all
    pub max_input_chars: usize,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            max_code_chars: prompt::MAX_CODE_CHARS,
            max_input_chars: prompt::MAX_INPUT_CHARS,
        }
    }
}

// =============================================================================
// Scoring Configuration
// =============================================================================

/// Per-doc-type rubric weights, keyed by doc type name:
///
/// ```toml
/// [scoring.weights.README]
/// overview = 25
/// installation = 10
/// examples = 20
/// api_docs = 25
/// structure = 20
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: BTreeMap<String, RubricWeights>,
}

impl ScoringConfig {
    /// Parsed overrides; every entry must name a doc type and total 100
    pub fn weight_overrides(&self) -> Result<HashMap<DocType, RubricWeights>> {
        let mut overrides = HashMap::new();
        for (name, weights) in &self.weights {
            let doc_type = DocType::from_str(name)
                .map_err(|e| DocError::Config(format!("scoring.weights: {}", e)))?;
            let total = weights.total();
            if total != 100 {
                return Err(DocError::Config(format!(
                    "scoring.weights.{} must sum to 100, got {}",
                    name, total
                )));
            }
            overrides.insert(doc_type, *weights);
        }
        Ok(overrides)
    }
}

// =============================================================================
// Tests
// =============================================================================
