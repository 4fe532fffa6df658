//! AI Integration Layer
//!
//! Prompt construction and LLM provider access for documentation generation.

pub mod prompt;
pub mod provider;
pub mod timeout;

pub use prompt::{PromptBuilder, PromptSection, PromptTemplates, SectionWriter};
pub use provider::{
    AnthropicProvider, ChunkStream, LlmProvider, LlmResponse, OllamaProvider, OpenAiProvider,
    ProviderClient, ProviderMetadata, ProviderResult, RetryPolicy, SharedProvider, StreamEvent,
    StreamOutcome, TokenUsage, create_provider,
};
pub use timeout::{with_timeout, with_timeout_map};
