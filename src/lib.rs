//! Codescribe - AI Documentation Generator
//!
//! Generates documentation for a single source file and grades the result.
//!
//! ## Core Features
//!
//! - **Structural Analysis**: tree-sitter extraction with a pattern fallback
//! - **Prompt Templates**: per-doc-type strategies (README, JSDoc, API, Architecture, OpenAPI)
//! - **Provider Abstraction**: Anthropic, OpenAI and Ollama behind one trait,
//!   with retry, per-attempt timeouts and cancellable streaming
//! - **Quality Scoring**: deterministic rubric with letter grades and suggestions
//!
//! ## Quick Start
//!
//! ```ignore
//! use codescribe::{ConfigLoader, DocPipeline, GenerationOptions, GenerationRequest};
//!
//! let config = ConfigLoader::load()?;
//! let pipeline = DocPipeline::from_config(&config)?;
//! let request = GenerationRequest::new(source, "README", "javascript");
//! let result = pipeline.generate(&request, &GenerationOptions::default()).await?;
//! println!("{} ({})", result.quality_score.score, result.quality_score.grade);
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: prompt construction, LLM providers, retry and timeouts
//! - [`analyzer`]: code parsing with tree-sitter, pattern fallback
//! - [`scoring`]: rubric-based quality scoring
//! - [`pipeline`]: request orchestration and the streaming wire protocol
//! - [`config`]: layered configuration

pub mod ai;
pub mod analyzer;
pub mod cli;
pub mod config;
pub mod constants;
pub mod pipeline;
pub mod scoring;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader, ProviderKind};

// Error Types
pub use types::error::{DocError, ErrorCategory, LlmError, Result, ValidationError};

// Domain Types
pub use types::{CodeAnalysis, DocType, Grade, QualityScore};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use pipeline::{
    DocPipeline, GenerationMetadata, GenerationOptions, GenerationOutcome, GenerationRequest,
    GenerationResult, WireEvent,
};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{
    LlmProvider, PromptBuilder, ProviderClient, ProviderMetadata, RetryPolicy, SharedProvider,
    StreamOutcome, create_provider, with_timeout,
};

// =============================================================================
// Analyzer / Scoring Re-exports
// =============================================================================

pub use analyzer::{CodeAnalyzer, parser::Language};
pub use scoring::{QualityScorer, RubricWeights};
