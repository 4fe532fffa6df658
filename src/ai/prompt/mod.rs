//! Prompt Builder
//!
//! Turns source, analysis and a doc type into a provider-neutral
//! `PromptRequest`:
//! - system instructions from the doc type's strategy (`templates`)
//! - the analysis summary and task in the user content
//! - the source, truncated with a marker, as a separately cacheable segment
//!
//! Empty and oversized sources are rejected here, before any network call.

mod sections;
mod templates;

pub use sections::{PromptSection, SectionWriter};
pub use templates::PromptTemplates;

use tracing::debug;

use crate::analyzer::parser::Language;
use crate::config::{Config, PromptConfig};
use crate::constants::prompt as prompt_constants;
use crate::types::{
    CodeAnalysis, DocType, ParseMode, PromptRequest, Result, ValidationError, ValidationErrorKind,
};

/// Builds generation requests; holds only limits, so one instance serves
/// every request.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    max_code_chars: usize,
    max_input_chars: usize,
    max_output_tokens: u32,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(&PromptConfig::default(), prompt_constants::DEFAULT_MAX_TOKENS)
    }
}

impl PromptBuilder {
    pub fn new(config: &PromptConfig, max_output_tokens: u32) -> Self {
        Self {
            max_code_chars: config.max_code_chars,
            max_input_chars: config.max_input_chars,
            max_output_tokens,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.prompt, config.llm.max_tokens)
    }

    /// Reject sources that can never produce a request
    pub fn validate_source(&self, source: &str) -> Result<()> {
        if source.trim().is_empty() {
            return Err(ValidationError::new(
                ValidationErrorKind::EmptySource,
                "Source code is empty",
            )
            .with_field("code")
            .into());
        }

        let chars = source.chars().count();
        if chars > self.max_input_chars {
            return Err(ValidationError::new(
                ValidationErrorKind::OversizedSource,
                format!(
                    "Source code is {} characters; the limit is {}",
                    chars, self.max_input_chars
                ),
            )
            .with_field("code")
            .into());
        }
        Ok(())
    }

    /// Build the request for one generation call.
    ///
    /// `caching_hint` marks the source as a known static payload; providers
    /// without prompt caching ignore it.
    pub fn build(
        &self,
        source: &str,
        analysis: &CodeAnalysis,
        doc_type: DocType,
        language: &str,
        caching_hint: bool,
    ) -> Result<PromptRequest> {
        self.validate_source(source)?;

        let (code, truncated) = truncate_source(source, self.max_code_chars);
        if truncated {
            debug!(
                limit = self.max_code_chars,
                "Source truncated for prompt"
            );
        }

        let fence = fence_language(language);
        let code_segment = format!("# Source Code\n\n```{}\n{}\n```", fence, code);

        let mut task = PromptTemplates::task(doc_type, display_language(language));
        let names = analysis.documentable_names();
        if !names.is_empty() {
            task.push_str(&format!(
                " Cover all {} functions and classes listed in the analysis.",
                names.len()
            ));
        }
        if truncated {
            task.push_str(&format!(
                " The source was truncated to its first {} characters; document only what is shown.",
                self.max_code_chars
            ));
        }

        let user_content = SectionWriter::new()
            .text(&analysis_summary(analysis, language))
            .section("Task", task)
            .build();

        Ok(PromptRequest {
            system_instructions: PromptTemplates::system_instructions(doc_type),
            user_content,
            code_segment,
            doc_type,
            caching_hint,
            max_output_tokens: self.max_output_tokens,
        })
    }
}

/// Cut `source` to `max_chars` characters on a char boundary, appending the
/// truncation marker when anything was dropped
fn truncate_source(source: &str, max_chars: usize) -> (String, bool) {
    match source.char_indices().nth(max_chars) {
        Some((cut, _)) => (
            format!(
                "{}\n{}",
                source[..cut].trim_end(),
                prompt_constants::TRUNCATION_MARKER
            ),
            true,
        ),
        None => (source.to_string(), false),
    }
}

/// Analysis facts rendered as a context section
fn analysis_summary(analysis: &CodeAnalysis, language: &str) -> String {
    let functions = list_or_none(analysis.functions.iter().map(|f| {
        let prefix = if f.is_async { "async " } else { "" };
        format!("{}{}({})", prefix, f.name, f.parameters.join(", "))
    }));
    let classes = list_or_none(
        analysis
            .classes
            .iter()
            .map(|c| format!("{} ({} methods)", c.name, c.method_count)),
    );
    let exports = list_or_none(analysis.exports.iter().cloned());

    let mode = match &analysis.parse_mode {
        ParseMode::Structural { branch_count, .. } => {
            format!("structural ({} branches)", branch_count)
        }
        ParseMode::Fallback { line_count, .. } => {
            format!("pattern-based, approximate ({} lines)", line_count)
        }
    };

    SectionWriter::new()
        .section("Code Analysis", analysis.summary_line())
        .context_item("Language", display_language(language))
        .context_item("Analysis", mode)
        .context_item("Complexity", analysis.complexity.to_string())
        .context_item("Functions", functions)
        .context_item("Classes", classes)
        .context_item("Exports", exports)
        .build()
}

fn list_or_none(items: impl Iterator<Item = String>) -> String {
    let limit = prompt_constants::MAX_LISTED_SYMBOLS;
    let items: Vec<String> = items.collect();
    if items.is_empty() {
        return "none detected".to_string();
    }
    if items.len() > limit {
        return format!(
            "{}, and {} more",
            items[..limit].join(", "),
            items.len() - limit
        );
    }
    items.join(", ")
}

fn display_language(language: &str) -> &str {
    let trimmed = language.trim();
    if trimmed.is_empty() { "source" } else { trimmed }
}

/// Code fence tag for the declared language
fn fence_language(language: &str) -> String {
    match Language::from_name(language) {
        Language::Unknown => {
            let tag: String = language
                .trim()
                .to_lowercase()
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '#' | '-'))
                .collect();
            if tag.is_empty() { "text".to_string() } else { tag }
        }
        known => known.as_str().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::CodeAnalyzer;
    use crate::types::DocError;

    const SOURCE: &str = "function add(a,b){return a+b}";

    fn analysis() -> CodeAnalysis {
        CodeAnalyzer::new().analyze(SOURCE, "javascript")
    }

    #[test]
    fn test_build_readme_request() {
        let request = PromptBuilder::default()
            .build(SOURCE, &analysis(), DocType::Readme, "javascript", false)
            .unwrap();

        assert_eq!(request.doc_type, DocType::Readme);
        assert!(!request.caching_hint);
        assert!(request.code_segment.contains("```javascript\nfunction add(a,b){return a+b}\n```"));
        assert!(request.user_content.contains("**Functions**: add(a, b)"));
        assert!(request.user_content.contains("**Classes**: none detected"));
        assert!(request.user_content.contains("README.md"));
        assert!(request.system_instructions.contains("## API Reference"));
        assert_eq!(request.max_output_tokens, prompt_constants::DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn test_caching_hint_passed_through() {
        let request = PromptBuilder::default()
            .build(SOURCE, &analysis(), DocType::Api, "javascript", true)
            .unwrap();
        assert!(request.caching_hint);
    }

    #[test]
    fn test_empty_source_rejected() {
        let err = PromptBuilder::default()
            .build("  \n\t", &analysis(), DocType::Readme, "javascript", false)
            .unwrap_err();
        let DocError::Validation(err) = err else {
            panic!("expected validation error");
        };
        assert_eq!(err.kind, ValidationErrorKind::EmptySource);
    }

    #[test]
    fn test_oversized_source_rejected() {
        let builder = PromptBuilder::new(
            &PromptConfig {
                max_code_chars: 10,
                max_input_chars: 20,
            },
            1024,
        );
        let err = builder.validate_source(&"x".repeat(21)).unwrap_err();
        assert_eq!(err.kind(), "VALIDATION_ERROR");
        assert!(builder.validate_source(&"x".repeat(20)).is_ok());
    }

    #[test]
    fn test_truncation_marker() {
        let builder = PromptBuilder::new(
            &PromptConfig {
                max_code_chars: 10,
                max_input_chars: 1000,
            },
            1024,
        );
        let source = "const a = 1;\nconst b = 2;\n";
        let request = builder
            .build(source, &analysis(), DocType::Readme, "javascript", false)
            .unwrap();

        assert!(request.code_segment.contains("const a =\n// ... [truncated]\n```"));
        assert!(request.user_content.contains("truncated to its first 10 characters"));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let (cut, truncated) = truncate_source("héllo wörld", 7);
        assert!(truncated);
        assert!(cut.starts_with("héllo w"));
        assert!(cut.ends_with(prompt_constants::TRUNCATION_MARKER));

        let (whole, truncated) = truncate_source("héllo", 5);
        assert!(!truncated);
        assert_eq!(whole, "héllo");
    }

    #[test]
    fn test_fence_language() {
        assert_eq!(fence_language("JS"), "javascript");
        assert_eq!(fence_language("golang"), "go");
        assert_eq!(fence_language("COBOL"), "cobol");
        assert_eq!(fence_language(""), "text");
    }

    #[test]
    fn test_symbol_list_is_capped() {
        let names = (0..prompt_constants::MAX_LISTED_SYMBOLS + 3).map(|i| format!("f{}", i));
        assert!(list_or_none(names).ends_with(", and 3 more"));
    }
}
