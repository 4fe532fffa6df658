//! Code Analyzer Module
//!
//! Turns a source string into a `CodeAnalysis`:
//! - Structural extraction via tree-sitter for supported languages
//! - Pattern heuristics (`fallback`) for everything else, or when parsing fails

pub mod fallback;
pub mod parser;

use tracing::{debug, warn};

use crate::types::{CodeAnalysis, Complexity, FallbackReason, ParseMode};
use parser::{Language, create_parser};

/// Stateless analyzer; safe to share across concurrent requests.
#[derive(Debug, Default, Clone, Copy)]
pub struct CodeAnalyzer;

impl CodeAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Analyze `source` declared as `language`. Never fails: parse problems
    /// degrade to a fallback-mode result.
    pub fn analyze(&self, source: &str, language: &str) -> CodeAnalysis {
        let resolved = Language::from_name(language);

        let Some(parser) = create_parser(resolved) else {
            debug!(language, "No structural parser, using pattern analysis");
            let name = if language.trim().is_empty() {
                resolved.as_str().to_string()
            } else {
                language.trim().to_lowercase()
            };
            return fallback::analyze(source, FallbackReason::UnsupportedLanguage(name));
        };

        match parser.parse(source) {
            Ok(extraction) => {
                let method_count: usize = extraction.classes.iter().map(|c| c.method_count).sum();
                let complexity = Complexity::from_structure(
                    extraction.functions.len() + method_count,
                    extraction.branch_count,
                );
                debug!(
                    language = resolved.as_str(),
                    functions = extraction.functions.len(),
                    classes = extraction.classes.len(),
                    branches = extraction.branch_count,
                    "Structural analysis complete"
                );
                CodeAnalysis {
                    functions: extraction.functions,
                    classes: extraction.classes,
                    exports: extraction.exports,
                    complexity,
                    parse_mode: ParseMode::Structural {
                        language: resolved.as_str().to_string(),
                        branch_count: extraction.branch_count,
                    },
                }
            }
            Err(e) => {
                warn!(language = resolved.as_str(), error = %e, "Parse failed, degrading to pattern analysis");
                fallback::analyze(source, FallbackReason::ParseFailed(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_add_function_structural() {
        let analysis = CodeAnalyzer::new().analyze("function add(a,b){return a+b}", "javascript");
        assert!(analysis.parse_mode.is_structural());
        assert_eq!(analysis.functions.len(), 1);
        assert_eq!(analysis.functions[0].name, "add");
        assert_eq!(analysis.functions[0].parameters.len(), 2);
        assert_eq!(analysis.complexity, Complexity::Simple);
    }

    #[test]
    fn test_unsupported_language_uses_fallback() {
        let analysis = CodeAnalyzer::new().analyze("def greet(name)\n  puts name\nend\n", "Ruby");
        match &analysis.parse_mode {
            ParseMode::Fallback { reason, line_count, .. } => {
                assert_eq!(reason, &FallbackReason::UnsupportedLanguage("ruby".to_string()));
                assert_eq!(*line_count, 3);
            }
            other => panic!("expected fallback, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_failure_degrades() {
        let analysis = CodeAnalyzer::new().analyze("function broken(a, {\n  return", "javascript");
        assert!(matches!(
            analysis.parse_mode,
            ParseMode::Fallback {
                reason: FallbackReason::ParseFailed(_),
                ..
            }
        ));
    }

    #[test]
    fn test_branch_heavy_source_is_complex() {
        let body: String = (0..16).map(|i| format!("if (x > {i}) {{ y++ }}\n")).collect();
        let source = format!("function f(x) {{ let y = 0;\n{body} return y }}");
        let analysis = CodeAnalyzer::new().analyze(&source, "js");
        assert_eq!(analysis.complexity, Complexity::Complex);
    }

    proptest! {
        #[test]
        fn prop_analyze_never_panics(
            source in "\\PC{0,300}",
            language in prop::sample::select(vec!["javascript", "typescript", "tsx", "python", "rust", "go", "cobol", ""]),
        ) {
            let analysis = CodeAnalyzer::new().analyze(&source, language);
            let structural_ok = analysis.parse_mode.is_structural()
                || matches!(analysis.parse_mode, ParseMode::Fallback { .. });
            prop_assert!(structural_ok);
        }
    }
}
