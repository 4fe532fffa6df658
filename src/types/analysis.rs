//! Structural summary of a source file.
//!
//! Produced fresh per request by the analyzer and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::constants::analysis as analysis_constants;

/// A function, including arrow/anonymous functions bound to a name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionInfo {
    pub name: String,
    pub parameters: Vec<String>,
    pub is_async: bool,
}

impl FunctionInfo {
    pub fn new(name: impl Into<String>, parameters: Vec<String>, is_async: bool) -> Self {
        Self {
            name: name.into(),
            parameters,
            is_async,
        }
    }
}

/// A class-like type (class, struct, enum, trait) with its method count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassInfo {
    pub name: String,
    pub method_count: usize,
}

impl ClassInfo {
    pub fn new(name: impl Into<String>, method_count: usize) -> Self {
        Self {
            name: name.into(),
            method_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    #[default]
    Simple,
    Medium,
    Complex,
}

impl Complexity {
    /// Classification used when a syntax tree was walked
    pub fn from_structure(function_count: usize, branch_count: usize) -> Self {
        if branch_count > analysis_constants::COMPLEX_BRANCHES
            || function_count > analysis_constants::COMPLEX_FUNCTIONS
        {
            Complexity::Complex
        } else if branch_count > analysis_constants::MEDIUM_BRANCHES
            || function_count > analysis_constants::MEDIUM_FUNCTIONS
        {
            Complexity::Medium
        } else {
            Complexity::Simple
        }
    }

    /// Classification used by pattern heuristics (no branch data)
    pub fn from_function_count(function_count: usize) -> Self {
        if function_count > analysis_constants::FALLBACK_COMPLEX_FUNCTIONS {
            Complexity::Complex
        } else if function_count > analysis_constants::FALLBACK_MEDIUM_FUNCTIONS {
            Complexity::Medium
        } else {
            Complexity::Simple
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Complexity::Simple => write!(f, "simple"),
            Complexity::Medium => write!(f, "medium"),
            Complexity::Complex => write!(f, "complex"),
        }
    }
}

/// Why pattern heuristics were used instead of a syntax tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum FallbackReason {
    /// No structural parser exists for the declared language
    UnsupportedLanguage(String),
    /// The parser rejected the source
    ParseFailed(String),
}

/// How the summary was produced.
///
/// Consumers match on this exhaustively; both modes carry the data that only
/// their extraction technique can provide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum ParseMode {
    #[serde(rename_all = "camelCase")]
    Structural {
        language: String,
        branch_count: usize,
    },
    #[serde(rename_all = "camelCase")]
    Fallback {
        reason: FallbackReason,
        line_count: usize,
        import_count: usize,
        max_brace_depth: usize,
    },
}

impl ParseMode {
    pub fn is_structural(&self) -> bool {
        matches!(self, ParseMode::Structural { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            ParseMode::Structural { .. } => "structural",
            ParseMode::Fallback { .. } => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeAnalysis {
    pub functions: Vec<FunctionInfo>,
    pub classes: Vec<ClassInfo>,
    pub exports: BTreeSet<String>,
    pub complexity: Complexity,
    pub parse_mode: ParseMode,
}

impl CodeAnalysis {
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.iter().map(|f| f.name.as_str())
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(|c| c.name.as_str())
    }

    /// Names the documentation is expected to cover
    pub fn documentable_names(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.function_names()
            .chain(self.class_names())
            .filter(|name| seen.insert(*name))
            .collect()
    }

    pub fn method_count(&self) -> usize {
        self.classes.iter().map(|c| c.method_count).sum()
    }

    /// One-line summary used in prompts and logs
    pub fn summary_line(&self) -> String {
        format!(
            "{} functions, {} classes ({} methods), {} exports, {} complexity",
            self.functions.len(),
            self.classes.len(),
            self.method_count(),
            self.exports.len(),
            self.complexity
        )
    }
}
