//! Rubric tables: per-doc-type weights, keyword sets and suggestions.
//!
//! Weights can be overridden from configuration; keyword lists are tuning
//! constants calibrated against sample output.

use serde::{Deserialize, Serialize};

use super::markdown::contains_identifier;
use crate::types::{Criterion, DocType};

/// Points available per criterion. A zero weight drops the criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricWeights {
    #[serde(default)]
    pub overview: u32,
    #[serde(default)]
    pub installation: u32,
    #[serde(default)]
    pub examples: u32,
    #[serde(default)]
    pub api_docs: u32,
    #[serde(default)]
    pub structure: u32,
}

impl RubricWeights {
    /// README, API and ARCHITECTURE
    pub const NARRATIVE: Self = Self {
        overview: 20,
        installation: 15,
        examples: 20,
        api_docs: 25,
        structure: 20,
    };

    /// Inline doc comments have no setup section
    pub const JSDOC: Self = Self {
        overview: 15,
        installation: 0,
        examples: 20,
        api_docs: 40,
        structure: 25,
    };

    pub const OPENAPI: Self = Self {
        overview: 15,
        installation: 10,
        examples: 20,
        api_docs: 35,
        structure: 20,
    };

    pub fn for_doc_type(doc_type: DocType) -> Self {
        match doc_type {
            DocType::Jsdoc => Self::JSDOC,
            DocType::Openapi => Self::OPENAPI,
            DocType::Readme | DocType::Api | DocType::Architecture => Self::NARRATIVE,
        }
    }

    pub fn get(&self, criterion: Criterion) -> u32 {
        match criterion {
            Criterion::Overview => self.overview,
            Criterion::Installation => self.installation,
            Criterion::Examples => self.examples,
            Criterion::ApiDocs => self.api_docs,
            Criterion::Structure => self.structure,
        }
    }

    pub fn total(&self) -> u32 {
        Criterion::ALL.iter().map(|c| self.get(*c)).sum()
    }

    /// Criteria scored under these weights, in declaration order
    pub fn criteria(&self) -> impl Iterator<Item = Criterion> + '_ {
        Criterion::ALL.into_iter().filter(|c| self.get(*c) > 0)
    }
}

/// Heading keywords that mark an overview section
pub const OVERVIEW_HEADINGS: &[&str] = &[
    "overview",
    "introduction",
    "about",
    "description",
    "summary",
    "what is",
    "purpose",
];

pub const INSTALLATION_HEADINGS: &[&str] = &[
    "installation",
    "install",
    "installing",
    "setup",
    "set up",
    "getting started",
    "quick start",
    "quickstart",
    "requirements",
    "prerequisites",
    "configuration",
];

/// Body phrases that imply setup instructions without a dedicated heading
pub const INSTALLATION_PHRASES: &[&str] = &[
    "npm install",
    "yarn add",
    "pnpm add",
    "pip install",
    "cargo add",
    "cargo install",
    "go get",
    "go install",
    "git clone",
    "brew install",
    "docker run",
];

pub const USAGE_HEADINGS: &[&str] = &["usage", "example", "examples", "how to use", "tutorial"];

pub const API_HEADINGS: &[&str] = &[
    "api",
    "reference",
    "methods",
    "functions",
    "classes",
    "interface",
    "endpoints",
    "components",
];

/// JSDoc tags counted towards structure
pub const JSDOC_TAGS: &[&str] = &[
    "@param",
    "@returns",
    "@return",
    "@example",
    "@throws",
    "@typedef",
    "@property",
    "@description",
    "@async",
    "@class",
    "@module",
    "@see",
];

pub const JSDOC_OVERVIEW_TAGS: &[&str] = &["@file", "@fileoverview", "@overview", "@module"];

/// Top-level OpenAPI keys expected in a complete document
pub const OPENAPI_SECTIONS: &[&str] = &["openapi", "info", "servers", "paths", "components"];

pub const OPENAPI_OPERATION_KEYS: &[&str] = &["operationid", "summary", "description"];

/// Fixed suggestion for a criterion that is not complete
pub fn suggestion(criterion: Criterion, doc_type: DocType) -> &'static str {
    match (criterion, doc_type) {
        (Criterion::Overview, DocType::Jsdoc) => {
            "Add a @fileoverview block describing the module's purpose."
        }
        (Criterion::Overview, DocType::Openapi) => {
            "Add an info.description explaining what the API does."
        }
        (Criterion::Overview, _) => {
            "Add an overview section explaining what the code does and who it is for."
        }
        (Criterion::Installation, DocType::Openapi) => {
            "Declare servers and security schemes so clients know how to connect."
        }
        (Criterion::Installation, _) => {
            "Add installation or setup instructions, including prerequisites."
        }
        (Criterion::Examples, DocType::Jsdoc) => "Add @example tags showing typical calls.",
        (Criterion::Examples, DocType::Openapi) => {
            "Add request and response examples to the operations."
        }
        (Criterion::Examples, _) => "Add more usage examples in fenced code blocks.",
        (Criterion::ApiDocs, DocType::Openapi) => {
            "Describe every operation with an operationId and summary."
        }
        (Criterion::ApiDocs, _) => {
            "Document every public function and class with its parameters and return value."
        }
        (Criterion::Structure, DocType::Jsdoc) => {
            "Use @param, @returns and @throws tags consistently."
        }
        (Criterion::Structure, DocType::Openapi) => {
            "Include the openapi, info, servers, paths and components sections."
        }
        (Criterion::Structure, _) => {
            "Organize the document with more headings and nested subsections."
        }
    }
}

/// Case-insensitive keyword match on whole words ("api" never matches "rapid")
pub fn mentions_any(text: &str, keywords: &[&str]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|k| contains_identifier(&lower, k))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_sum_to_100() {
        for doc_type in DocType::ALL {
            assert_eq!(RubricWeights::for_doc_type(doc_type).total(), 100, "{}", doc_type);
        }
    }

    #[test]
    fn test_narrative_has_five_criteria() {
        assert_eq!(RubricWeights::NARRATIVE.criteria().count(), 5);
        let jsdoc: Vec<_> = RubricWeights::JSDOC.criteria().collect();
        assert!(!jsdoc.contains(&Criterion::Installation));
    }

    #[test]
    fn test_mentions_any_ignores_case() {
        assert!(mentions_any("Getting Started", INSTALLATION_HEADINGS));
        assert!(!mentions_any("License", INSTALLATION_HEADINGS));
    }

    #[test]
    fn test_mentions_any_matches_whole_words() {
        assert!(mentions_any("API Reference", API_HEADINGS));
        assert!(mentions_any("Installing", INSTALLATION_HEADINGS));
        assert!(mentions_any("Run `npm install calc`", INSTALLATION_PHRASES));
        assert!(!mentions_any("Capabilities", API_HEADINGS));
        assert!(!mentions_any("Rapid prototyping", API_HEADINGS));
        assert!(!mentions_any("Reinstalling", INSTALLATION_HEADINGS));
    }
}
