//! Per-doc-type prompt strategies.
//!
//! Each strategy fixes the tone, the required output shape and the
//! formatting rules for one documentation format. The required sections
//! mirror what the quality rubric looks for.

use super::sections::SectionWriter;
use crate::types::DocType;

/// Rules shared by every doc type
const COMMON_RULES: &[&str] = &[
    "Respond with the documentation only. No preamble, no closing remarks.",
    "Document only behaviour visible in the provided code. Do not invent APIs, flags or dependencies.",
    "Use the exact identifiers from the code when referring to functions and classes.",
];

const MARKDOWN_RULES: &[&str] = &[
    "Use GitHub-flavoured markdown with ATX headings (`#`, `##`, `###`).",
    "Tag every fenced code block with its language.",
    "Describe each documented function or class in at least one full sentence next to its name.",
];

const DIAGRAM_RULES: &[&str] = &[
    "Diagrams use fenced ```mermaid blocks only. No ASCII art.",
    "Quote node labels that contain spaces or punctuation, e.g. A[\"Request parser\"].",
    "Keep each diagram under 15 nodes; split larger flows.",
];

/// Preset prompt strategies, one per doc type
pub struct PromptTemplates;

impl PromptTemplates {
    /// System instructions for `doc_type`
    pub fn system_instructions(doc_type: DocType) -> String {
        match doc_type {
            DocType::Readme => Self::readme(),
            DocType::Jsdoc => Self::jsdoc(),
            DocType::Api => Self::api(),
            DocType::Architecture => Self::architecture(),
            DocType::Openapi => Self::openapi(),
        }
        .build()
    }

    /// Closing task line placed after the analysis summary
    pub fn task(doc_type: DocType, language: &str) -> String {
        match doc_type {
            DocType::Readme => format!(
                "Write a complete README.md for the {} code above.",
                language
            ),
            DocType::Jsdoc => format!(
                "Return the {} code above with JSDoc comments added to every function and class.",
                language
            ),
            DocType::Api => format!(
                "Write an API reference for every public function and class in the {} code above.",
                language
            ),
            DocType::Architecture => format!(
                "Write an architecture overview of the {} code above.",
                language
            ),
            DocType::Openapi => format!(
                "Write an OpenAPI 3.0 specification in YAML for the endpoints in the {} code above.",
                language
            ),
        }
    }

    fn readme() -> SectionWriter {
        SectionWriter::new()
            .role("technical writer", "developer-facing README files")
            .objectives(&[
                "Explain what the code does and who it is for in the opening paragraph",
                "Show how to install or set it up",
                "Give runnable usage examples",
                "Document every public function and class",
            ])
            .list(
                "Required Sections",
                &[
                    "# <Project title> followed by a two to four sentence overview",
                    "## Installation",
                    "## Usage (with at least two fenced code examples)",
                    "## API Reference (one ### subsection per function or class)",
                    "## Contributing or ## License (short)",
                ],
            )
            .rules(COMMON_RULES)
            .rules(MARKDOWN_RULES)
            .anti_patterns(
                &[
                    "\"This function adds numbers\" as the only description of add()",
                    "Usage examples that call functions not present in the code",
                ],
                &[
                    "\"add(a, b) returns the sum of two numbers and never mutates its inputs\"",
                    "Examples built only from the documented functions",
                ],
            )
    }

    fn jsdoc() -> SectionWriter {
        SectionWriter::new()
            .role("JavaScript and TypeScript engineer", "JSDoc annotations")
            .objectives(&[
                "Annotate every function, method and class with a /** */ block",
                "Describe parameters, return values and thrown errors",
                "Include an @example for non-trivial functions",
            ])
            .list(
                "Tag Conventions",
                &[
                    "@fileoverview at the top of the file",
                    "@param {Type} name - description",
                    "@returns {Type} description",
                    "@throws {ErrorType} when it throws",
                    "@example with a short call",
                ],
            )
            .rules(COMMON_RULES)
            .rules(&[
                "Return the full source with comments inserted. Do not change any code.",
                "Place each /** */ block directly above the declaration it documents.",
            ])
    }

    fn api() -> SectionWriter {
        SectionWriter::new()
            .role("API documentation specialist", "reference documentation")
            .objectives(&[
                "Give a short overview of the module's responsibility",
                "Document every function and class with signature, parameters and return value",
                "Show a usage example per entry point",
            ])
            .list(
                "Required Sections",
                &[
                    "# <Module name> API with an overview paragraph",
                    "## Installation or ## Setup when an import is needed",
                    "## API Reference with one ### subsection per function or class",
                    "## Examples",
                ],
            )
            .rules(COMMON_RULES)
            .rules(MARKDOWN_RULES)
            .rules(&["Use a parameter table (Name | Type | Description) when a function takes more than one argument."])
    }

    fn architecture() -> SectionWriter {
        SectionWriter::new()
            .role("software architect", "architecture documentation")
            .objectives(&[
                "Explain the purpose of the code and its main components",
                "Describe how data and control flow between components",
                "Call out design decisions and extension points",
            ])
            .list(
                "Required Sections",
                &[
                    "# <System name> Architecture with an overview paragraph",
                    "## Getting Started or ## Setup",
                    "## Components (one ### subsection per significant function or class)",
                    "## Data Flow with a mermaid diagram",
                    "## Usage Examples",
                ],
            )
            .rules(COMMON_RULES)
            .rules(MARKDOWN_RULES)
            .rules(DIAGRAM_RULES)
    }

    fn openapi() -> SectionWriter {
        SectionWriter::new()
            .role("API designer", "OpenAPI 3.0 specifications")
            .objectives(&[
                "Describe every HTTP endpoint found in the code",
                "Give each operation an operationId, summary and responses",
                "Define request and response schemas under components",
            ])
            .list(
                "Required Top-Level Keys",
                &[
                    "openapi: 3.0.3",
                    "info (title, version, description)",
                    "servers",
                    "paths",
                    "components (schemas, securitySchemes when auth is used)",
                ],
            )
            .rules(COMMON_RULES)
            .rules(&[
                "Output a single fenced ```yaml block containing valid YAML.",
                "Name operationIds after the handler functions in the code.",
                "Add an example value to each request and response schema.",
            ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_doc_type_has_instructions() {
        for doc_type in DocType::ALL {
            let instructions = PromptTemplates::system_instructions(doc_type);
            assert!(instructions.starts_with("<ROLE>"), "{}", doc_type);
            assert!(instructions.contains("Respond with the documentation only"));
        }
    }

    #[test]
    fn test_diagram_policy_only_for_architecture() {
        assert!(PromptTemplates::system_instructions(DocType::Architecture).contains("mermaid"));
        assert!(!PromptTemplates::system_instructions(DocType::Readme).contains("mermaid"));
    }

    #[test]
    fn test_readme_requires_rubric_sections() {
        let instructions = PromptTemplates::system_instructions(DocType::Readme);
        for section in ["## Installation", "## Usage", "## API Reference"] {
            assert!(instructions.contains(section), "{}", section);
        }
    }

    #[test]
    fn test_task_names_language() {
        assert!(PromptTemplates::task(DocType::Openapi, "python").contains("python code"));
    }
}
