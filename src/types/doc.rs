//! Documentation formats and the provider-neutral prompt request.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::{ValidationError, ValidationErrorKind};

/// Requested documentation format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocType {
    Readme,
    Jsdoc,
    Api,
    Architecture,
    Openapi,
}

impl DocType {
    pub const ALL: [DocType; 5] = [
        DocType::Readme,
        DocType::Jsdoc,
        DocType::Api,
        DocType::Architecture,
        DocType::Openapi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Readme => "README",
            DocType::Jsdoc => "JSDOC",
            DocType::Api => "API",
            DocType::Architecture => "ARCHITECTURE",
            DocType::Openapi => "OPENAPI",
        }
    }

    /// Doc types scored with the narrative (markdown prose) rubric
    pub fn is_narrative(&self) -> bool {
        matches!(
            self,
            DocType::Readme | DocType::Api | DocType::Architecture
        )
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "README" => Ok(DocType::Readme),
            "JSDOC" => Ok(DocType::Jsdoc),
            "API" => Ok(DocType::Api),
            "ARCHITECTURE" => Ok(DocType::Architecture),
            "OPENAPI" => Ok(DocType::Openapi),
            _ => Err(ValidationError::new(
                ValidationErrorKind::UnknownDocType,
                format!(
                    "Unknown doc type '{}'. Valid values: README, JSDOC, API, ARCHITECTURE, OPENAPI",
                    s
                ),
            )
            .with_field("docType")),
        }
    }
}

/// Complete, provider-neutral generation request.
///
/// Built once per call; providers translate it into their wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub system_instructions: String,
    /// Analysis summary, task and formatting constraints
    pub user_content: String,
    /// Source excerpt, kept separate so providers can mark it cacheable
    pub code_segment: String,
    pub doc_type: DocType,
    pub caching_hint: bool,
    pub max_output_tokens: u32,
}

impl PromptRequest {
    /// Full user message in the order providers send it
    pub fn user_message(&self) -> String {
        if self.code_segment.is_empty() {
            return self.user_content.clone();
        }
        format!("{}\n\n{}", self.code_segment, self.user_content)
    }

    /// Prompt with system instructions inlined, for completion-style APIs
    pub fn flattened(&self) -> String {
        format!("{}\n\n{}", self.system_instructions, self.user_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_type_parse_is_case_insensitive() {
        assert_eq!("readme".parse::<DocType>().unwrap(), DocType::Readme);
        assert_eq!(" OpenAPI ".parse::<DocType>().unwrap(), DocType::Openapi);
        for doc_type in DocType::ALL {
            assert_eq!(doc_type.as_str().parse::<DocType>().unwrap(), doc_type);
        }
    }

    #[test]
    fn test_unknown_doc_type_is_validation_error() {
        let err = "CHANGELOG".parse::<DocType>().unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::UnknownDocType);
        assert_eq!(err.field.as_deref(), Some("docType"));
    }

    #[test]
    fn test_doc_type_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&DocType::Architecture).unwrap(),
            "\"ARCHITECTURE\""
        );
    }

    #[test]
    fn test_user_message_puts_code_first() {
        let request = PromptRequest {
            system_instructions: "sys".to_string(),
            user_content: "task".to_string(),
            code_segment: "code".to_string(),
            doc_type: DocType::Readme,
            caching_hint: false,
            max_output_tokens: 100,
        };
        assert_eq!(request.user_message(), "code\n\ntask");
        assert_eq!(request.flattened(), "sys\n\ncode\n\ntask");
    }
}
