//! Pipeline inputs and results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ai::ProviderMetadata;
use crate::types::{CodeAnalysis, DocType, QualityScore};

/// One generation call as received from a transport.
///
/// `doc_type` stays a string until the pipeline validates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    #[serde(rename = "code")]
    pub source: String,
    pub doc_type: String,
    #[serde(default)]
    pub language: String,
}

impl GenerationRequest {
    pub fn new(
        source: impl Into<String>,
        doc_type: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            doc_type: doc_type.into(),
            language: language.into(),
        }
    }

    /// Source length in characters
    pub fn code_length(&self) -> usize {
        self.source.chars().count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOptions {
    /// Source is a known static sample; enables prompt caching hints
    #[serde(default)]
    pub is_sample: bool,
}

/// Provider metadata plus request facts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationMetadata {
    #[serde(flatten)]
    pub provider: ProviderMetadata,
    pub doc_type: DocType,
    pub generated_at: DateTime<Utc>,
    pub code_length: usize,
    pub request_id: Uuid,
}

/// Final output of a successful generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub documentation: String,
    pub quality_score: QualityScore,
    pub analysis: CodeAnalysis,
    pub metadata: GenerationMetadata,
}

/// How a streaming generation ended when it did not fail
#[derive(Debug)]
pub enum GenerationOutcome {
    Completed(Box<GenerationResult>),
    Cancelled,
}

impl GenerationOutcome {
    pub fn into_result(self) -> Option<GenerationResult> {
        match self {
            GenerationOutcome::Completed(result) => Some(*result),
            GenerationOutcome::Cancelled => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_from_wire_json() {
        let request: GenerationRequest = serde_json::from_str(
            r#"{"code":"function add(a,b){return a+b}","docType":"README","language":"javascript"}"#,
        )
        .unwrap();
        assert_eq!(request.doc_type, "README");
        assert_eq!(request.code_length(), 29);
    }

    #[test]
    fn test_language_is_optional() {
        let request: GenerationRequest =
            serde_json::from_str(r#"{"code":"x = 1","docType":"API"}"#).unwrap();
        assert!(request.language.is_empty());
    }

    #[test]
    fn test_code_length_counts_chars() {
        assert_eq!(GenerationRequest::new("héllo", "README", "").code_length(), 5);
    }
}
