//! Wire events for streaming transports.
//!
//! A streaming run is zero or more `chunk` events followed by exactly one
//! terminal event: `complete`, `error` or `cancelled`.

use serde::Serialize;

use super::types::{GenerationMetadata, GenerationResult};
use crate::types::{DocError, QualityScore};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireEvent {
    Chunk {
        content: String,
    },
    #[serde(rename_all = "camelCase")]
    Complete {
        quality_score: QualityScore,
        metadata: GenerationMetadata,
    },
    #[serde(rename_all = "camelCase")]
    Error {
        /// Classified kind, e.g. `RATE_LIMIT`
        kind: String,
        message: String,
        status: u16,
        #[serde(skip_serializing_if = "Option::is_none")]
        retry_after_ms: Option<u64>,
    },
    Cancelled,
}

impl WireEvent {
    pub fn complete(result: GenerationResult) -> Self {
        WireEvent::Complete {
            quality_score: result.quality_score,
            metadata: result.metadata,
        }
    }

    /// Error event carrying the classified kind and a readable message
    pub fn error(err: &DocError) -> Self {
        let message = match err {
            DocError::Provider(e) => e.message.clone(),
            DocError::Validation(e) => e.message.clone(),
            other => other.to_string(),
        };
        WireEvent::Error {
            kind: err.kind().to_string(),
            message,
            status: err.http_status(),
            retry_after_ms: err.retry_after().map(|d| d.as_millis() as u64),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, WireEvent::Chunk { .. })
    }
}
