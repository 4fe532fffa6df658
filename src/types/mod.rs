pub mod analysis;
pub mod doc;
pub mod error;
pub mod quality;

pub use analysis::{ClassInfo, CodeAnalysis, Complexity, FallbackReason, FunctionInfo, ParseMode};
pub use doc::{DocType, PromptRequest};
pub use error::{
    DocError, ErrorCategory, ErrorClassifier, LlmError, Result, ValidationError,
    ValidationErrorKind,
};
pub use quality::{Criterion, CriterionScore, CriterionStatus, Grade, QualityScore, QualitySummary};
