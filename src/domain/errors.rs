//! Domain errors for the sagan research pipeline.

use thiserror::Error;
use uuid::Uuid;

/// Domain-level errors.
///
/// None of these are fatal to a running session: stages catch them at the
/// call site, record a session message, and substitute a documented fallback.
/// The pipeline is designed to always reach its terminal state.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Generation service failed: {0}")]
    GenerationFailed(String),

    #[error("Retrieval service failed: {0}")]
    RetrievalFailed(String),

    #[error("Malformed structured output: {0}")]
    MalformedStructuredOutput(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
