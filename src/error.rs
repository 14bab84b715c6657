//! Crate-wide error type

use thiserror::Error;

/// Errors surfaced by the triage pipeline and its collaborators.
///
/// Per-line problems (malformed log lines, unparseable request fields) are
/// never errors; they are absorbed into the returned findings. Only
/// collaborator-level failures propagate.
#[derive(Error, Debug)]
pub enum WardenError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Feature width mismatch: model expects {expected}, got {actual}")]
    ShapeError { expected: usize, actual: usize },

    #[error("Model not fitted: {0}")]
    ModelNotFitted(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WardenError>;
