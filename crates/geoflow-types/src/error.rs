//! Error types for the workflow model.

use thiserror::Error;

/// Result type alias using [`ModelError`].
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors raised when a workflow document violates its structural invariants.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Two operations share the same id.
    #[error("Duplicate operation id: {0}")]
    DuplicateOperation(String),

    /// A connection or lookup names an operation that does not exist.
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// A connection points at a port index the operation does not have.
    #[error("Operation '{operation}' has no {direction} port {index}")]
    InvalidPort {
        operation: String,
        direction: &'static str,
        index: usize,
    },

    /// The document contains no workflow.
    #[error("Document contains no workflow")]
    EmptyDocument,

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
