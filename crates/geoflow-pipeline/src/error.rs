//! Error types for the pipeline.

use geoflow_ogc::OgcError;
use geoflow_publish::PublishError;
use geoflow_types::OperationId;
use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that abort a workflow run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The connection graph has a cycle.
    #[error("Cyclic workflow through operations: {}", .0.join(", "))]
    CyclicWorkflow(Vec<OperationId>),

    /// A connection or lookup names an operation that does not exist.
    #[error("Unknown operation: {0}")]
    UnknownOperation(OperationId),

    /// An input references an operation that has not produced output yet.
    #[error("Operation {operation} needs output {output} of {producer}, which has not run")]
    DependencyMissing {
        operation: OperationId,
        producer: OperationId,
        output: usize,
    },

    /// The run was cancelled.
    #[error("Workflow execution cancelled")]
    Cancelled,
}

/// Errors from a single operation.
///
/// Except for [`ExecutorError::Cancelled`] these are recorded against the
/// operation and do not stop the workflow.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// No executor is registered for the operation's resource.
    #[error("No executor for resource '{0}'")]
    UnsupportedResource(String),

    /// The operation lacks something the executor needs.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// The service answered with something unusable.
    #[error("Invalid response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },

    /// Adapter failure.
    #[error(transparent)]
    Ogc(#[from] OgcError),

    /// Publishing failure.
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// The run was cancelled while the operation was in flight.
    #[error("Cancelled")]
    Cancelled,
}

impl ExecutorError {
    pub(crate) fn invalid_response(url: &str, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}
