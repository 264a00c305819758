//! Shared types for geoflow workflows.
//!
//! A [`Workflow`] is a directed graph of remote geoprocessing [`Operation`]s
//! wired together by [`Connection`]s. Each operation exposes input and output
//! [`Port`]s; an input port may carry an [`OutputReference`]
//! (`"<operation>_to_<output>"`) that the executor replaces with the output of
//! an upstream operation.

pub mod error;
pub mod port;
pub mod record;
pub mod reference;
mod serde_util;
pub mod workflow;

pub use error::{ModelError, Result};
pub use port::{Port, PortType};
pub use record::ExecutionRecord;
pub use reference::OutputReference;
pub use workflow::{
    Connection, Operation, OperationId, OperationMetadata, Resource, Workflow, WorkflowDocument,
    WorkflowMetadata,
};
