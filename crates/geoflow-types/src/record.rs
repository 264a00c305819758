//! Execution result records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::port::PortType;

/// Outcome of one executed operation, in execution order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Id of the executed operation.
    pub id: String,
    /// Type of the operation's first declared output.
    #[serde(rename = "type")]
    pub output_type: PortType,
    /// The produced output, or `null` when the operation produced nothing.
    pub data: Value,
    /// Why the operation produced nothing, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionRecord {
    /// Whether the operation produced usable output.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && !self.data.is_null()
    }
}
