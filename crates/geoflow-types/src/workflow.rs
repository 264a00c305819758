//! Workflow documents.
//!
//! The JSON shape matches what the browser workflow editor posts:
//!
//! ```json
//! {
//!   "id": 1,
//!   "metadata": { "longname": "Slope from DEM" },
//!   "operations": [
//!     { "id": 1, "metadata": { "label": "gs:Clip", "resource": "WPS", "url": "..." },
//!       "inputs": [...], "outputs": [...] }
//!   ],
//!   "connections": [
//!     { "fromOperationID": 1, "toOperationID": 2, "fromParameterID": 0, "toParameterID": 0 }
//!   ]
//! }
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::port::{Port, PortType};
use crate::reference::OutputReference;

/// Operation identifier, unique within a workflow.
pub type OperationId = String;

/// Which remote execution strategy an operation uses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Resource {
    /// OGC WPS 1.0 synchronous Execute.
    Wps,
    /// OGC API Processes style job submission with polling.
    RestfulWps,
    /// Plain JSON POST of the operation document.
    Rest,
    /// ILWIS processing engine REST endpoint.
    Ilwis,
    /// Raster publishing to a GeoServer instance.
    GeoServer,
    /// Anything else, preserved verbatim.
    Other(String),
}

impl Resource {
    /// The wire representation of this resource.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Wps => "WPS",
            Self::RestfulWps => "RESTful WPS",
            Self::Rest => "REST",
            Self::Ilwis => "ILWIS",
            Self::GeoServer => "GeoServer",
            Self::Other(s) => s,
        }
    }
}

impl Default for Resource {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for Resource {
    fn from(s: String) -> Self {
        match s.as_str() {
            "WPS" => Self::Wps,
            "RESTful WPS" => Self::RestfulWps,
            "REST" => Self::Rest,
            "ILWIS" => Self::Ilwis,
            "GeoServer" => Self::GeoServer,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for Resource {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<Resource> for String {
    fn from(r: Resource) -> Self {
        match r {
            Resource::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptive metadata of an operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationMetadata {
    /// Identifier of the remote process.
    pub label: String,
    /// Human-readable title.
    pub longname: String,
    /// Endpoint the operation executes against.
    pub url: String,
    /// Execution strategy.
    pub resource: Resource,
    pub description: String,
    /// Editor canvas position.
    pub position: [f64; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputparametercount: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputparametercount: Option<usize>,
}

/// One node of a workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Operation {
    #[serde(deserialize_with = "crate::serde_util::id")]
    pub id: OperationId,
    pub metadata: OperationMetadata,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<Port>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<Port>,
}

impl Operation {
    /// Create an operation with the given id and execution strategy.
    pub fn new(id: impl Into<String>, resource: Resource) -> Self {
        Self {
            id: id.into(),
            metadata: OperationMetadata {
                resource,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Type of the first declared output, or the empty type when there is none.
    pub fn primary_output_type(&self) -> PortType {
        self.outputs
            .first()
            .map(|p| p.port_type.clone())
            .unwrap_or_default()
    }

    /// Refresh the port counts in the metadata.
    pub fn update_counts(&mut self) {
        self.metadata.inputparametercount = Some(self.inputs.len());
        self.metadata.outputparametercount = Some(self.outputs.len());
    }
}

/// Directed edge from an output of one operation to an input of another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    #[serde(rename = "fromOperationID", deserialize_with = "crate::serde_util::id")]
    pub from_operation: OperationId,
    #[serde(rename = "toOperationID", deserialize_with = "crate::serde_util::id")]
    pub to_operation: OperationId,
    #[serde(
        rename = "fromParameterID",
        default,
        deserialize_with = "crate::serde_util::index"
    )]
    pub from_parameter: usize,
    #[serde(
        rename = "toParameterID",
        default,
        deserialize_with = "crate::serde_util::index"
    )]
    pub to_parameter: usize,
}

impl Connection {
    pub fn new(
        from_operation: impl Into<String>,
        from_parameter: usize,
        to_operation: impl Into<String>,
        to_parameter: usize,
    ) -> Self {
        Self {
            from_operation: from_operation.into(),
            to_operation: to_operation.into(),
            from_parameter,
            to_parameter,
        }
    }

    /// The reference string this edge corresponds to.
    pub fn reference(&self) -> OutputReference {
        OutputReference::new(self.from_operation.clone(), self.from_parameter)
    }
}

/// Workflow-level metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowMetadata {
    pub longname: String,
}

/// A complete workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Workflow {
    #[serde(deserialize_with = "crate::serde_util::id")]
    pub id: String,
    pub metadata: WorkflowMetadata,
    pub operations: Vec<Operation>,
    pub connections: Vec<Connection>,
}

impl Workflow {
    /// Create an empty workflow.
    pub fn new(id: impl Into<String>, longname: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            metadata: WorkflowMetadata {
                longname: longname.into(),
            },
            ..Default::default()
        }
    }

    /// Parse a workflow from JSON.
    ///
    /// Accepts either a bare workflow or a `{"workflows": [...]}` envelope, in
    /// which case the first workflow is returned.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if value.get("workflows").is_some() {
            let document: WorkflowDocument = serde_json::from_value(value)?;
            return document
                .workflows
                .into_iter()
                .next()
                .ok_or(ModelError::EmptyDocument);
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Find an operation by id.
    pub fn operation(&self, id: &str) -> Option<&Operation> {
        self.operations.iter().find(|o| o.id == id)
    }

    /// Find an operation by id (mutable).
    pub fn operation_mut(&mut self, id: &str) -> Option<&mut Operation> {
        self.operations.iter_mut().find(|o| o.id == id)
    }

    /// Connections feeding into an operation.
    pub fn incoming<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections.iter().filter(move |c| c.to_operation == id)
    }

    /// Connections leaving an operation.
    pub fn outgoing<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections.iter().filter(move |c| c.from_operation == id)
    }

    /// Check the structural invariants.
    ///
    /// - operation ids are unique
    /// - every connection endpoint names an existing operation
    /// - every connection port index exists on its operation
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for op in &self.operations {
            if !seen.insert(op.id.as_str()) {
                return Err(ModelError::DuplicateOperation(op.id.clone()));
            }
        }

        for conn in &self.connections {
            let from = self
                .operation(&conn.from_operation)
                .ok_or_else(|| ModelError::UnknownOperation(conn.from_operation.clone()))?;
            let to = self
                .operation(&conn.to_operation)
                .ok_or_else(|| ModelError::UnknownOperation(conn.to_operation.clone()))?;

            if conn.from_parameter >= from.outputs.len().max(1) {
                return Err(ModelError::InvalidPort {
                    operation: from.id.clone(),
                    direction: "output",
                    index: conn.from_parameter,
                });
            }
            if conn.to_parameter >= to.inputs.len() {
                return Err(ModelError::InvalidPort {
                    operation: to.id.clone(),
                    direction: "input",
                    index: conn.to_parameter,
                });
            }
        }

        Ok(())
    }

    /// Rewrite the embedded reference string of every connected input port
    /// from the connection list.
    pub fn sync_references(&mut self) -> Result<()> {
        let connections = self.connections.clone();
        for conn in connections {
            let op = self
                .operation_mut(&conn.to_operation)
                .ok_or_else(|| ModelError::UnknownOperation(conn.to_operation.clone()))?;
            let op_id = op.id.clone();
            let port = op
                .inputs
                .get_mut(conn.to_parameter)
                .ok_or(ModelError::InvalidPort {
                    operation: op_id,
                    direction: "input",
                    index: conn.to_parameter,
                })?;
            port.value = serde_json::Value::String(conn.reference().to_string());
        }
        Ok(())
    }
}

/// Request envelope carrying one or more workflows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowDocument {
    #[serde(default)]
    pub workflows: Vec<Workflow>,
}
