//! ILWIS workflow import.
//!
//! ILWIS workflows already have the native shape but use their own port type
//! vocabulary and carry edges only in the connection list.

use geoflow_types::{PortType, Resource, Workflow};
use tracing::debug;

use crate::error::Result;

/// Map an ILWIS port type onto the native vocabulary.
///
/// Types outside the ILWIS vocabulary are kept as they are.
pub fn map_port_type(port_type: &PortType) -> PortType {
    match port_type.as_str() {
        "map" | "raster" | "RasterCoverage" => PortType::Coverage,
        "feature" | "table" | "geometry" | "PolygonCoverage" | "LineCoverage"
        | "PointCoverage" => PortType::Geom,
        _ => port_type.clone(),
    }
}

/// Convert an ILWIS workflow document into a native workflow.
///
/// Accepts a bare workflow or a `{"workflows": [...]}` envelope.
pub fn from_ilwis(json: &str) -> Result<Workflow> {
    let mut workflow = Workflow::from_json(json)?;
    workflow.validate()?;

    for op in &mut workflow.operations {
        op.metadata.resource = Resource::Ilwis;
        for port in op.inputs.iter_mut().chain(op.outputs.iter_mut()) {
            port.port_type = map_port_type(&port.port_type);
        }
        op.update_counts();
    }
    workflow.sync_references()?;

    debug!(
        workflow = %workflow.id,
        operations = workflow.operations.len(),
        "imported ILWIS workflow"
    );
    Ok(workflow)
}
