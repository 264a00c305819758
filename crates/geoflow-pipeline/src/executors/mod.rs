//! Built-in operation executors, one per resource.

mod geoserver;
mod ilwis;
mod rest;
mod restful;
mod wps;

pub use geoserver::GeoServerExecutor;
pub use ilwis::{encode_segment, IlwisExecutor};
pub use rest::RestExecutor;
pub use restful::{execute_body, PollPolicy, RestfulWpsExecutor};
pub use wps::{execute_request, response_mime_type, WpsExecutor};

use geoflow_types::Operation;

/// The label a service knows the operation by, falling back to its id.
pub(crate) fn service_label(operation: &Operation) -> &str {
    if operation.metadata.label.is_empty() {
        &operation.id
    } else {
        &operation.metadata.label
    }
}

/// Reference URL of an input: its `url`, or its value when it has none.
pub(crate) fn reference_url(port: &geoflow_types::Port) -> String {
    if port.url.is_empty() {
        port.value_text()
    } else {
        port.url.clone()
    }
}
