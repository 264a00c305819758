//! Synchronous WPS 1.0 Execute.

use async_trait::async_trait;
use geoflow_ogc::geojson::crs_block;
use geoflow_ogc::{OgcClient, XmlElement};
use geoflow_types::{Operation, PortType};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{reference_url, service_label};
use crate::error::ExecutorError;
use crate::executor::{NodeOutput, OperationExecutor};

/// SRID stamped on vector results.
const RESULT_SRID: i32 = 3857;

/// Posts an XML Execute request and returns the raw output.
#[derive(Debug, Clone)]
pub struct WpsExecutor {
    client: OgcClient,
}

impl WpsExecutor {
    pub fn new(client: OgcClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OperationExecutor for WpsExecutor {
    async fn execute(
        &self,
        operation: &Operation,
        _cancel: &CancellationToken,
    ) -> Result<NodeOutput, ExecutorError> {
        let url = &operation.metadata.url;
        if url.is_empty() {
            return Err(ExecutorError::InvalidOperation(format!(
                "operation {} has no WPS url",
                operation.id
            )));
        }

        let output_type = operation.primary_output_type();
        let request = execute_request(operation)?;
        let Some(body) = self.client.post(url, "text/xml", request).await else {
            return Ok(NodeOutput::Empty);
        };

        if output_type != PortType::Geom {
            return Ok(NodeOutput::Data(Value::String(body)));
        }

        let mut document: Value = serde_json::from_str(&body)
            .map_err(|e| ExecutorError::invalid_response(url, e.to_string()))?;
        if let Some(object) = document.as_object_mut() {
            object.insert("crs".to_string(), crs_block(RESULT_SRID));
        }
        debug!(operation = %operation.id, "WPS returned a feature collection");
        Ok(NodeOutput::Data(document))
    }
}

/// Mime type to request for an output type.
pub fn response_mime_type(output_type: &PortType) -> &'static str {
    match output_type {
        PortType::Coverage => "image/tiff",
        _ => "application/json",
    }
}

/// Build the Execute document for an operation.
///
/// Inputs without a value or url are left out. Vector inputs go inline as
/// JSON or by reference when they carry a url; raster inputs go inline as
/// `image/tiff`; everything else is literal data.
pub fn execute_request(operation: &Operation) -> Result<String, ExecutorError> {
    let mut data_inputs = XmlElement::new("wps:DataInputs");

    for port in &operation.inputs {
        if port.is_empty() && port.url.is_empty() {
            continue;
        }

        let identifier = XmlElement::new("ows:Identifier").text(port.identifier.as_str());
        let input = XmlElement::new("wps:Input").child(identifier);

        let input = match port.port_type {
            PortType::Geom if !port.url.is_empty() => input.child(
                XmlElement::new("wps:Reference")
                    .attr("mimeType", "application/json")
                    .attr("xlink:href", reference_url(port))
                    .attr("method", "GET"),
            ),
            PortType::Geom => input.child(XmlElement::new("wps:Data").child(
                XmlElement::new("wps:ComplexData")
                    .attr("mimeType", "application/json")
                    .text(port.value_text()),
            )),
            PortType::Coverage => input.child(XmlElement::new("wps:Data").child(
                XmlElement::new("wps:ComplexData")
                    .attr("mimeType", "image/tiff")
                    .text(port.value_text()),
            )),
            _ => input.child(
                XmlElement::new("wps:Data")
                    .child(XmlElement::new("wps:LiteralData").text(port.value_text())),
            ),
        };
        data_inputs.push(input);
    }

    let response_form = XmlElement::new("wps:ResponseForm").child(
        XmlElement::new("wps:RawDataOutput")
            .attr("mimeType", response_mime_type(&operation.primary_output_type()))
            .child(XmlElement::new("ows:Identifier").text("result")),
    );

    let root = execute_head()
        .child(XmlElement::new("ows:Identifier").text(service_label(operation)))
        .child(data_inputs)
        .child(response_form);

    Ok(root.to_xml_string()?)
}

fn execute_head() -> XmlElement {
    XmlElement::new("wps:Execute")
        .attr("service", "WPS")
        .attr("version", "1.0")
        .attr("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance")
        .attr("xmlns", "http://www.opengis.net/wps/1.0.0")
        .attr("xmlns:wfs", "http://www.opengis.net/wfs")
        .attr("xmlns:wps", "http://www.opengis.net/wps/1.0.0")
        .attr("xmlns:ows", "http://www.opengis.net/ows/1.1")
        .attr("xmlns:gml", "http://www.opengis.net/gml")
        .attr("xmlns:ogc", "http://www.opengis.net/ogc")
        .attr("xmlns:wcs", "http://www.opengis.net/wcs/1.1.1")
        .attr("xmlns:xlink", "http://www.w3.org/1999/xlink")
        .attr(
            "xsi:schemaLocation",
            "http://www.opengis.net/wps/1.0.0 http://schemas.opengis.net/wps/1.0.0/wpsAll.xsd",
        )
}
