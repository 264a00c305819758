//! Web Processing Service capability adapter.

use geoflow_types::{Operation, OperationMetadata, Port, PortType, Resource};
use roxmltree::Node;
use tracing::debug;

use crate::client::{query_value, OgcClient};
use crate::error::{OgcError, Result};
use crate::xml;

/// List the processes a WPS endpoint offers.
///
/// Only identifiers containing `prefix` are kept, and at most `limit` of them.
/// Each entry carries its id and metadata; ports are left for
/// [`describe_process`].
pub async fn list_processes(
    client: &OgcClient,
    url: Option<&str>,
    limit: usize,
    prefix: &str,
) -> Result<Option<Vec<Operation>>> {
    let base = client.base_url(url);
    let Some(body) = client
        .fetch(&format!("{base}service=WPS&request=GetCapabilities"))
        .await
    else {
        return Ok(None);
    };

    let processes = parse_capabilities(&body, &base, limit, prefix)?;
    debug!(url = %base, count = processes.len(), "listed WPS processes");
    Ok(Some(processes))
}

/// Describe one process as an operation with typed ports.
pub async fn describe_process(
    client: &OgcClient,
    url: Option<&str>,
    identifier: &str,
) -> Result<Option<Operation>> {
    let base = client.base_url(url);
    let Some(body) = client
        .fetch(&format!(
            "{base}service=WPS&request=DescribeProcess&identifier={}",
            query_value(identifier)
        ))
        .await
    else {
        return Ok(None);
    };

    parse_description(&body, &base, identifier).map(Some)
}

/// Parse a GetCapabilities document.
pub fn parse_capabilities(
    body: &str,
    url: &str,
    limit: usize,
    prefix: &str,
) -> Result<Vec<Operation>> {
    let doc = xml::parse(body)?;
    let offerings = xml::child(doc.root_element(), "ProcessOfferings")
        .ok_or_else(|| OgcError::unparseable("WPS capabilities", "missing ProcessOfferings"))?;

    let processes = xml::children(offerings, "Process")
        .filter_map(|process| {
            let identifier = xml::text_of(process, "Identifier")?;
            identifier.contains(prefix).then(|| Operation {
                id: identifier.clone(),
                metadata: OperationMetadata {
                    label: identifier,
                    longname: xml::text_of(process, "Title").unwrap_or_default(),
                    resource: Resource::Wps,
                    url: url.to_string(),
                    description: xml::text_of(process, "Abstract").unwrap_or_default(),
                    ..Default::default()
                },
                ..Default::default()
            })
        })
        .take(limit)
        .collect();

    Ok(processes)
}

/// Parse a DescribeProcess document.
pub fn parse_description(body: &str, url: &str, identifier: &str) -> Result<Operation> {
    let doc = xml::parse(body)?;
    let description = xml::child(doc.root_element(), "ProcessDescription").ok_or_else(|| {
        OgcError::unparseable("WPS process description", "missing ProcessDescription")
    })?;

    let inputs: Vec<Port> = xml::child(description, "DataInputs")
        .map(|data_inputs| {
            xml::children(data_inputs, "Input")
                .enumerate()
                .map(|(i, input)| parse_input(i, input))
                .collect()
        })
        .unwrap_or_default();

    let mut outputs: Vec<Port> = xml::child(description, "ProcessOutputs")
        .map(|process_outputs| {
            xml::children(process_outputs, "Output")
                .enumerate()
                .map(|(i, output)| parse_output(i, output))
                .collect()
        })
        .unwrap_or_default();

    if outputs.is_empty() {
        outputs.push(Port::new(0, "", PortType::default()));
    }

    let mut operation = Operation {
        id: identifier.to_string(),
        metadata: OperationMetadata {
            label: identifier.to_string(),
            longname: xml::text_of(description, "Title").unwrap_or_default(),
            description: xml::text_of(description, "Abstract").unwrap_or_default(),
            resource: Resource::Wps,
            url: url.to_string(),
            ..Default::default()
        },
        inputs,
        outputs,
    };
    operation.update_counts();
    Ok(operation)
}

fn parse_input(index: usize, input: Node<'_, '_>) -> Port {
    let mut port = Port::new(
        index,
        xml::text_of(input, "Identifier").unwrap_or_default(),
        PortType::default(),
    );
    port.name = xml::text_of(input, "Title").unwrap_or_default();
    port.description = xml::text_of(input, "Abstract").unwrap_or_default();
    port.optional = xml::attribute(input, "minOccurs") == Some("0");

    if let Some(complex) = xml::child(input, "ComplexData") {
        port.port_type = complex_type(complex);
    }
    if let Some(literal) = xml::child(input, "LiteralData") {
        port.port_type = literal_type(literal);
    }
    port
}

fn parse_output(index: usize, output: Node<'_, '_>) -> Port {
    let title = xml::text_of(output, "Title").unwrap_or_default();
    let mut port = Port::new(
        index,
        xml::text_of(output, "Identifier").unwrap_or_default(),
        PortType::default(),
    );
    port.name = title.clone();
    port.description = title;

    if let Some(complex) = xml::child(output, "ComplexOutput") {
        port.port_type = complex_type(complex);
    }
    if let Some(literal) = xml::child(output, "LiteralOutput") {
        if let Some(data_type) = xml::text_of(literal, "DataType") {
            port.port_type = PortType::from(data_type);
        }
    }
    port
}

/// Port type of a complex input/output from its default mime type.
fn complex_type(complex: Node<'_, '_>) -> PortType {
    let mime = xml::path(complex, &["Default", "Format", "MimeType"])
        .map(xml::text)
        .unwrap_or_default();
    port_type_for_mime(&mime)
}

/// Map a mime type onto the port vocabulary.
pub fn port_type_for_mime(mime: &str) -> PortType {
    if mime.contains("text/xml") || mime.contains("application/json") {
        PortType::Geom
    } else if mime.contains("image") {
        PortType::Coverage
    } else {
        PortType::from(mime)
    }
}

/// Port type of a literal input.
///
/// An explicit datatype wins, then an allowed-value enumeration joined with
/// `|`, then a `reference` attribute, then plain text.
fn literal_type(literal: Node<'_, '_>) -> PortType {
    if let Some(data_type) = xml::text_of(literal, "DataType") {
        return PortType::from(data_type);
    }
    if let Some(allowed) = xml::child(literal, "AllowedValues") {
        let values: Vec<String> = xml::children(allowed, "Value").map(xml::text).collect();
        return PortType::from(values.join("|"));
    }
    if let Some(reference) = xml::attribute(literal, "reference") {
        return PortType::from(reference);
    }
    PortType::Text
}
