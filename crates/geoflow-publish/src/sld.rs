//! Styled Layer Descriptor generation.

use geoflow_ogc::XmlElement;

use crate::classify::{format_quantity, ColorMapEntry};
use crate::error::{PublishError, PublishResult};

const STYLE_NAME: &str = "raster_style";

/// Render an interval color map as an SLD 1.0 document.
pub fn style_document(entries: &[ColorMapEntry]) -> PublishResult<String> {
    let mut color_map = XmlElement::new("ColorMap").attr("type", "intervals");
    for entry in entries {
        color_map.push(
            XmlElement::new("ColorMapEntry")
                .attr("color", entry.color.as_str())
                .attr("quantity", format_quantity(entry.quantity))
                .attr("label", entry.label())
                .attr("opacity", format_opacity(entry.opacity)),
        );
    }

    let rule = XmlElement::new("Rule")
        .child(XmlElement::new("Name").text("Rule1"))
        .child(XmlElement::new("Title").text("Raster_style"))
        .child(XmlElement::new("Abstract").text("Raster with different classes"))
        .child(
            XmlElement::new("RasterSymbolizer")
                .child(XmlElement::new("Opacity").text("1"))
                .child(color_map),
        );

    let root = XmlElement::new("StyledLayerDescriptor")
        .attr("version", "1.0.0")
        .attr("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance")
        .attr("xmlns", "http://www.opengis.net/sld")
        .attr("xmlns:ogc", "http://www.opengis.net/ogc")
        .attr("xmlns:xlink", "http://www.w3.org/1999/xlink")
        .attr(
            "xsi:schemaLocation",
            "http://www.opengis.net/sld StyledLayerDescriptor.xsd",
        )
        .child(
            XmlElement::new("NamedLayer")
                .child(XmlElement::new("Name").text(STYLE_NAME))
                .child(
                    XmlElement::new("UserStyle")
                        .child(XmlElement::new("Title").text(STYLE_NAME))
                        .child(
                            XmlElement::new("Abstract")
                                .text("Automatically generated raster styles"),
                        )
                        .child(XmlElement::new("FeatureTypeStyle").child(rule)),
                ),
        );

    root.to_xml_string()
        .map_err(|e| PublishError::Style(e.to_string()))
}

fn format_opacity(opacity: f64) -> &'static str {
    if opacity == 0.0 { "0" } else { "1" }
}
