//! Web Coverage Service capability adapter.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::OgcClient;
use crate::error::{OgcError, Result};
use crate::xml;

/// One coverage offered by a WCS endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coverage {
    pub name: String,
    /// GetCoverage request returning a GeoTIFF.
    pub url: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    #[serde(rename = "defaultCRS")]
    pub default_crs: String,
    pub properties: CoverageExtent,
}

/// Lon/lat envelope of a coverage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageExtent {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

/// Describe the coverages a WCS endpoint offers, at most `limit` of them.
pub async fn describe_coverages(
    client: &OgcClient,
    url: Option<&str>,
    limit: usize,
) -> Result<Option<Vec<Coverage>>> {
    let base = client.base_url(url);
    let Some(body) = client
        .fetch(&format!("{base}version=1.0.0&service=WCS&request=DescribeCoverage"))
        .await
    else {
        return Ok(None);
    };

    let coverages = parse_description(&body, &base, limit)?;
    debug!(url = %base, count = coverages.len(), "described WCS coverages");
    Ok(Some(coverages))
}

/// Parse a WCS 1.0.0 DescribeCoverage document.
pub fn parse_description(body: &str, url: &str, limit: usize) -> Result<Vec<Coverage>> {
    let doc = xml::parse(body)?;
    let root = doc.root_element();
    if root.tag_name().name() != "CoverageDescription" {
        return Err(OgcError::unparseable(
            "WCS coverage description",
            format!("unexpected root element {}", root.tag_name().name()),
        ));
    }

    xml::children(root, "CoverageOffering")
        .take(limit)
        .map(|offering| {
            let name = xml::text_of(offering, "name").unwrap_or_default();
            let envelope = xml::child(offering, "lonLatEnvelope").ok_or_else(|| {
                OgcError::unparseable("WCS coverage description", format!("{name}: missing lonLatEnvelope"))
            })?;

            let corners: Vec<[f64; 2]> = xml::children(envelope, "pos")
                .map(|pos| parse_pos(&xml::text(pos)))
                .collect::<Option<_>>()
                .ok_or_else(|| {
                    OgcError::unparseable("WCS coverage description", format!("{name}: malformed gml:pos"))
                })?;
            let [min, max] = corners.as_slice() else {
                return Err(OgcError::unparseable(
                    "WCS coverage description",
                    format!("{name}: expected two envelope corners"),
                ));
            };

            Ok(Coverage {
                url: format!(
                    "{url}version=2.0.0&service=WCS&request=GetCoverage&coverageId={name}&format=image/geotiff"
                ),
                title: xml::text_of(offering, "label").unwrap_or_default(),
                abstract_text: xml::text_of(offering, "description").unwrap_or_default(),
                default_crs: xml::attribute(envelope, "srsName")
                    .unwrap_or_default()
                    .to_string(),
                properties: CoverageExtent {
                    min: *min,
                    max: *max,
                },
                name,
            })
        })
        .collect()
}

fn parse_pos(text: &str) -> Option<[f64; 2]> {
    let mut parts = text.split_whitespace().map(str::parse::<f64>);
    match (parts.next(), parts.next()) {
        (Some(Ok(x)), Some(Ok(y))) => Some([x, y]),
        _ => None,
    }
}
