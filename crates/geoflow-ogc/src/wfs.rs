//! Web Feature Service capability adapter.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::OgcClient;
use crate::error::{OgcError, Result};
use crate::xml;

/// One feature type (layer) offered by a WFS endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureType {
    pub name: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    #[serde(rename = "defaultCRS")]
    pub default_crs: String,
    /// Ready-to-use GetFeature request returning GeoJSON.
    pub url: String,
}

/// List the feature types a WFS endpoint offers, at most `limit` of them.
pub async fn list_feature_types(
    client: &OgcClient,
    url: Option<&str>,
    limit: usize,
) -> Result<Option<Vec<FeatureType>>> {
    let base = client.base_url(url);
    let Some(body) = client
        .fetch(&format!("{base}service=WFS&request=GetCapabilities"))
        .await
    else {
        return Ok(None);
    };

    let features = parse_capabilities(&body, &base, limit)?;
    debug!(url = %base, count = features.len(), "listed WFS feature types");
    Ok(Some(features))
}

/// Parse a WFS GetCapabilities document.
///
/// MapServer deployments only understand `outputFormat=geojson` and serve
/// their native projection unless asked, so their GetFeature URLs pin
/// EPSG:3857.
pub fn parse_capabilities(body: &str, url: &str, limit: usize) -> Result<Vec<FeatureType>> {
    let doc = xml::parse(body)?;
    let list = xml::child(doc.root_element(), "FeatureTypeList")
        .ok_or_else(|| OgcError::unparseable("WFS capabilities", "missing FeatureTypeList"))?;

    let format = if url.contains("mapserv") {
        "outputFormat=geojson&srsname=EPSG:3857"
    } else {
        "outputFormat=application/json"
    };

    let features = xml::children(list, "FeatureType")
        .take(limit)
        .map(|row| {
            let name = xml::text_of(row, "Name").unwrap_or_default();
            FeatureType {
                url: format!("{url}service=WFS&request=GetFeature&typeName={name}&{format}"),
                title: xml::text_of(row, "Title").unwrap_or_default(),
                abstract_text: xml::text_of(row, "Abstract").unwrap_or_default(),
                default_crs: xml::text_of(row, "DefaultCRS")
                    .or_else(|| xml::text_of(row, "DefaultSRS"))
                    .unwrap_or_default(),
                name,
            }
        })
        .collect();

    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAPABILITIES: &str = r#"<?xml version="1.0"?>
<wfs:WFS_Capabilities xmlns:wfs="http://www.opengis.net/wfs/2.0">
  <FeatureTypeList>
    <FeatureType>
      <Name>mara:rivers</Name>
      <Title>Rivers</Title>
      <Abstract>River network</Abstract>
      <DefaultCRS>urn:ogc:def:crs:EPSG::4326</DefaultCRS>
    </FeatureType>
    <FeatureType>
      <Name>mara:roads</Name>
      <Title>Roads</Title>
      <DefaultSRS>EPSG:32736</DefaultSRS>
    </FeatureType>
  </FeatureTypeList>
</wfs:WFS_Capabilities>"#;

    #[test]
    fn test_parse_feature_types() {
        let features = parse_capabilities(CAPABILITIES, "http://h/ows?", 10).unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].name, "mara:rivers");
        assert_eq!(features[0].abstract_text, "River network");
        assert_eq!(
            features[0].url,
            "http://h/ows?service=WFS&request=GetFeature&typeName=mara:rivers&outputFormat=application/json"
        );
        assert_eq!(features[1].default_crs, "EPSG:32736");
        assert_eq!(features[1].abstract_text, "");
    }

    #[test]
    fn test_mapserver_output_format() {
        let features =
            parse_capabilities(CAPABILITIES, "http://h/cgi-bin/mapserv?map=a&", 1).unwrap();
        assert_eq!(features.len(), 1);
        assert!(features[0]
            .url
            .ends_with("&outputFormat=geojson&srsname=EPSG:3857"));
    }

    #[test]
    fn test_serialized_field_names() {
        let features = parse_capabilities(CAPABILITIES, "http://h/ows?", 1).unwrap();
        let json = serde_json::to_value(&features[0]).unwrap();
        assert!(json.get("defaultCRS").is_some());
        assert!(json.get("abstract").is_some());
    }
}
