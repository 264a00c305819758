//! Operation ports and their data types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kind of data a port carries.
///
/// Capability documents surface arbitrary type strings (enumerations such as
/// `"EPSG:4326|EPSG:3857"`, XML schema datatypes, mime types); those are kept
/// verbatim in [`PortType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PortType {
    /// Vector data (GeoJSON / GML).
    Geom,
    /// Raster data.
    Coverage,
    /// Free text literal.
    Text,
    /// Any other type string, preserved as received.
    Other(String),
}

impl PortType {
    /// The wire representation of this type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Geom => "geom",
            Self::Coverage => "coverage",
            Self::Text => "text",
            Self::Other(s) => s,
        }
    }

    /// Whether the port carries spatial data (vector or raster).
    pub fn is_spatial(&self) -> bool {
        matches!(self, Self::Geom | Self::Coverage)
    }
}

impl Default for PortType {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for PortType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "geom" => Self::Geom,
            "coverage" => Self::Coverage,
            "text" => Self::Text,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for PortType {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<PortType> for String {
    fn from(t: PortType) -> Self {
        match t {
            PortType::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for PortType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An input or output slot on an operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Port {
    /// Position of the port within its operation.
    #[serde(deserialize_with = "crate::serde_util::index")]
    pub id: usize,
    /// Human-readable name.
    pub name: String,
    /// Identifier the remote service knows the parameter by.
    pub identifier: String,
    /// Data type.
    #[serde(rename = "type")]
    pub port_type: PortType,
    /// Literal value, inline document, or an unresolved output reference.
    pub value: Value,
    /// Reference URL used instead of an inline value.
    pub url: String,
    pub description: String,
    #[serde(deserialize_with = "crate::serde_util::flag")]
    pub optional: bool,
}

impl Port {
    /// Create a port with the given index, identifier and type.
    pub fn new(id: usize, identifier: impl Into<String>, port_type: PortType) -> Self {
        let identifier = identifier.into();
        Self {
            id,
            name: identifier.clone(),
            identifier,
            port_type,
            value: Value::String(String::new()),
            ..Default::default()
        }
    }

    /// Set the port's value.
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = value.into();
        self
    }

    /// Set the port's reference URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Whether the value is missing (null or an empty string).
    pub fn is_empty(&self) -> bool {
        match &self.value {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// The value rendered as plain text.
    ///
    /// Strings are returned without quotes; documents are serialized as JSON.
    pub fn value_text(&self) -> String {
        match &self.value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_type_round_trip() {
        for raw in ["geom", "coverage", "text", "xs:double", "EPSG:4326|EPSG:3857", ""] {
            let parsed = PortType::from(raw);
            assert_eq!(String::from(parsed), raw);
        }
        assert_eq!(PortType::from("geom"), PortType::Geom);
        assert_eq!(
            PortType::from("image/png"),
            PortType::Other("image/png".into())
        );
    }

    #[test]
    fn test_port_deserializes_with_missing_fields() {
        let port: Port = serde_json::from_str(r#"{"id": "1", "type": "coverage"}"#).unwrap();
        assert_eq!(port.id, 1);
        assert_eq!(port.port_type, PortType::Coverage);
        assert!(port.is_empty());
        assert!(!port.optional);
    }

    #[test]
    fn test_value_text() {
        let port = Port::new(0, "features", PortType::Geom)
            .with_value(serde_json::json!({"type": "FeatureCollection"}));
        assert!(!port.is_empty());
        assert_eq!(port.value_text(), r#"{"type":"FeatureCollection"}"#);

        let literal = Port::new(1, "distance", PortType::Text).with_value("10");
        assert_eq!(literal.value_text(), "10");
    }
}
