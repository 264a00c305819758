//! The operation catalog: what each external tool offers.

use std::path::Path;

use geoflow_types::PortType;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TranslateError};

const BUILTIN: &str = include_str!("../catalog/builtin.toml");

/// Name of the QGIS section in the catalog.
pub const QGIS_TOOL: &str = "qgis";

/// Immutable catalog of algorithms by tool, in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub tools: Vec<ToolCatalog>,
}

/// Algorithms offered by one tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCatalog {
    pub name: String,
    #[serde(default)]
    pub entries: Vec<CatalogEntry>,
}

/// One algorithm.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Name the tool's console knows the algorithm by, e.g. `gdal:slope`.
    pub console_name: String,
    pub label: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<CatalogOutput>,
}

/// A declared output in the tool's own vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogOutput {
    #[serde(rename = "type")]
    pub output_type: String,
}

impl CatalogEntry {
    /// The entry's first output mapped onto port types.
    pub fn output_port_type(&self) -> PortType {
        match self.outputs.first().map(|o| o.output_type.as_str()) {
            Some("raster") => PortType::Coverage,
            Some("vector") => PortType::Geom,
            _ => PortType::Text,
        }
    }
}

impl Catalog {
    /// The catalog shipped with geoflow.
    pub fn builtin() -> Result<Self> {
        Self::from_toml(BUILTIN)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a catalog file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| TranslateError::ReadCatalog {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Load `path` when given, the built-in catalog otherwise.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::builtin(),
        }
    }

    pub fn tool(&self, name: &str) -> Result<&ToolCatalog> {
        self.tools
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| TranslateError::UnknownTool(name.to_string()))
    }
}

impl ToolCatalog {
    /// Find an entry by console name.
    pub fn entry(&self, console_name: &str) -> Result<&CatalogEntry> {
        self.entries
            .iter()
            .find(|e| e.console_name == console_name)
            .ok_or_else(|| TranslateError::UnknownConsoleName(console_name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_parses() {
        let catalog = Catalog::builtin().unwrap();
        let qgis = catalog.tool(QGIS_TOOL).unwrap();
        assert!(qgis.entries.len() > 10);
        let slope = qgis.entry("gdal:slope").unwrap();
        assert_eq!(slope.output_port_type(), PortType::Coverage);
        assert!(qgis.entries.iter().all(|e| !e.keywords.is_empty()));
    }

    #[test]
    fn test_unknown_lookups() {
        let catalog = Catalog::builtin().unwrap();
        assert!(matches!(
            catalog.tool("arcgis"),
            Err(TranslateError::UnknownTool(_))
        ));
        assert!(matches!(
            catalog.tool(QGIS_TOOL).unwrap().entry("native:nothing"),
            Err(TranslateError::UnknownConsoleName(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.toml");
        std::fs::write(
            &path,
            r#"
[[tools]]
name = "qgis"

[[tools.entries]]
console_name = "native:buffer"
label = "Buffer"
keywords = ["buffer"]
outputs = [{ type = "vector" }]
"#,
        )
        .unwrap();

        let catalog = Catalog::load_or_builtin(Some(&path)).unwrap();
        let entry = catalog.tool("qgis").unwrap().entry("native:buffer").unwrap();
        assert_eq!(entry.output_port_type(), PortType::Geom);
    }

    #[test]
    fn test_invalid_catalog() {
        assert!(matches!(
            Catalog::from_toml("tools = 3"),
            Err(TranslateError::Catalog(_))
        ));
        let missing = Catalog::load(Path::new("/nonexistent/catalog.toml"));
        assert!(matches!(missing, Err(TranslateError::ReadCatalog { .. })));
    }
}
