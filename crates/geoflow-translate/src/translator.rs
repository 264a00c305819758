//! Format-to-format translation.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use geoflow_types::Workflow;

use crate::catalog::Catalog;
use crate::error::{Result, TranslateError};
use crate::ilwis;
use crate::qgis::{self, QgisModel};

/// A workflow document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// The geoflow workflow JSON.
    Native,
    /// A QGIS processing model.
    Qgis,
    /// An ILWIS workflow (import only).
    Ilwis,
}

impl FromStr for Format {
    type Err = TranslateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "native" | "geoflow" => Ok(Self::Native),
            "qgis" => Ok(Self::Qgis),
            "ilwis" => Ok(Self::Ilwis),
            _ => Err(TranslateError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Native => "native",
            Self::Qgis => "qgis",
            Self::Ilwis => "ilwis",
        })
    }
}

/// Translates workflows using a shared catalog.
#[derive(Debug, Clone)]
pub struct Translator {
    catalog: Arc<Catalog>,
}

impl Translator {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Native workflow → QGIS model.
    pub fn to_qgis(&self, workflow: &Workflow) -> Result<QgisModel> {
        qgis::to_qgis(workflow, &self.catalog)
    }

    /// QGIS model → native workflow.
    pub fn from_qgis(&self, model: &QgisModel) -> Result<Workflow> {
        qgis::from_qgis(model, &self.catalog)
    }

    /// ILWIS workflow JSON → native workflow.
    pub fn from_ilwis(&self, json: &str) -> Result<Workflow> {
        ilwis::from_ilwis(json)
    }

    /// Read a document in one format.
    pub fn read(&self, input: &str, format: Format) -> Result<Workflow> {
        match format {
            Format::Native => Ok(Workflow::from_json(input)?),
            Format::Qgis => self.from_qgis(&serde_json::from_str(input)?),
            Format::Ilwis => self.from_ilwis(input),
        }
    }

    /// Translate a document between formats, returning pretty JSON.
    pub fn translate(&self, input: &str, from: Format, to: Format) -> Result<String> {
        let workflow = self.read(input, from)?;
        let output = match to {
            Format::Native => serde_json::to_string_pretty(&workflow)?,
            Format::Qgis => serde_json::to_string_pretty(&self.to_qgis(&workflow)?)?,
            Format::Ilwis => return Err(TranslateError::UnsupportedTarget(to.to_string())),
        };
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translator() -> Translator {
        Translator::new(Arc::new(Catalog::builtin().unwrap()))
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("QGIS".parse::<Format>().unwrap(), Format::Qgis);
        assert_eq!("native".parse::<Format>().unwrap(), Format::Native);
        assert!(matches!(
            "arcgis".parse::<Format>(),
            Err(TranslateError::UnknownFormat(_))
        ));
        assert_eq!(Format::Ilwis.to_string(), "ilwis");
    }

    #[test]
    fn test_ilwis_is_not_a_target() {
        let result = translator().translate(r#"{"id": 1}"#, Format::Native, Format::Ilwis);
        assert!(matches!(result, Err(TranslateError::UnsupportedTarget(_))));
    }

    #[test]
    fn test_native_passthrough() {
        let output = translator()
            .translate(
                r#"{"workflows": [{"id": 3, "metadata": {"longname": "empty"}}]}"#,
                Format::Native,
                Format::Native,
            )
            .unwrap();
        let workflow = Workflow::from_json(&output).unwrap();
        assert_eq!(workflow.id, "3");
        assert_eq!(workflow.metadata.longname, "empty");
    }
}
