//! Translation between geoflow workflows and external tool formats.
//!
//! - native ↔ QGIS processing model, matched through a keyword [`Catalog`]
//! - ILWIS workflow → native
//!
//! ```no_run
//! use std::sync::Arc;
//! use geoflow_translate::{Catalog, Format, Translator};
//!
//! # fn main() -> geoflow_translate::Result<()> {
//! let translator = Translator::new(Arc::new(Catalog::builtin()?));
//! let model = translator.translate(r#"{"id": 1}"#, Format::Native, Format::Qgis)?;
//! println!("{model}");
//! # Ok(())
//! # }
//! ```

pub mod catalog;
mod error;
pub mod ilwis;
pub mod matching;
pub mod qgis;
mod translator;

pub use catalog::{Catalog, CatalogEntry, CatalogOutput, ToolCatalog};
pub use error::{Result, TranslateError};
pub use qgis::{AlgorithmSource, ModelInput, ModelOutput, QgisAlgorithm, QgisModel};
pub use translator::{Format, Translator};
