//! Error types for workflow translation.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for translation.
pub type Result<T> = std::result::Result<T, TranslateError>;

/// Errors that can occur while translating a workflow.
///
/// Translation works on caller-supplied documents, so every problem is a
/// hard failure.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// No catalog entry matches an operation.
    #[error("No catalog entry matches operation {operation}")]
    NoCatalogMatch { operation: String },

    /// A model references an algorithm the catalog does not know.
    #[error("Unknown console name: {0}")]
    UnknownConsoleName(String),

    /// The catalog has no section for a tool.
    #[error("Catalog has no entries for tool '{0}'")]
    UnknownTool(String),

    /// The requested conversion is not offered.
    #[error("Cannot translate to {0}")]
    UnsupportedTarget(String),

    /// The format name is not recognised.
    #[error("Unknown workflow format '{0}' (expected native, qgis or ilwis)")]
    UnknownFormat(String),

    /// The input document is structurally wrong.
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// The catalog file could not be parsed.
    #[error("Invalid catalog: {0}")]
    Catalog(#[from] toml::de::Error),

    /// The catalog file could not be read.
    #[error("Failed to read catalog {path}: {source}")]
    ReadCatalog {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Workflow model violation.
    #[error(transparent)]
    Model(#[from] geoflow_types::ModelError),
}
