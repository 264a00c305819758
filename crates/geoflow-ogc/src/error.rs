//! Adapter error types.

use thiserror::Error;

/// Adapter error type.
#[derive(Debug, Error)]
pub enum OgcError {
    /// HTTP client construction or transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A document arrived but lacks a branch the adapter requires.
    #[error("unparseable {document} document: {reason}")]
    Unparseable {
        /// Which document was being read.
        document: &'static str,
        /// What was missing or malformed.
        reason: String,
    },

    /// XML could not be parsed or written.
    #[error("XML error: {0}")]
    Xml(String),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The coordinate reference system is not supported.
    #[error("unsupported SRID: {0}")]
    UnsupportedSrid(i32),

    /// An observation timestamp could not be parsed.
    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl OgcError {
    pub(crate) fn unparseable(document: &'static str, reason: impl Into<String>) -> Self {
        Self::Unparseable {
            document,
            reason: reason.into(),
        }
    }
}

impl From<roxmltree::Error> for OgcError {
    fn from(e: roxmltree::Error) -> Self {
        Self::Xml(e.to_string())
    }
}

/// Result type for adapter operations.
pub type Result<T> = std::result::Result<T, OgcError>;
