//! Error types for raster publishing.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while publishing a raster.
#[derive(Debug, Error)]
pub enum PublishError {
    /// A required operation input is missing or empty.
    #[error("missing input: {0}")]
    MissingInput(String),

    /// The source raster could not be downloaded.
    #[error("failed to download raster from {0}")]
    Download(String),

    /// The raster could not be decoded.
    #[error("raster error: {0}")]
    Raster(String),

    /// The style document could not be written.
    #[error("style error: {0}")]
    Style(String),

    /// The publishing tool could not be started.
    #[error("failed to start publishing tool '{command}': {source}")]
    ToolSpawn {
        command: String,
        source: std::io::Error,
    },

    /// The publishing tool ran and reported failure.
    #[error("publishing tool exited with status {status}: {stderr}")]
    ToolFailed { status: i32, stderr: String },

    /// The publishing tool did not finish in time.
    #[error("publishing tool timed out after {0:?}")]
    ToolTimeout(Duration),

    /// The layer was published but its extent could not be computed.
    #[error("layer {layer} published but report generation failed: {reason}")]
    Report { layer: String, reason: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PublishError {
    /// Whether the layer reached the map server despite the error.
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Report { .. })
    }
}

impl From<tiff::TiffError> for PublishError {
    fn from(e: tiff::TiffError) -> Self {
        Self::Raster(e.to_string())
    }
}

/// Result type for publishing operations.
pub type PublishResult<T> = std::result::Result<T, PublishError>;
