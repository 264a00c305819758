//! Raster publishing as a workflow step.

use async_trait::async_trait;
use geoflow_publish::{PublishRequest, RasterPublisher};
use geoflow_types::Operation;
use tokio_util::sync::CancellationToken;

use crate::error::ExecutorError;
use crate::executor::{NodeOutput, OperationExecutor};

/// Publishes the raster named by the operation's first input.
#[derive(Debug, Clone)]
pub struct GeoServerExecutor {
    publisher: RasterPublisher,
}

impl GeoServerExecutor {
    pub fn new(publisher: RasterPublisher) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl OperationExecutor for GeoServerExecutor {
    async fn execute(
        &self,
        operation: &Operation,
        _cancel: &CancellationToken,
    ) -> Result<NodeOutput, ExecutorError> {
        let request = PublishRequest::from_operation(operation)?;
        let layer = self.publisher.publish(&request).await?;
        let value = serde_json::to_value(&layer)
            .map_err(|e| ExecutorError::InvalidOperation(e.to_string()))?;
        Ok(NodeOutput::Data(value))
    }
}
