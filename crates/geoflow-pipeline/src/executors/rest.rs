//! Plain JSON POST of the operation document.

use async_trait::async_trait;
use geoflow_ogc::OgcClient;
use geoflow_types::Operation;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::ExecutorError;
use crate::executor::{NodeOutput, OperationExecutor};

#[derive(Debug, Clone)]
pub struct RestExecutor {
    client: OgcClient,
}

impl RestExecutor {
    pub fn new(client: OgcClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OperationExecutor for RestExecutor {
    async fn execute(
        &self,
        operation: &Operation,
        _cancel: &CancellationToken,
    ) -> Result<NodeOutput, ExecutorError> {
        let url = &operation.metadata.url;
        let body = serde_json::to_string(operation)
            .map_err(|e| ExecutorError::InvalidOperation(e.to_string()))?;

        let Some(response) = self.client.post_full(url, "application/json", body).await else {
            return Ok(NodeOutput::Empty);
        };
        if response.body.trim().is_empty() {
            return Ok(NodeOutput::Empty);
        }

        let document: Value = serde_json::from_str(&response.body)
            .map_err(|e| ExecutorError::invalid_response(url, e.to_string()))?;
        Ok(NodeOutput::Data(document))
    }
}
