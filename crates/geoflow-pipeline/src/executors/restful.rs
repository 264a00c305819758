//! OGC API Processes style job submission with bounded polling.

use std::time::Duration;

use async_trait::async_trait;
use geoflow_config::ExecutorSection;
use geoflow_ogc::OgcClient;
use geoflow_types::{Operation, PortType};
use serde_json::{json, Value};
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{reference_url, service_label};
use crate::error::ExecutorError;
use crate::executor::{NodeOutput, OperationExecutor};

const GEOJSON_MIME: &str = "application/vnd.geo+json";

/// How job status is polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// First delay between polls.
    pub initial: Duration,
    /// Delays double up to this bound.
    pub max: Duration,
    /// Give up after this long.
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from(&ExecutorSection::default())
    }
}

impl From<&ExecutorSection> for PollPolicy {
    fn from(section: &ExecutorSection) -> Self {
        Self {
            initial: Duration::from_millis(section.poll_initial_ms),
            max: Duration::from_millis(section.poll_max_ms.max(section.poll_initial_ms)),
            timeout: Duration::from_secs(section.poll_timeout_secs),
        }
    }
}

/// Submits a job to `<url>/jobs`, follows `Location`, polls until done.
#[derive(Debug, Clone)]
pub struct RestfulWpsExecutor {
    client: OgcClient,
    policy: PollPolicy,
}

impl RestfulWpsExecutor {
    pub fn new(client: OgcClient, policy: PollPolicy) -> Self {
        Self { client, policy }
    }

    /// Poll a job until it leaves the running state, times out or is cancelled.
    async fn poll(
        &self,
        status_url: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Value>, ExecutorError> {
        let deadline = Instant::now() + self.policy.timeout;
        let mut delay = self.policy.initial;

        loop {
            if cancel.is_cancelled() {
                return Err(ExecutorError::Cancelled);
            }

            let Some(body) = self.client.fetch(status_url).await else {
                return Ok(None);
            };
            let document: Value = serde_json::from_str(&body)
                .map_err(|e| ExecutorError::invalid_response(status_url, e.to_string()))?;
            let status_info = document
                .get("StatusInfo")
                .cloned()
                .ok_or_else(|| ExecutorError::invalid_response(status_url, "missing StatusInfo"))?;

            let status = status_info
                .get("Status")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if !matches!(status, "Running" | "Accepted") {
                return Ok(Some(status_info));
            }

            if Instant::now() + delay > deadline {
                warn!(url = %status_url, "job did not finish before the poll timeout");
                return Ok(Some(json!({ "Status": "TimedOut" })));
            }

            debug!(url = %status_url, delay_ms = delay.as_millis() as u64, "job running");
            tokio::select! {
                _ = cancel.cancelled() => return Err(ExecutorError::Cancelled),
                _ = sleep(delay) => {}
            }
            delay = (delay * 2).min(self.policy.max);
        }
    }
}

#[async_trait]
impl OperationExecutor for RestfulWpsExecutor {
    async fn execute(
        &self,
        operation: &Operation,
        cancel: &CancellationToken,
    ) -> Result<NodeOutput, ExecutorError> {
        let jobs_url = format!("{}/jobs", operation.metadata.url.trim_end_matches('/'));
        let body = execute_body(operation);

        let Some(submitted) = self
            .client
            .post_full(&jobs_url, "application/json", body.to_string())
            .await
        else {
            return Ok(NodeOutput::Empty);
        };
        let status_url = submitted
            .location
            .ok_or_else(|| ExecutorError::invalid_response(&jobs_url, "missing Location header"))?;

        let Some(status_info) = self.poll(&status_url, cancel).await? else {
            return Ok(NodeOutput::Empty);
        };

        match status_info.get("Status").and_then(Value::as_str) {
            Some("Failed") => return Ok(NodeOutput::Failed("job failed".to_string())),
            Some("TimedOut") => return Ok(NodeOutput::Failed("timed out".to_string())),
            _ => {}
        }

        let results_url = status_info
            .get("Output")
            .and_then(Value::as_str)
            .ok_or_else(|| ExecutorError::invalid_response(&status_url, "missing Output"))?;
        let Some(results) = self.client.fetch(results_url).await else {
            return Ok(NodeOutput::Empty);
        };
        let results: Value = serde_json::from_str(&results)
            .map_err(|e| ExecutorError::invalid_response(results_url, e.to_string()))?;

        results
            .pointer("/Result/Output/0")
            .cloned()
            .map(NodeOutput::Data)
            .ok_or_else(|| ExecutorError::invalid_response(results_url, "missing Result.Output"))
    }
}

/// The JSON Execute document for an operation.
pub fn execute_body(operation: &Operation) -> Value {
    let inputs: Vec<Value> = operation
        .inputs
        .iter()
        .map(|port| match port.port_type {
            PortType::Geom if port.url.is_empty() && !port.is_empty() => json!({
                "ComplexData": { "_mimeType": GEOJSON_MIME, "_text": port.value_text() },
                "_id": port.identifier,
            }),
            PortType::Geom => json!({
                "Reference": { "_mimeType": GEOJSON_MIME, "_href": reference_url(port) },
                "_id": port.identifier,
            }),
            PortType::Coverage => json!({
                "Reference": { "_mimeType": "application/geotif", "_href": reference_url(port) },
                "_id": port.identifier,
            }),
            _ => json!({
                "LiteralData": { "_text": port.value_text() },
                "_id": port.identifier,
            }),
        })
        .collect();

    let outputs: Vec<Value> = operation
        .outputs
        .iter()
        .map(|port| {
            let mime = if port.port_type == PortType::Geom {
                GEOJSON_MIME
            } else {
                "text/plain"
            };
            json!({ "_mimeType": mime, "_id": port.identifier, "_transmission": "value" })
        })
        .collect();

    json!({
        "Execute": {
            "Identifier": service_label(operation),
            "Input": inputs,
            "output": outputs,
            "_version": "2.0.0",
            "_service": "WPS",
        }
    })
}
