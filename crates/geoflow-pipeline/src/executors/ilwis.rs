//! ILWIS processing engine over its REST endpoint.

use async_trait::async_trait;
use geoflow_ogc::OgcClient;
use geoflow_types::Operation;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::service_label;
use crate::error::ExecutorError;
use crate::executor::{NodeOutput, OperationExecutor};

/// Characters left unescaped in path segments: unreserved plus `/`.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

/// Runs `GET <url>/execute/<inputs>/<label>` and resolves the result path.
#[derive(Debug, Clone)]
pub struct IlwisExecutor {
    client: OgcClient,
    api_base: String,
}

impl IlwisExecutor {
    /// `api_base` is prefixed to the path ILWIS reports for its result.
    pub fn new(client: OgcClient, api_base: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into(),
        }
    }
}

#[async_trait]
impl OperationExecutor for IlwisExecutor {
    async fn execute(
        &self,
        operation: &Operation,
        _cancel: &CancellationToken,
    ) -> Result<NodeOutput, ExecutorError> {
        let url = format!(
            "{}/execute/{}/{}",
            operation.metadata.url.trim_end_matches('/'),
            encode_segment(operation),
            service_label(operation)
        );

        let Some(body) = self.client.fetch(&url).await else {
            return Ok(NodeOutput::Empty);
        };
        let document: Value = serde_json::from_str(&body)
            .map_err(|e| ExecutorError::invalid_response(&url, e.to_string()))?;
        let path = document
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| ExecutorError::invalid_response(&url, "missing path"))?;

        Ok(NodeOutput::Data(Value::String(format!(
            "{}{path}",
            self.api_base
        ))))
    }
}

/// Encode an operation's inputs as one path segment.
///
/// Map inputs are escaped and joined by `;`, other inputs joined by `$`, and
/// the two lists joined by the literal `textinputs` before escaping again.
pub fn encode_segment(operation: &Operation) -> String {
    let mut maps = Vec::new();
    let mut texts = Vec::new();
    for port in &operation.inputs {
        if port.port_type.is_spatial() {
            maps.push(quote(&port.value_text()));
        } else {
            texts.push(port.value_text());
        }
    }
    quote(&format!("{}textinputs{}", maps.join(";"), texts.join("$")))
}

fn quote(s: &str) -> String {
    utf8_percent_encode(s, SEGMENT).to_string()
}
