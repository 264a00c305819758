//! Workflow executor: ordered, sequential execution with output substitution.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use geoflow_types::{ExecutionRecord, OperationId, OutputReference, Workflow};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{ExecutorError, PipelineError, Result};
use crate::executor::{ExecutorRegistry, NodeOutput};
use crate::order::execution_order;

/// Outputs recorded so far in one run, by producer and output index.
#[derive(Debug, Clone, Default)]
pub struct ProducerOutputs {
    outputs: HashMap<OperationId, Vec<Value>>,
}

impl ProducerOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a producer's outputs, replacing earlier ones.
    pub fn record(&mut self, operation: impl Into<OperationId>, outputs: Vec<Value>) {
        self.outputs.insert(operation.into(), outputs);
    }

    pub fn has_run(&self, operation: &str) -> bool {
        self.outputs.contains_key(operation)
    }

    /// Look up the value a reference points at.
    ///
    /// Executors return one document per operation, so a producer with a
    /// single recorded output answers every index with it.
    pub fn resolve(&self, reference: &OutputReference) -> Option<&Value> {
        let outputs = self.outputs.get(&reference.operation)?;
        match outputs.as_slice() {
            [only] => Some(only),
            many => many.get(reference.output),
        }
    }
}

/// Runs workflows one operation at a time.
#[derive(Debug, Clone)]
pub struct WorkflowExecutor {
    registry: Arc<ExecutorRegistry>,
    cancel: CancellationToken,
}

impl WorkflowExecutor {
    pub fn new(registry: ExecutorRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that cancels runs of this executor.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Execute a workflow and return one record per operation, in run order.
    ///
    /// Input references are replaced in place with the values they resolve
    /// to. An operation that produced nothing is recorded with `null` data and
    /// later operations still run.
    pub async fn execute(&self, workflow: &mut Workflow) -> Result<Vec<ExecutionRecord>> {
        let order = execution_order(workflow)?;
        let known: HashSet<OperationId> =
            workflow.operations.iter().map(|op| op.id.clone()).collect();
        let mut outputs = ProducerOutputs::new();
        let mut records = Vec::with_capacity(order.len());

        for id in order {
            if self.cancel.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }

            let operation = workflow
                .operation_mut(&id)
                .ok_or_else(|| PipelineError::UnknownOperation(id.clone()))?;

            for port in &mut operation.inputs {
                let Some(reference) = OutputReference::from_value(&port.value) else {
                    continue;
                };
                if !known.contains(&reference.operation) {
                    continue;
                }
                let value = outputs.resolve(&reference).ok_or_else(|| {
                    PipelineError::DependencyMissing {
                        operation: id.clone(),
                        producer: reference.operation.clone(),
                        output: reference.output,
                    }
                })?;
                port.value = value.clone();
            }

            let resource = operation.metadata.resource.clone();
            info!(operation = %id, resource = %resource, "executing operation");

            let result = match self.registry.get(&resource) {
                Some(executor) => executor.execute(operation, &self.cancel).await,
                None => Err(ExecutorError::UnsupportedResource(resource.to_string())),
            };

            let (output, error) = match result {
                Ok(NodeOutput::Failed(reason)) => (NodeOutput::Empty, Some(reason)),
                Ok(output) => (output, None),
                Err(ExecutorError::Cancelled) => return Err(PipelineError::Cancelled),
                Err(e) => (NodeOutput::Empty, Some(e.to_string())),
            };
            if let Some(reason) = &error {
                warn!(operation = %id, error = %reason, "operation produced no output");
            }

            let data = output.value();
            outputs.record(id.clone(), vec![data.clone()]);
            records.push(ExecutionRecord {
                id,
                output_type: operation.primary_output_type(),
                data,
                error,
            });
        }

        Ok(records)
    }
}
