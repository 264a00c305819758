//! The per-resource executor seam and its registry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use geoflow_config::GeoflowConfig;
use geoflow_ogc::OgcClient;
use geoflow_publish::{PublisherConfig, RasterPublisher};
use geoflow_types::{Operation, Resource};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::ExecutorError;
use crate::executors::{
    GeoServerExecutor, IlwisExecutor, PollPolicy, RestExecutor, RestfulWpsExecutor, WpsExecutor,
};

/// What one operation produced.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeOutput {
    /// A result document, URL or literal.
    Data(Value),
    /// The service was unavailable or returned nothing.
    Empty,
    /// The service ran the operation and reported failure.
    Failed(String),
}

impl NodeOutput {
    /// The value downstream operations see; `null` unless there is data.
    pub fn value(&self) -> Value {
        match self {
            Self::Data(value) => value.clone(),
            Self::Empty | Self::Failed(_) => Value::Null,
        }
    }
}

/// Runs operations of one resource kind.
#[async_trait]
pub trait OperationExecutor: Send + Sync {
    /// Execute an operation whose input references are already resolved.
    ///
    /// Implementations return [`NodeOutput::Empty`] rather than an error when
    /// the remote service is unreachable or answers with a non-success status.
    async fn execute(
        &self,
        operation: &Operation,
        cancel: &CancellationToken,
    ) -> Result<NodeOutput, ExecutorError>;
}

/// Maps resources to their executors.
#[derive(Clone, Default)]
pub struct ExecutorRegistry {
    executors: HashMap<Resource, Arc<dyn OperationExecutor>>,
}

impl ExecutorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in executor, configured from `config`.
    pub fn standard(client: OgcClient, config: &GeoflowConfig) -> Self {
        let executor = config.executor();
        let publisher = RasterPublisher::new(
            PublisherConfig::from(&config.publisher()),
            client.clone(),
        );

        Self::new()
            .with(Resource::Wps, WpsExecutor::new(client.clone()))
            .with(
                Resource::RestfulWps,
                RestfulWpsExecutor::new(client.clone(), PollPolicy::from(&executor)),
            )
            .with(Resource::Rest, RestExecutor::new(client.clone()))
            .with(
                Resource::Ilwis,
                IlwisExecutor::new(client, executor.ilwis_api.clone()),
            )
            .with(Resource::GeoServer, GeoServerExecutor::new(publisher))
    }

    /// Register an executor, replacing any previous one for `resource`.
    pub fn register(&mut self, resource: Resource, executor: impl OperationExecutor + 'static) {
        self.executors.insert(resource, Arc::new(executor));
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, resource: Resource, executor: impl OperationExecutor + 'static) -> Self {
        self.register(resource, executor);
        self
    }

    pub fn get(&self, resource: &Resource) -> Option<Arc<dyn OperationExecutor>> {
        self.executors.get(resource).cloned()
    }

    pub fn len(&self) -> usize {
        self.executors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }
}

impl std::fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut resources: Vec<&str> = self.executors.keys().map(Resource::as_str).collect();
        resources.sort_unstable();
        f.debug_struct("ExecutorRegistry")
            .field("resources", &resources)
            .finish()
    }
}
