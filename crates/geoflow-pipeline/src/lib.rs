//! Workflow execution for geoflow.
//!
//! A workflow runs in three steps:
//!
//! 1. [`execution_order`] checks the graph (unknown endpoints, cycles) and
//!    orders operations so every producer runs before its consumers.
//! 2. [`WorkflowExecutor`] walks that order, substituting output references
//!    in each operation's inputs with what upstream operations produced.
//! 3. Each operation is dispatched through the [`ExecutorRegistry`] to the
//!    [`OperationExecutor`] for its resource (WPS, RESTful WPS, REST, ILWIS,
//!    GeoServer).
//!
//! ```text
//! ┌──────────────┐   order   ┌──────────────────┐  dispatch  ┌──────────────────┐
//! │   Workflow   │ ────────▶ │ WorkflowExecutor │ ─────────▶ │ ExecutorRegistry │
//! └──────────────┘           │ ProducerOutputs  │            │  WPS / REST / …  │
//!                            └──────────────────┘            └──────────────────┘
//! ```
//!
//! Executors fail soft: a node that produced nothing is recorded with a null
//! result (and a reason, when there is one) and execution continues. Graph
//! errors, missing dependencies and cancellation abort the run.

pub mod engine;
pub mod error;
pub mod executor;
pub mod executors;
pub mod order;

pub use engine::{ProducerOutputs, WorkflowExecutor};
pub use error::{ExecutorError, PipelineError, Result};
pub use executor::{ExecutorRegistry, NodeOutput, OperationExecutor};
pub use executors::{
    GeoServerExecutor, IlwisExecutor, PollPolicy, RestExecutor, RestfulWpsExecutor, WpsExecutor,
};
pub use order::execution_order;
