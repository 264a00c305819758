//! Execute command - run a workflow end to end.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use geoflow_pipeline::{ExecutorRegistry, WorkflowExecutor};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, info_span, warn};

use super::{Context, print_json, read_workflow};

/// Arguments for the execute command.
#[derive(Args, Debug)]
pub struct ExecuteArgs {
    /// Workflow JSON file
    pub workflow: PathBuf,

    /// Cancel the run after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Run the execute command.
pub async fn run(args: ExecuteArgs, ctx: &Context) -> Result<()> {
    let mut workflow = read_workflow(&args.workflow)?;
    let registry = ExecutorRegistry::standard(ctx.client()?, &ctx.config);

    let cancel = CancellationToken::new();
    let executor = WorkflowExecutor::new(registry).with_cancellation(cancel.clone());

    let watchdog = {
        let cancel = cancel.clone();
        let timeout = args.timeout.map(Duration::from_secs);
        tokio::spawn(async move {
            let deadline = async {
                match timeout {
                    Some(timeout) => tokio::time::sleep(timeout).await,
                    None => std::future::pending().await,
                }
            };
            tokio::select! {
                _ = tokio::signal::ctrl_c() => warn!("interrupted, cancelling workflow"),
                _ = deadline => warn!("timeout reached, cancelling workflow"),
                _ = cancel.cancelled() => return,
            }
            cancel.cancel();
        })
    };

    let run_id = uuid::Uuid::new_v4();
    let span = info_span!("execute", %run_id, workflow = %workflow.id);
    let result = executor.execute(&mut workflow).instrument(span).await;
    cancel.cancel();
    let _ = watchdog.await;

    let records = result?;
    let failed = records.iter().filter(|r| !r.is_success()).count();
    info!(%run_id, steps = records.len(), failed, "workflow finished");
    print_json(&records)
}
