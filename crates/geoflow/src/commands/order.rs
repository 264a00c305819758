//! Order command - print a workflow's execution order.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use console::style;
use geoflow_pipeline::execution_order;

use super::{Context, print_json, read_workflow};

/// Arguments for the order command.
#[derive(Args, Debug)]
pub struct OrderArgs {
    /// Workflow JSON file
    pub workflow: PathBuf,
}

/// Run the order command.
pub async fn run(args: OrderArgs, ctx: &Context) -> Result<()> {
    let workflow = read_workflow(&args.workflow)?;
    let order = execution_order(&workflow)?;

    if ctx.json_output {
        return print_json(&order);
    }
    for (step, id) in order.iter().enumerate() {
        let label = workflow
            .operation(id)
            .map(|op| op.metadata.label.as_str())
            .unwrap_or_default();
        println!(
            "{:>3}. {}  {}",
            step + 1,
            style(id).bold(),
            style(label).dim()
        );
    }
    Ok(())
}
