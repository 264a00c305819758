//! WPS command - list and describe processes.

use anyhow::Result;
use clap::{Args, Subcommand};
use console::style;
use geoflow_ogc::wps;

use super::{Context, print_json, unavailable};

/// Arguments for the wps command.
#[derive(Args, Debug)]
pub struct WpsArgs {
    #[command(subcommand)]
    pub command: WpsCommand,
}

#[derive(Subcommand, Debug)]
pub enum WpsCommand {
    /// List the processes an endpoint offers
    List {
        /// Endpoint URL (default: [ogc].default_url)
        #[arg(long)]
        url: Option<String>,

        /// Maximum number of processes
        #[arg(long)]
        limit: Option<usize>,

        /// Only identifiers containing this prefix (default: [ogc].wps_prefix)
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Describe one process with its typed ports
    Describe {
        /// Process identifier, e.g. gs:Clip
        identifier: String,

        /// Endpoint URL (default: [ogc].default_url)
        #[arg(long)]
        url: Option<String>,
    },
}

/// Run the wps command.
pub async fn run(args: WpsArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let ogc = ctx.config.ogc();

    match args.command {
        WpsCommand::List { url, limit, prefix } => {
            let prefix = prefix.unwrap_or(ogc.wps_prefix);
            let processes =
                wps::list_processes(&client, url.as_deref(), limit.unwrap_or(ogc.limit), &prefix)
                    .await?
                    .ok_or_else(|| unavailable("WPS", &client.base_url(url.as_deref())))?;

            if ctx.json_output {
                return print_json(&processes);
            }
            for process in &processes {
                println!(
                    "{}  {}",
                    style(&process.id).bold(),
                    style(&process.metadata.longname).dim()
                );
            }
            Ok(())
        }
        WpsCommand::Describe { identifier, url } => {
            let operation = wps::describe_process(&client, url.as_deref(), &identifier)
                .await?
                .ok_or_else(|| unavailable("WPS", &client.base_url(url.as_deref())))?;
            print_json(&operation)
        }
    }
}
