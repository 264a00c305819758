//! SOS command - offerings and observation series.

use anyhow::Result;
use clap::{Args, Subcommand};
use console::style;
use geoflow_ogc::sos;

use super::{Context, print_json, unavailable};

/// Arguments for the sos command.
#[derive(Args, Debug)]
pub struct SosArgs {
    #[command(subcommand)]
    pub command: SosCommand,
}

#[derive(Subcommand, Debug)]
pub enum SosCommand {
    /// List observation offerings with their located stations
    Capabilities {
        /// Endpoint URL (default: [ogc].sos_url)
        #[arg(long)]
        url: Option<String>,

        /// Maximum number of offerings
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Fetch an observation series from a GetObservation URL
    Observations {
        /// Full GetObservation request URL
        url: String,
    },
}

/// Run the sos command.
pub async fn run(args: SosArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let ogc = ctx.config.ogc();

    match args.command {
        SosCommand::Capabilities { url, limit } => {
            let url = url.unwrap_or(ogc.sos_url);
            let offerings = sos::get_capabilities(
                &client,
                Some(&url),
                limit.unwrap_or(ogc.limit),
                &ogc.sos_offerings,
            )
            .await?
            .ok_or_else(|| unavailable("SOS", &url))?;

            if ctx.json_output {
                return print_json(&offerings);
            }
            for offering in &offerings {
                println!(
                    "{}  {} ({} stations)",
                    style(&offering.offering).bold(),
                    style(&offering.observed_property).dim(),
                    offering.features_of_interest.len()
                );
            }
            Ok(())
        }
        SosCommand::Observations { url } => {
            let series = sos::get_observations(&client, &url)
                .await?
                .ok_or_else(|| unavailable("SOS", &url))?;
            print_json(&series)
        }
    }
}
