//! WCS command - describe coverages.

use anyhow::Result;
use clap::Args;
use console::style;
use geoflow_ogc::wcs;

use super::{Context, print_json, unavailable};

/// Arguments for the wcs command.
#[derive(Args, Debug)]
pub struct WcsArgs {
    /// Endpoint URL (default: [ogc].default_url)
    #[arg(long)]
    pub url: Option<String>,

    /// Maximum number of coverages
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Run the wcs command.
pub async fn run(args: WcsArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let limit = args.limit.unwrap_or(ctx.config.ogc().limit);

    let coverages = wcs::describe_coverages(&client, args.url.as_deref(), limit)
        .await?
        .ok_or_else(|| unavailable("WCS", &client.base_url(args.url.as_deref())))?;

    if ctx.json_output {
        return print_json(&coverages);
    }
    for coverage in &coverages {
        println!(
            "{}  {}",
            style(&coverage.name).bold(),
            style(&coverage.title).dim()
        );
    }
    Ok(())
}
