//! WFS command - list feature types.

use anyhow::Result;
use clap::Args;
use console::style;
use geoflow_ogc::wfs;

use super::{Context, print_json, unavailable};

/// Arguments for the wfs command.
#[derive(Args, Debug)]
pub struct WfsArgs {
    /// Endpoint URL (default: [ogc].default_url)
    #[arg(long)]
    pub url: Option<String>,

    /// Maximum number of feature types
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Run the wfs command.
pub async fn run(args: WfsArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let limit = args.limit.unwrap_or(ctx.config.ogc().limit);

    let feature_types = wfs::list_feature_types(&client, args.url.as_deref(), limit)
        .await?
        .ok_or_else(|| unavailable("WFS", &client.base_url(args.url.as_deref())))?;

    if ctx.json_output {
        return print_json(&feature_types);
    }
    for feature_type in &feature_types {
        println!(
            "{}  {}",
            style(&feature_type.name).bold(),
            style(&feature_type.title).dim()
        );
    }
    Ok(())
}
