//! GeoJSON command - reproject feature collections.

use anyhow::Result;
use clap::{Args, Subcommand};
use geoflow_ogc::geojson;

use super::{Context, print_json, unavailable};

/// Arguments for the geojson command.
#[derive(Args, Debug)]
pub struct GeojsonArgs {
    #[command(subcommand)]
    pub command: GeojsonCommand,
}

#[derive(Subcommand, Debug)]
pub enum GeojsonCommand {
    /// Fetch a feature collection and reproject it
    Transform {
        /// URL of the feature collection
        #[arg(long)]
        url: String,

        /// Target EPSG code
        #[arg(long, default_value_t = 3857)]
        srid: i32,
    },
}

/// Run the geojson command.
pub async fn run(args: GeojsonArgs, ctx: &Context) -> Result<()> {
    match args.command {
        GeojsonCommand::Transform { url, srid } => {
            let client = ctx.client()?;
            let collection = geojson::fetch_and_transform(&client, &url, srid)
                .await?
                .ok_or_else(|| unavailable("GeoJSON", &url))?;
            print_json(&collection)
        }
    }
}
