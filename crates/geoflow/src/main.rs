//! Geoflow - geospatial workflow engine and OGC toolbox
//!
//! Main entry point for the geoflow CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::warn;

mod commands;

use commands::{execute, geojson, order, sos, translate, wcs, wfs, wps};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Geoflow - geospatial workflow engine and OGC toolbox
#[derive(Parser)]
#[command(name = "geoflow")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Directory holding config.toml (default: ~/.config/geoflow)
    #[arg(long, global = true, env = "GEOFLOW_CONFIG_DIR")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Web Processing Service processes
    Wps(wps::WpsArgs),

    /// List Web Feature Service feature types
    Wfs(wfs::WfsArgs),

    /// Describe Web Coverage Service coverages
    Wcs(wcs::WcsArgs),

    /// Sensor Observation Service offerings and observations
    Sos(sos::SosArgs),

    /// GeoJSON utilities
    Geojson(geojson::GeojsonArgs),

    /// Print the execution order of a workflow
    Order(order::OrderArgs),

    /// Execute a workflow and print the result records
    Execute(execute::ExecuteArgs),

    /// Translate a workflow between tool formats
    Translate(translate::TranslateArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = geoflow_config::load_config_with_options(None, cli.config.as_deref())?;

    // Console (human-readable) + rotating JSON file
    let filter = if cli.verbose {
        "geoflow=debug,geoflow_ogc=debug,geoflow_pipeline=debug,geoflow_publish=debug,geoflow_translate=debug,info"
    } else {
        "geoflow=info,geoflow_ogc=info,geoflow_pipeline=info,geoflow_publish=info,geoflow_translate=info,warn"
    };

    let log_dir = loaded
        .config
        .logging
        .as_ref()
        .and_then(|l| l.directory.clone())
        .or_else(|| geoflow_config::user_config_dir().map(|d| d.join("logs")))
        .unwrap_or_else(|| PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "geoflow.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "geoflow=trace,geoflow_ogc=trace,geoflow_pipeline=trace,geoflow_publish=trace,geoflow_translate=trace,info",
                )),
        )
        .init();

    for warning in &loaded.warnings {
        warn!("{warning}");
    }

    let ctx = commands::Context {
        config: loaded.config,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Wps(args) => wps::run(args, &ctx).await,
        Commands::Wfs(args) => wfs::run(args, &ctx).await,
        Commands::Wcs(args) => wcs::run(args, &ctx).await,
        Commands::Sos(args) => sos::run(args, &ctx).await,
        Commands::Geojson(args) => geojson::run(args, &ctx).await,
        Commands::Order(args) => order::run(args, &ctx).await,
        Commands::Execute(args) => execute::run(args, &ctx).await,
        Commands::Translate(args) => translate::run(args, &ctx).await,
    }
}
