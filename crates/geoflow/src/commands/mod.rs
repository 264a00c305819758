//! CLI command handlers.

pub mod execute;
pub mod geojson;
pub mod order;
pub mod sos;
pub mod translate;
pub mod wcs;
pub mod wfs;
pub mod wps;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context as _, Result};
use geoflow_config::GeoflowConfig;
use geoflow_ogc::OgcClient;
use geoflow_types::Workflow;
use serde::Serialize;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Merged configuration.
    pub config: GeoflowConfig,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// HTTP client for the configured OGC defaults.
    pub fn client(&self) -> Result<OgcClient> {
        let ogc = self.config.ogc();
        Ok(OgcClient::builder()
            .default_url(ogc.default_url)
            .timeout(Duration::from_secs(ogc.timeout_secs))
            .build()?)
    }
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Read a workflow file (bare workflow or `{"workflows": [...]}` envelope).
pub fn read_workflow(path: &Path) -> Result<Workflow> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Workflow::from_json(&text).with_context(|| format!("invalid workflow in {}", path.display()))
}

/// The error for an endpoint that returned nothing usable.
pub fn unavailable(what: &str, url: &str) -> anyhow::Error {
    anyhow::anyhow!("{what} unavailable at {url}")
}
