//! Configuration types mapping to the TOML schema.
//!
//! Top-level config:
//! ```toml
//! [ogc]          # default OGC endpoints and adapter limits
//! [executor]     # operation executor tuning
//! [publisher]    # raster publishing tool and media root
//! [catalog]      # operation catalog used by the translator
//! [logging]      # log file location
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged. Use the accessor methods to get a
/// section with defaults filled in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoflowConfig {
    /// OGC endpoint configuration.
    pub ogc: Option<OgcSection>,

    /// Operation executor configuration.
    pub executor: Option<ExecutorSection>,

    /// Raster publisher configuration.
    pub publisher: Option<PublisherSection>,

    /// Operation catalog configuration.
    pub catalog: Option<CatalogSection>,

    /// Logging configuration.
    pub logging: Option<LoggingConfig>,
}

impl GeoflowConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> crate::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Sections are replaced wholesale, not field by field.
    pub fn merge(&mut self, other: GeoflowConfig) {
        if other.ogc.is_some() {
            self.ogc = other.ogc;
        }

        if other.executor.is_some() {
            self.executor = other.executor;
        }

        if other.publisher.is_some() {
            self.publisher = other.publisher;
        }

        if other.catalog.is_some() {
            self.catalog = other.catalog;
        }

        if other.logging.is_some() {
            self.logging = other.logging;
        }
    }

    /// The `[ogc]` section, or its defaults.
    pub fn ogc(&self) -> OgcSection {
        self.ogc.clone().unwrap_or_default()
    }

    /// The `[executor]` section, or its defaults.
    pub fn executor(&self) -> ExecutorSection {
        self.executor.clone().unwrap_or_default()
    }

    /// The `[publisher]` section, or its defaults.
    pub fn publisher(&self) -> PublisherSection {
        self.publisher.clone().unwrap_or_default()
    }

    /// The `[catalog]` section, or its defaults.
    pub fn catalog(&self) -> CatalogSection {
        self.catalog.clone().unwrap_or_default()
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> crate::Result<()> {
        let ogc = self.ogc();
        let executor = self.executor();
        let checks: [(&'static str, bool); 5] = [
            ("ogc.limit", ogc.limit > 0),
            ("ogc.timeout_secs", ogc.timeout_secs > 0),
            ("executor.poll_initial_ms", executor.poll_initial_ms > 0),
            ("executor.poll_timeout_secs", executor.poll_timeout_secs > 0),
            ("publisher.timeout_secs", self.publisher().timeout_secs > 0),
        ];
        match checks.into_iter().find(|(_, ok)| !ok) {
            Some((key, _)) => Err(ConfigError::Invalid {
                key,
                reason: "must be greater than zero".to_string(),
            }),
            None => Ok(()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// OGC Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Default OGC endpoints and adapter limits.
///
/// ```toml
/// [ogc]
/// default_url = "https://example.org/geoserver/ows?"
/// sos_url = "https://example.org/sos.py?"
/// timeout_secs = 60
/// wps_prefix = "gs:"
/// limit = 100
/// sos_offerings = ["LUFTTEMPERATUR"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OgcSection {
    /// Endpoint used when a request carries no URL.
    pub default_url: String,
    /// Default Sensor Observation Service endpoint.
    pub sos_url: String,
    /// Per-request HTTP timeout in seconds.
    pub timeout_secs: u64,
    /// Process identifier prefix for WPS listings.
    pub wps_prefix: String,
    /// Maximum number of entries an adapter returns.
    pub limit: usize,
    /// Offerings accepted from SOS deployments other than `sos.py`.
    pub sos_offerings: Vec<String>,
}

impl Default for OgcSection {
    fn default() -> Self {
        Self {
            default_url: "https://mara.rangelands.itc.utwente.nl/geoserver/ows?".to_string(),
            sos_url: "https://gip.itc.utwente.nl/services/ogc/sos.py?".to_string(),
            timeout_secs: 60,
            wps_prefix: "gs:".to_string(),
            limit: 100,
            sos_offerings: vec![
                "LUFTTEMPERATUR".to_string(),
                "WASSERTEMPERATUR".to_string(),
                "LUFTFEUCHTE".to_string(),
            ],
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Executor Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Operation executor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorSection {
    /// Base prefixed to result paths returned by ILWIS.
    pub ilwis_api: String,
    /// Initial delay between job status polls, in milliseconds.
    pub poll_initial_ms: u64,
    /// Upper bound on the delay between job status polls, in milliseconds.
    pub poll_max_ms: u64,
    /// Give up on an asynchronous job after this many seconds.
    pub poll_timeout_secs: u64,
}

impl Default for ExecutorSection {
    fn default() -> Self {
        Self {
            ilwis_api: String::new(),
            poll_initial_ms: 500,
            poll_max_ms: 10_000,
            poll_timeout_secs: 600,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Publisher Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Raster publisher configuration.
///
/// The publishing tool is invoked as
/// `<command> <args...> <workspace> <raster> <style> <projection> <config> No`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherSection {
    /// Directory for temporary rasters, styles and credential files.
    pub media_root: PathBuf,
    /// Executable of the publishing tool.
    pub command: String,
    /// Leading arguments passed before the per-call arguments.
    pub args: Vec<String>,
    /// Workspace used when the operation leaves it blank.
    pub default_workspace: String,
    /// Projection assumed when the raster declares none.
    pub default_projection: String,
    /// Port written into the credentials file.
    pub geoserver_port: u16,
    /// Developer field written into the credentials file.
    pub developer: String,
    /// Kill the publishing tool after this many seconds.
    pub timeout_secs: u64,
}

impl Default for PublisherSection {
    fn default() -> Self {
        Self {
            media_root: PathBuf::from("media"),
            command: "java".to_string(),
            args: vec!["-jar".to_string(), "libs/gs/GeoPub.jar".to_string()],
            default_workspace: "maris_mamase".to_string(),
            default_projection: "EPSG:32736".to_string(),
            geoserver_port: 80,
            developer: String::new(),
            timeout_secs: 300,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalog Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Operation catalog configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSection {
    /// Catalog TOML file. The built-in catalog is used when unset.
    pub path: Option<PathBuf>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Logging configuration section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for rolling JSON log files.
    pub directory: Option<PathBuf>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
