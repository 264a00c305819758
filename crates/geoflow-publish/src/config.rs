//! Publisher configuration.

use std::path::PathBuf;
use std::time::Duration;

use geoflow_config::PublisherSection;

/// Configuration for the raster publisher.
///
/// The tool is invoked as
/// `<command> <args...> <workspace> <raster> <style> <projection> <config> No`.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Directory for downloaded rasters, styles and credential files.
    pub media_root: PathBuf,

    /// Executable of the publishing tool.
    pub command: String,

    /// Leading arguments, e.g. `["-jar", "GeoPub.jar"]`.
    pub args: Vec<String>,

    /// Workspace used when the request leaves it blank.
    pub default_workspace: String,

    /// Projection assumed when the raster declares none.
    pub default_projection: String,

    /// Port written into the credentials file.
    pub geoserver_port: u16,

    /// Developer contact written into the credentials file.
    pub developer: String,

    /// Tool timeout.
    pub timeout: Duration,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self::from(&PublisherSection::default())
    }
}

impl From<&PublisherSection> for PublisherConfig {
    fn from(section: &PublisherSection) -> Self {
        Self {
            media_root: section.media_root.clone(),
            command: section.command.clone(),
            args: section.args.clone(),
            default_workspace: section.default_workspace.clone(),
            default_projection: section.default_projection.clone(),
            geoserver_port: section.geoserver_port,
            developer: section.developer.clone(),
            timeout: Duration::from_secs(section.timeout_secs),
        }
    }
}

impl PublisherConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the media root.
    pub fn with_media_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.media_root = root.into();
        self
    }

    /// Set the tool command and its leading arguments.
    pub fn with_command(mut self, command: impl Into<String>, args: Vec<String>) -> Self {
        self.command = command.into();
        self.args = args;
        self
    }

    /// Set the tool timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_section_defaults() {
        let config = PublisherConfig::default();
        assert_eq!(config.command, "java");
        assert_eq!(config.default_workspace, "maris_mamase");
        assert_eq!(config.timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_builder() {
        let config = PublisherConfig::new()
            .with_media_root("/tmp/m")
            .with_command("/bin/true", vec![])
            .with_timeout(Duration::from_secs(1));
        assert_eq!(config.media_root, PathBuf::from("/tmp/m"));
        assert_eq!(config.command, "/bin/true");
        assert!(config.args.is_empty());
        assert_eq!(config.timeout, Duration::from_secs(1));
    }
}
