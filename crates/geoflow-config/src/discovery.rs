//! Config layering.
//!
//! Later layers override earlier ones, section by section:
//! 1. `config.toml` in the user config dir (`GEOFLOW_CONFIG_DIR` or
//!    `~/.config/geoflow`)
//! 2. `geoflow.toml` in the project dir
//! 3. `GEOFLOW_OGC_URL`, `GEOFLOW_SOS_URL` and `GEOFLOW_MEDIA_ROOT`, which
//!    override single fields
//!
//! The merged result is validated before it is returned.

use std::path::{Path, PathBuf};

use crate::{ConfigError, GeoflowConfig, Result};

const PROJECT_FILE: &str = "geoflow.toml";
const USER_FILE: &str = "config.toml";
const APP_DIR: &str = "geoflow";
const CONFIG_DIR_ENV: &str = "GEOFLOW_CONFIG_DIR";

const OGC_URL_ENV: &str = "GEOFLOW_OGC_URL";
const SOS_URL_ENV: &str = "GEOFLOW_SOS_URL";
const MEDIA_ROOT_ENV: &str = "GEOFLOW_MEDIA_ROOT";

/// Which layer a source belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    User,
    Project,
    Environment,
}

/// One layer that was considered during loading.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub layer: Layer,
    /// File path, or the variable name for environment overrides.
    pub path: PathBuf,
    pub loaded: bool,
}

/// Merged configuration plus how it was assembled.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: GeoflowConfig,
    /// Sources in precedence order, lowest first.
    pub sources: Vec<ConfigSource>,
    /// Layers that were skipped because they did not parse.
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Files and variables that contributed to the config.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.as_path())
            .collect()
    }
}

/// Discover, merge and validate all layers.
pub fn load_config(project_dir: Option<&Path>) -> Result<LoadedConfig> {
    load_config_with_options(project_dir, None)
}

/// Like [`load_config`], with an explicit user config directory.
pub fn load_config_with_options(
    project_dir: Option<&Path>,
    config_dir: Option<&Path>,
) -> Result<LoadedConfig> {
    load_layers(project_dir, config_dir, |name| std::env::var(name).ok())
}

/// Load with a custom environment lookup.
pub fn load_layers(
    project_dir: Option<&Path>,
    config_dir: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<LoadedConfig> {
    let mut loaded = LoadedConfig {
        config: GeoflowConfig::new(),
        sources: Vec::new(),
        warnings: Vec::new(),
    };

    let user_file = config_dir
        .map(|d| d.join(USER_FILE))
        .or_else(user_config_path);
    if let Some(path) = user_file {
        merge_file(&mut loaded, Layer::User, path);
    }

    let project_file = project_dir.unwrap_or(Path::new(".")).join(PROJECT_FILE);
    merge_file(&mut loaded, Layer::Project, project_file);

    apply_env(&mut loaded, env);
    loaded.config.validate()?;
    Ok(loaded)
}

/// Read one config file without layering.
pub fn load_config_file(path: &Path) -> Result<GeoflowConfig> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    GeoflowConfig::from_toml(&text)
}

/// Write a config file, creating parent directories.
pub fn save_config(config: &GeoflowConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_error(parent))?;
    }
    std::fs::write(path, config.to_toml()?).map_err(write_error(path))
}

fn write_error(path: &Path) -> impl FnOnce(std::io::Error) -> ConfigError {
    let path = path.to_path_buf();
    move |source| ConfigError::WriteFile { path, source }
}

pub fn user_config_path() -> Option<PathBuf> {
    user_config_dir().map(|d| d.join(USER_FILE))
}

/// `GEOFLOW_CONFIG_DIR` when set, else the platform config dir.
pub fn user_config_dir() -> Option<PathBuf> {
    match std::env::var(CONFIG_DIR_ENV) {
        Ok(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::config_dir().map(|d| d.join(APP_DIR)),
    }
}

fn merge_file(loaded: &mut LoadedConfig, layer: Layer, path: PathBuf) {
    let mut ok = false;
    if path.is_file() {
        match load_config_file(&path) {
            Ok(config) => {
                loaded.config.merge(config);
                ok = true;
            }
            Err(e) => loaded
                .warnings
                .push(format!("skipped {}: {e}", path.display())),
        }
    }
    loaded.sources.push(ConfigSource {
        layer,
        path,
        loaded: ok,
    });
}

fn apply_env(loaded: &mut LoadedConfig, env: impl Fn(&str) -> Option<String>) {
    for name in [OGC_URL_ENV, SOS_URL_ENV, MEDIA_ROOT_ENV] {
        let Some(value) = env(name).filter(|v| !v.is_empty()) else {
            continue;
        };
        let config = &mut loaded.config;
        match name {
            OGC_URL_ENV => config.ogc.get_or_insert_with(Default::default).default_url = value,
            SOS_URL_ENV => config.ogc.get_or_insert_with(Default::default).sos_url = value,
            _ => {
                config
                    .publisher
                    .get_or_insert_with(Default::default)
                    .media_root = PathBuf::from(value)
            }
        }
        loaded.sources.push(ConfigSource {
            layer: Layer::Environment,
            path: PathBuf::from(name),
            loaded: true,
        });
    }
}
