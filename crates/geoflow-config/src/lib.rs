//! Configuration system for the geoflow workflow engine.
//!
//! Provides TOML-based configuration with:
//! - OGC endpoint defaults (`[ogc]`)
//! - Operation executor tuning (`[executor]`)
//! - Raster publishing settings (`[publisher]`)
//! - Operation catalog location (`[catalog]`)
//! - Config file layering (user config dir + project-local overrides + env)

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigSource, Layer, LoadedConfig, load_config, load_config_file, load_config_with_options,
    load_layers, save_config, user_config_dir, user_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
