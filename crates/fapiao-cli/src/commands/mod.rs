//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod layouts;
pub mod process;

use std::path::Path;

use fapiao_core::models::config::FapiaoConfig;

/// Load the configuration named by `--config`, or the defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<FapiaoConfig> {
    let config = match config_path {
        Some(path) => FapiaoConfig::from_file(Path::new(path))?,
        None => FapiaoConfig::default(),
    };
    Ok(config)
}
