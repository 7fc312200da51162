// Configuration loader
// Loads settings from ~/.cvu/config.toml, then applies environment overrides

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::constants::*;
use super::settings::Config;
use crate::errors;

/// Default location of the config file
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load configuration from ~/.cvu/config.toml (if present) and the environment
pub fn load_config() -> Result<Config> {
    match default_config_path() {
        Some(path) if path.exists() => load_config_from(&path),
        _ => {
            tracing::debug!("No config file found, using defaults");
            let mut config = Config::default();
            config.apply_env_overrides(|key| std::env::var(key).ok());
            config
                .validate()
                .context("Configuration validation failed")?;
            Ok(config)
        }
    }
}

/// Load configuration from an explicit file
pub fn load_config_from(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path).map_err(|_e| {
        anyhow::anyhow!(errors::file_not_found_error(
            &path.display().to_string(),
            "Configuration file"
        ))
    })?;

    let mut config = parse_config(&contents)?;
    config.apply_env_overrides(|key| std::env::var(key).ok());

    config
        .validate()
        .context("Configuration validation failed")?;

    tracing::debug!("Loaded configuration from {:?}", path);
    Ok(config)
}

/// Parse config.toml contents without touching the environment
pub fn parse_config(contents: &str) -> Result<Config> {
    toml::from_str(contents).map_err(|e| anyhow::anyhow!(errors::config_parse_error(&e.to_string())))
}
