use std::fs;
use std::path::{Path, PathBuf};

use super::error::ConfigError;
use super::AppConfig;

#[derive(Debug)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub path: PathBuf,
    pub exists: bool,
}

/// `<config dir>/roundtable/config.toml`
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("roundtable").join("config.toml"))
        .ok_or(ConfigError::MissingHome)
}

/// Loads and validates the config file. A missing file yields the defaults.
pub fn load_config(path_override: Option<PathBuf>) -> Result<LoadedConfig, ConfigError> {
    let path = match path_override {
        Some(path) => path,
        None => default_config_path()?,
    };
    let (config, exists) = read_config(&path)?;
    config.validate()?;
    Ok(LoadedConfig {
        config,
        path,
        exists,
    })
}

fn read_config(path: &Path) -> Result<(AppConfig, bool), ConfigError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok((toml::from_str(&contents)?, true)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok((AppConfig::default(), false)),
        Err(err) => Err(ConfigError::Io(err)),
    }
}
