//! Cache configuration loaded from the `[cache]` table of `dexon.toml`.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::paths::{CachePaths, DEFAULT_CONTAINER_FILE};

/// Name of the project configuration file.
const CONFIG_FILE: &str = "dexon.toml";

/// Default cache directory, relative to the project directory.
const DEFAULT_CACHE_DIR: &str = ".dexon-cache";

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    cache: CacheConfig,
}

/// Method body cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether incremental builds may reuse cached method bodies.
    pub enabled: bool,
    /// Directory holding the previous run's container and map file.
    pub directory: PathBuf,
    /// File name of the cached container inside `directory`.
    pub container_file: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: PathBuf::from(DEFAULT_CACHE_DIR),
            container_file: DEFAULT_CONTAINER_FILE.to_string(),
        }
    }
}

impl CacheConfig {
    /// Returns the snapshot file pair this configuration points at.
    pub fn paths(&self) -> CachePaths {
        CachePaths::with_container_file(&self.directory, &self.container_file)
    }
}

/// Loads the cache configuration from `<project_dir>/dexon.toml`.
///
/// A project without a configuration file gets the defaults. A relative
/// cache directory is resolved against `project_dir`.
pub fn load_config(project_dir: &Path) -> Result<CacheConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    let mut config = if config_path.is_file() {
        let content = std::fs::read_to_string(&config_path)?;
        load_config_from_str(&content)?
    } else {
        CacheConfig::default()
    };
    if config.directory.is_relative() {
        config.directory = project_dir.join(&config.directory);
    }
    Ok(config)
}

/// Parses and validates cache configuration from a TOML string.
pub fn load_config_from_str(content: &str) -> Result<CacheConfig, ConfigError> {
    let file: ConfigFile =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&file.cache)?;
    Ok(file.cache)
}

fn validate_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.container_file.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "cache.container_file is empty".to_string(),
        ));
    }
    let stem = Path::new(&config.container_file)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    if stem.is_empty() || config.container_file.contains(['/', '\\']) {
        return Err(ConfigError::ValidationError(format!(
            "cache.container_file '{}' is not a plain file name",
            config.container_file
        )));
    }
    Ok(())
}
