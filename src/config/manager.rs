//! Configuration manager for loading and saving configuration
//!
//! Configuration lives in `%APPDATA%\regscope\config.json`. Writes go to a
//! temporary file in the same directory that is then persisted over the
//! target, so a crash mid-write never leaves a truncated file.

use crate::config::models::RegScopeConfig;
use crate::error::{RegScopeError, Result, StringError};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, warn};

const APP_DIR: &str = "regscope";
const CONFIG_FILE: &str = "config.json";

/// Configuration manager
pub struct ConfigManager;

impl ConfigManager {
    /// Application data directory: `%APPDATA%\regscope`
    ///
    /// Falls back to the working directory when `APPDATA` is unset.
    pub fn data_dir() -> PathBuf {
        let appdata = std::env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(appdata).join(APP_DIR)
    }

    /// Get the path to the configuration file
    pub fn get_config_path() -> PathBuf {
        Self::data_dir().join(CONFIG_FILE)
    }

    /// Load configuration from the default path
    pub fn load() -> Result<RegScopeConfig> {
        Self::load_from(&Self::get_config_path())
    }

    /// Load configuration from `path`
    ///
    /// A missing or unparsable file yields the default configuration.
    pub fn load_from(path: &Path) -> Result<RegScopeConfig> {
        if !path.exists() {
            info!("Configuration file not found at {}, using defaults", path.display());
            return Ok(RegScopeConfig::default());
        }

        let json = std::fs::read_to_string(path)?;
        match serde_json::from_str(&json) {
            Ok(config) => {
                info!("Configuration loaded from {}", path.display());
                Ok(config)
            }
            Err(e) => {
                warn!("Failed to parse configuration, using defaults: {e}");
                Ok(RegScopeConfig::default())
            }
        }
    }

    /// Save configuration to the default path
    pub fn save(config: &RegScopeConfig) -> Result<()> {
        Self::save_to(config, &Self::get_config_path())
    }

    /// Save configuration to `path` atomically, creating its directory
    pub fn save_to(config: &RegScopeConfig, path: &Path) -> Result<()> {
        let config_dir = path
            .parent()
            .ok_or_else(|| RegScopeError::ConfigError(StringError::new("Invalid config path")))?;
        std::fs::create_dir_all(config_dir)?;

        let json = serde_json::to_string_pretty(config)?;
        let mut temp = NamedTempFile::new_in(config_dir)?;
        temp.write_all(json.as_bytes())?;
        temp.persist(path).map_err(|e| RegScopeError::IoError(e.error))?;

        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}
