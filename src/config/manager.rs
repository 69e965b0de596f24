//! Configuration manager for loading and saving application configuration
//!
//! Settings live in `%APPDATA%\GammaKeeper\settings.json`. Writes go through a
//! temporary file in the same directory that is then persisted over the target,
//! so a crash mid-write never leaves a truncated document.

use crate::config::models::AppConfig;
use crate::error::{GammaKeeperError, Result, StringError};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Configuration manager
pub struct ConfigManager;

impl ConfigManager {
    /// Get the application data directory
    ///
    /// Returns: %APPDATA%\GammaKeeper
    pub fn get_app_dir() -> PathBuf {
        let appdata = std::env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(appdata).join("GammaKeeper")
    }

    /// Get the path to the settings file
    ///
    /// Returns: %APPDATA%\GammaKeeper\settings.json
    pub fn get_config_path() -> PathBuf {
        Self::get_app_dir().join("settings.json")
    }

    /// Ensure the configuration directory exists
    pub fn ensure_config_dir() -> Result<PathBuf> {
        let dir = Self::get_app_dir();
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Load configuration from a specific file
    ///
    /// A missing or unparsable file yields the default configuration.
    pub fn load_from(path: &Path) -> AppConfig {
        match Self::read_from(path) {
            Ok(config) => config,
            Err(GammaKeeperError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Settings file not found, using defaults");
                AppConfig::default()
            }
            Err(e) => {
                warn!("Failed to load settings from {}, using defaults: {e}", path.display());
                AppConfig::default()
            }
        }
    }

    /// Read and parse a settings file, reporting why it could not be used
    pub fn read_from(path: &Path) -> Result<AppConfig> {
        let json = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&json)?;
        debug!("Settings loaded from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a specific file, replacing it atomically
    pub fn save_to(config: &AppConfig, path: &Path) -> Result<()> {
        let dir = path.parent().ok_or_else(|| {
            GammaKeeperError::ConfigError(StringError::new(format!(
                "Invalid settings path: {}",
                path.display()
            )))
        })?;

        let json = serde_json::to_string_pretty(config)?;
        let mut temp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| GammaKeeperError::PersistenceIo(Box::new(e)))?;
        temp.write_all(json.as_bytes())
            .map_err(|e| GammaKeeperError::PersistenceIo(Box::new(e)))?;
        temp.persist(path)
            .map_err(|e| GammaKeeperError::PersistenceIo(Box::new(e.error)))?;

        debug!("Settings saved to {}", path.display());
        Ok(())
    }
}
