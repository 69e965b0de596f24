//! Persistent per-monitor settings
//!
//! [`SettingsStore`] owns an in-memory [`AppConfig`] and writes the whole
//! document back after every change. One-shot commands and the resident process
//! share the same file, so every change re-reads the file first and long-lived
//! readers call [`SettingsStore::reload`] before acting on a remembered value.
//!
//! Lookups never fail: an empty or unknown serial reads as the neutral gamma.
//! Read and write failures are logged and otherwise ignored, so an unreadable or
//! read-only profile degrades to session-only settings.

use crate::config::manager::ConfigManager;
use crate::config::models::{AppConfig, MonitorSettings};
use crate::error::GammaKeeperError;
use crate::gamma::math::{DEFAULT_GAMMA, clamp_gamma, round_gamma};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Settings document shared between the command handler and the event loop
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    config: Mutex<AppConfig>,
}

impl SettingsStore {
    /// Open the store at `%APPDATA%\GammaKeeper\settings.json`
    pub fn open() -> Self {
        Self::with_path(ConfigManager::get_config_path())
    }

    /// Open the store at a specific file
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let config = ConfigManager::load_from(&path);
        Self {
            path,
            config: Mutex::new(config),
        }
    }

    /// Pick up changes another process wrote to the settings file
    ///
    /// A missing or unreadable file keeps the in-memory document.
    pub fn reload(&self) {
        let mut config = self.config.lock();
        self.refresh(&mut config);
    }

    /// Settings file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy of the current document
    pub fn snapshot(&self) -> AppConfig {
        self.config.lock().clone()
    }

    /// Remembered gamma for a serial, `1.0` when unknown
    pub fn get_monitor_gamma(&self, serial: &str) -> f64 {
        if serial.is_empty() {
            return DEFAULT_GAMMA;
        }
        self.config
            .lock()
            .monitor_settings
            .get(serial)
            .map_or(DEFAULT_GAMMA, |settings| settings.gamma)
    }

    /// Remember a gamma value for a serial
    ///
    /// The value is clamped and rounded before it is stored. Monitors without a
    /// serial cannot be remembered and are ignored.
    pub fn set_monitor_gamma(&self, serial: &str, friendly_name: &str, gamma: f64) {
        if serial.is_empty() {
            debug!("Not remembering gamma for '{friendly_name}': no serial number");
            return;
        }
        let gamma = round_gamma(clamp_gamma(gamma));
        self.update(|config| {
            config.monitor_settings.insert(
                serial.to_string(),
                MonitorSettings {
                    friendly_name: friendly_name.to_string(),
                    gamma,
                },
            );
        });
    }

    /// Whether a curve is remembered for a serial
    pub fn is_monitor_known(&self, serial: &str) -> bool {
        !serial.is_empty() && self.config.lock().monitor_settings.contains_key(serial)
    }

    /// Serials with remembered curves, sorted
    pub fn known_serials(&self) -> Vec<String> {
        let mut serials: Vec<String> = self.config.lock().monitor_settings.keys().cloned().collect();
        serials.sort();
        serials
    }

    /// Whether remembered curves are re-applied on connect
    pub fn apply_on_connect(&self) -> bool {
        self.config.lock().preferences.apply_on_connect
    }

    /// Set whether remembered curves are re-applied on connect
    pub fn set_apply_on_connect(&self, enabled: bool) {
        self.update(|config| config.preferences.apply_on_connect = enabled);
    }

    /// Whether the application starts at login
    pub fn run_at_startup(&self) -> bool {
        self.config.lock().preferences.run_at_startup
    }

    /// Record whether the application starts at login
    pub fn set_run_at_startup(&self, enabled: bool) {
        self.update(|config| config.preferences.run_at_startup = enabled);
    }

    /// Serial of the monitor last adjusted
    pub fn last_selected_serial(&self) -> Option<String> {
        self.config.lock().preferences.last_selected_serial.clone()
    }

    /// Record the monitor last adjusted
    pub fn set_last_selected_serial(&self, serial: Option<&str>) {
        let serial = serial.filter(|s| !s.is_empty()).map(str::to_string);
        self.update(|config| config.preferences.last_selected_serial = serial);
    }

    fn refresh(&self, config: &mut AppConfig) {
        match ConfigManager::read_from(&self.path) {
            Ok(on_disk) => {
                if on_disk != *config {
                    debug!("Settings changed on disk, reloading {}", self.path.display());
                    *config = on_disk;
                }
            }
            Err(GammaKeeperError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Keeping in-memory settings, cannot reload {}: {e}", self.path.display()),
        }
    }

    /// Apply a change on top of the latest document and write it back
    fn update(&self, change: impl FnOnce(&mut AppConfig)) {
        let mut config = self.config.lock();
        self.refresh(&mut config);
        change(&mut config);

        if let Some(dir) = self.path.parent()
            && let Err(e) = std::fs::create_dir_all(dir)
        {
            warn!("Failed to create settings directory {}: {e}", dir.display());
            return;
        }
        if let Err(e) = ConfigManager::save_to(&config, &self.path) {
            warn!("Failed to save settings to {}: {e}", self.path.display());
        }
    }
}
