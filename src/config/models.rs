//! Configuration data models
//!
//! This module defines the data structures persisted to `settings.json`.
//! Every struct uses `#[serde(default)]`, so partial files written by older
//! versions still load.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Remembered curve for one monitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Name shown when the monitor was last seen
    pub friendly_name: String,
    /// Gamma value, already clamped and rounded
    pub gamma: f64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            friendly_name: String::new(),
            gamma: 1.0,
        }
    }
}

/// User preferences and settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPreferences {
    /// Whether to auto-start on Windows login
    pub run_at_startup: bool,
    /// Whether to re-apply a remembered curve when its monitor is connected
    pub apply_on_connect: bool,
    /// Serial of the monitor last adjusted
    pub last_selected_serial: Option<String>,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            run_at_startup: false,
            apply_on_connect: true,
            last_selected_serial: None,
        }
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Remembered curves keyed by monitor serial number
    pub monitor_settings: HashMap<String, MonitorSettings>,
    /// User preferences, stored as top-level keys
    #[serde(flatten)]
    pub preferences: UserPreferences,
}
