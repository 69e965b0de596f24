//! Configuration management module
//!
//! This module handles loading, saving, and managing remembered gamma curves and
//! user preferences. Settings are stored in %APPDATA%\GammaKeeper\settings.json
//! with atomic writes to prevent corruption.

pub mod manager;
pub mod models;
pub mod store;

pub use manager::ConfigManager;
pub use models::{AppConfig, MonitorSettings, UserPreferences};
pub use store::SettingsStore;
