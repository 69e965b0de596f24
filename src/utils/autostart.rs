//! Auto-start registry management
//!
//! Registers the resident mode under
//! `HKCU\Software\Microsoft\Windows\CurrentVersion\Run` so remembered curves are
//! restored at login. The command is `"<exe>" run --minimized`.

use crate::error::Result;
use std::path::Path;

/// Run key holding per-user startup commands
#[cfg_attr(not(windows), allow(dead_code))]
const RUN_KEY: &str = r"Software\Microsoft\Windows\CurrentVersion\Run";

/// Default registry value name
pub const DEFAULT_VALUE_NAME: &str = "GammaKeeper";

/// Build the startup command line for an executable
pub fn startup_command(exe: &Path) -> String {
    format!("\"{}\" run --minimized", exe.display())
}

/// Auto-start manager
#[derive(Debug, Clone)]
pub struct AutoStartManager {
    value_name: String,
}

impl Default for AutoStartManager {
    fn default() -> Self {
        Self::new(DEFAULT_VALUE_NAME)
    }
}

#[cfg(windows)]
impl AutoStartManager {
    /// Manager for a specific registry value name
    pub fn new(value_name: impl Into<String>) -> Self {
        Self {
            value_name: value_name.into(),
        }
    }

    fn run_key(write: bool) -> Result<winreg::RegKey> {
        use winreg::RegKey;
        use winreg::enums::{HKEY_CURRENT_USER, KEY_READ, KEY_WRITE};

        let flags = if write { KEY_READ | KEY_WRITE } else { KEY_READ };
        Ok(RegKey::predef(HKEY_CURRENT_USER).open_subkey_with_flags(RUN_KEY, flags)?)
    }

    /// Check if auto-start is enabled
    pub fn is_enabled(&self) -> Result<bool> {
        match Self::run_key(false)?.get_value::<String, _>(&self.value_name) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Register the current executable to start at login
    pub fn enable(&self) -> Result<()> {
        let exe = std::env::current_exe()?;
        let command = startup_command(&exe);
        Self::run_key(true)?.set_value(&self.value_name, &command)?;
        tracing::info!("Auto-start enabled: {command}");
        Ok(())
    }

    /// Remove the startup registration; succeeds if it was already absent
    pub fn disable(&self) -> Result<()> {
        match Self::run_key(true)?.delete_value(&self.value_name) {
            Ok(()) => {
                tracing::info!("Auto-start disabled");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(not(windows))]
impl AutoStartManager {
    /// Manager for a specific registry value name
    pub fn new(value_name: impl Into<String>) -> Self {
        Self {
            value_name: value_name.into(),
        }
    }

    /// Auto-start is never enabled off Windows
    pub fn is_enabled(&self) -> Result<bool> {
        Ok(false)
    }

    /// Not supported off Windows
    pub fn enable(&self) -> Result<()> {
        Err(crate::error::GammaKeeperError::ConfigError(
            crate::error::StringError::new(format!(
                "Auto-start for '{}' requires Windows",
                self.value_name
            )),
        ))
    }

    /// Nothing to remove off Windows
    pub fn disable(&self) -> Result<()> {
        Ok(())
    }
}
