//! Error types for `GammaKeeper`
//!
//! This module defines all error types used throughout the application,
//! providing clear error messages and proper error propagation.
//!
//! Error variants use `#[source]` to preserve error chains for better
//! observability and debugging.
//!
//! Most gamma operations are best-effort and never surface these errors to the
//! caller: a missing device context turns into a neutral default or a `false`
//! return, and persistence failures are logged and swallowed. The enum exists for
//! the places where an error *is* propagated (startup, configuration, the command
//! line front end).

use thiserror::Error;

/// Simple error type for wrapping string messages while implementing `std::error::Error`
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StringError(pub String);

impl StringError {
    /// Create a new `StringError` from a string message
    pub fn new(msg: impl Into<String>) -> Box<Self> {
        Box::new(Self(msg.into()))
    }
}

/// Main error type for `GammaKeeper`
#[derive(Debug, Error)]
pub enum GammaKeeperError {
    /// No drawing-surface handle could be obtained for a display device
    #[error("No device context available for {0}")]
    NoDeviceContext(String),

    /// Reading or writing a hardware gamma ramp failed
    #[error("Gamma ramp operation failed: {0}")]
    GammaRampFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Display or inventory enumeration failed
    #[error("Display enumeration failed: {0}")]
    EnumerationFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Settings could not be read or written
    #[error("Settings I/O failed: {0}")]
    PersistenceIo(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The OS display-change notification source could not be started
    #[error("Display change notifications unavailable: {0}")]
    NotificationSourceUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Another resident instance already holds the single-instance lock
    #[error("Another instance of GammaKeeper is already running")]
    AlreadyRunning,

    /// No attached monitor matched the requested selector
    #[error("No monitor matches '{0}'")]
    MonitorNotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Windows API error
    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    WindowsApiError(#[from] windows::core::Error),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for `GammaKeeper` operations
pub type Result<T> = std::result::Result<T, GammaKeeperError>;

/// Convert an error to a user-friendly message
///
/// Messages are meant for a status line or a console, never a blocking dialog.
pub fn get_user_friendly_error(error: &GammaKeeperError) -> String {
    match error {
        GammaKeeperError::NoDeviceContext(device) => format!(
            "Could not access display {device}.\n\n\
             The monitor may be asleep, disconnected, or its driver may not\n\
             allow gamma changes. Try again after the display wakes up."
        ),
        GammaKeeperError::GammaRampFailed(_) => "The display driver rejected the gamma change.\n\n\
             Some drivers limit how far the curve may deviate from the default.\n\
             Try a value closer to 1.0."
            .to_string(),
        GammaKeeperError::EnumerationFailed(_) => "Failed to list connected displays.\n\n\
             Please ensure your display drivers are up to date."
            .to_string(),
        GammaKeeperError::PersistenceIo(_) | GammaKeeperError::ConfigError(_) => {
            "Failed to load or save settings.\n\n\
             Your gamma choices may not persist.\n\
             Check that you have write permissions to:\n\
             %APPDATA%\\GammaKeeper"
                .to_string()
        }
        GammaKeeperError::NotificationSourceUnavailable(_) => {
            "Display hot-plug detection is unavailable.\n\n\
             Manual gamma changes still work, but remembered curves will not\n\
             be re-applied automatically when a monitor is connected."
                .to_string()
        }
        GammaKeeperError::AlreadyRunning => "GammaKeeper is already running.\n\n\
             Only one resident instance can watch for display changes."
            .to_string(),
        GammaKeeperError::MonitorNotFound(selector) => format!(
            "No connected monitor matches '{selector}'.\n\n\
             Use the 'list' command to see serial numbers and device names."
        ),
        #[cfg(windows)]
        GammaKeeperError::WindowsApiError(e) => {
            format!(
                "A Windows API error occurred:\n\n{e}\n\n\
                 Please ensure your Windows installation is up to date."
            )
        }
        GammaKeeperError::IoError(e) => {
            format!(
                "A file system error occurred:\n\n{e}\n\n\
                 Please check file permissions and disk space."
            )
        }
        GammaKeeperError::JsonError(e) => {
            format!(
                "Settings file is corrupted:\n\n{e}\n\n\
                 The application will use default settings."
            )
        }
    }
}
