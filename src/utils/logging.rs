//! Logging system initialization
//!
//! The resident `run` mode logs to %APPDATA%\GammaKeeper\app.log, rotating on
//! every startup and keeping nine previous sessions. One-shot commands log to
//! stderr instead so they never rotate the resident instance's file.

use crate::config::ConfigManager;
use crate::error::{GammaKeeperError, Result, StringError};
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt};

/// Maximum number of historical log files to keep (app.log.1 through app.log.9)
const MAX_LOG_FILES: u8 = 9;

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Initialize file logging for the resident mode
///
/// Log level defaults to INFO but can be configured via `RUST_LOG`.
pub fn init_logging() -> Result<()> {
    let log_dir = ConfigManager::ensure_config_dir()?;
    rotate_logs_on_startup(&log_dir.join("app.log"))?;

    // Rotation happens above, once per session
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix("app")
        .filename_suffix("log")
        .build(&log_dir)
        .map_err(|e| GammaKeeperError::ConfigError(Box::new(e)))?;

    let subscriber = fmt()
        .with_writer(file_appender)
        .with_env_filter(env_filter("info"))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| GammaKeeperError::ConfigError(Box::new(e)))?;

    tracing::info!("GammaKeeper v{} started", env!("CARGO_PKG_VERSION"));
    Ok(())
}

/// Initialize stderr logging for one-shot commands
///
/// Defaults to WARN so command output stays readable; `RUST_LOG` overrides it.
pub fn init_console_logging() -> Result<()> {
    let subscriber = fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter("warn"))
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| GammaKeeperError::ConfigError(Box::new(e)))
}

/// Rotate log files on application startup
///
/// `app.log.9` is deleted, `app.log.N` becomes `app.log.N+1`, and `app.log`
/// becomes `app.log.1`. The logger then creates a fresh `app.log`.
fn rotate_logs_on_startup(log_path: &Path) -> Result<()> {
    if !log_path.exists() {
        return Ok(());
    }

    let log_dir = log_path
        .parent()
        .ok_or_else(|| GammaKeeperError::ConfigError(StringError::new("Invalid log path")))?;
    let log_name = log_path
        .file_name()
        .ok_or_else(|| GammaKeeperError::ConfigError(StringError::new("Invalid log filename")))?
        .to_string_lossy();

    let oldest_log = log_dir.join(format!("{log_name}.{MAX_LOG_FILES}"));
    if oldest_log.exists() {
        std::fs::remove_file(&oldest_log)?;
    }

    for i in (1..MAX_LOG_FILES).rev() {
        let current_log = log_dir.join(format!("{log_name}.{i}"));
        if current_log.exists() {
            std::fs::rename(&current_log, log_dir.join(format!("{log_name}.{}", i + 1)))?;
        }
    }

    std::fs::rename(log_path, log_dir.join(format!("{log_name}.1")))?;
    Ok(())
}
