//! `GammaKeeper` - Per-monitor gamma control for Windows
//!
//! Applies an independent gamma curve to each attached monitor and remembers it
//! by the panel's serial number. A hidden window feeds display-change broadcasts
//! to a debounced `ChangeReconciler`, which diffs serials and lets the
//! `GammaController` re-apply remembered curves when a monitor is reconnected.
//!
//! # Layout
//!
//! - `gamma`: ramp math, device context cache, `GammaEngine`
//! - `identity`: EDID inventory and display enumeration merged into `MonitorInfo`
//! - `monitor`: topology notifications and reconciliation
//! - `controller`: apply-on-connect and remembered-curve coordination
//! - `config`: JSON settings in %APPDATA%\GammaKeeper
//! - `utils`: logging, auto-start, single instance
//!
//! # Requirements
//!
//! - Windows 10 or later; on other platforms every gamma operation reports
//!   failure and no monitors are enumerated

// Module declarations
pub mod config;
pub mod controller;
pub mod error;
pub mod gamma;
pub mod identity;
pub mod monitor;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export commonly used types
pub use error::{GammaKeeperError, Result};
pub use gamma::{GammaEngine, SystemGammaEngine};
pub use identity::MonitorInfo;
