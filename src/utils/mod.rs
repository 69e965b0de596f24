//! Utility modules
//!
//! Provides auto-start management, logging, and single instance enforcement.

pub mod autostart;
pub mod logging;
pub mod single_instance;

pub use autostart::AutoStartManager;
pub use logging::{init_console_logging, init_logging};
pub use single_instance::SingleInstanceGuard;
