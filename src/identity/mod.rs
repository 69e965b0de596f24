//! Monitor identity module
//!
//! Produces one [`MonitorInfo`] per attached display, carrying the panel serial
//! number used to remember per-monitor settings across reconnects.
//!
//! # Architecture
//!
//! - `model`: value types, including the intermediate [`InventoryRecord`] and
//!   [`DisplayOutput`] so correlation can be tested without an OS
//! - `edid`: decoding of the identity fields in an EDID block
//! - `source`: the [`MonitorSource`] seam and its system implementation
//! - `resolver`: correlation and merge

pub mod edid;
pub mod model;
pub mod resolver;
pub mod source;

pub use model::{DisplayOutput, InventoryRecord, MonitorDevice, MonitorInfo};
pub use resolver::{MonitorIdentityResolver, correlate, merge};
pub use source::{MonitorSource, SystemMonitorSource};
