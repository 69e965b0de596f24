//! Gamma control module
//!
//! Reads and writes per-monitor hardware gamma ramps.
//!
//! # Architecture
//!
//! - `math`: pure ramp computation and estimation
//! - `device_cache`: lazily created, topology-scoped device contexts behind a
//!   [`DeviceContextApi`] seam
//! - `windows_api`: GDI implementation of that seam
//! - `engine`: [`GammaEngine`], the public get/set/reset API
//!
//! # Example Usage
//!
//! ```no_run
//! use gammakeeper::gamma::GammaEngine;
//!
//! let engine = GammaEngine::system();
//! for monitor in engine.get_monitors() {
//!     let current = engine.get_gamma(&monitor);
//!     println!("{monitor}: {current:.2}");
//!     engine.set_gamma(&monitor, 1.2);
//! }
//! ```

pub mod device_cache;
pub mod engine;
pub mod math;
pub mod windows_api;

pub use device_cache::{ContextSource, DeviceContext, DeviceContextApi, DeviceHandleCache};
pub use engine::{GammaEngine, SystemGammaEngine};
pub use math::{
    DEFAULT_GAMMA, GammaRamp, MAX_GAMMA, MIN_GAMMA, clamp_gamma, compute_ramp, estimate_gamma,
    round_gamma,
};
pub use windows_api::GdiDeviceContextApi;
