//! Display topology monitoring module
//!
//! Detects monitors being connected and disconnected and reports the change as
//! serial-keyed events.
//!
//! # Architecture
//!
//! - `DisplayWatcher`: hidden window that turns OS broadcasts into `TopologySignal`s
//! - `ChangeReconciler`: debounced worker that re-resolves monitors and diffs serials
//! - `MonitorEvent`: `Attached` / `Detached` / `Changed`, delivered over mpsc
//!
//! # Example Usage
//!
//! ```no_run
//! use gammakeeper::gamma::GammaEngine;
//! use gammakeeper::monitor::{ChangeReconciler, DEFAULT_DEBOUNCE_WINDOW, DisplayWatcher, MonitorEvent};
//! use std::sync::{Arc, mpsc};
//!
//! let engine = Arc::new(GammaEngine::system());
//! let (signal_tx, signal_rx) = mpsc::channel();
//! let (event_tx, event_rx) = mpsc::channel();
//!
//! ChangeReconciler::new(Arc::clone(&engine), event_tx, DEFAULT_DEBOUNCE_WINDOW).spawn(signal_rx);
//! DisplayWatcher::new(signal_tx).start().expect("notifications unavailable");
//!
//! while let Ok(event) = event_rx.recv() {
//!     if let MonitorEvent::Attached(monitor) = event {
//!         println!("Connected: {monitor}");
//!     }
//! }
//! ```
//!
//! # Known Limitations
//!
//! - Monitors without a readable serial number never produce `Attached` or
//!   `Detached` events, only the trailing `Changed`.

pub mod display_watcher;
pub mod reconciler;

pub use display_watcher::DisplayWatcher;
pub use reconciler::{
    ChangeReconciler, DEFAULT_DEBOUNCE_WINDOW, DebounceState, KnownIdentitySet, MonitorEvent,
    TopologySignal, TopologySource,
};
