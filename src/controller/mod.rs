//! Application logic controller module
//!
//! Connects the reconciler's monitor events to the gamma engine and the settings
//! store.
//!
//! # Event Flow
//!
//! ```text
//! DisplayWatcher → TopologySignal → ChangeReconciler → MonitorEvent → GammaController
//!                                                                          ↓
//!                                                        SettingsStore → GammaEngine
//! ```
//!
//! # Apply-on-connect
//!
//! On `Attached`, if the preference is enabled and a curve is remembered for the
//! serial, the controller re-resolves the monitor (its device name may differ
//! from the one in the event) and applies the curve. `Detached` and `Changed` are
//! only logged.

pub mod gamma_controller;

pub use gamma_controller::GammaController;
