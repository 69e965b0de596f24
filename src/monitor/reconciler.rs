//! Topology change reconciliation
//!
//! Turns a stream of opaque "the display topology may have changed" signals into
//! attach/detach events keyed by monitor serial number.
//!
//! OS notifications arrive in bursts (a single hot-plug typically produces several
//! `WM_DISPLAYCHANGE`/`WM_DEVICECHANGE` messages), so passes are debounced on the
//! trailing edge: each signal pushes a single deadline `window` into the future and
//! the pass runs once the signals stop.
//!
//! # Pass
//!
//! 1. Invalidate all cached device contexts (device names may now map elsewhere)
//! 2. Resolve the attached monitors
//! 3. Diff the serial set against the previous one; monitors without a serial are
//!    not tracked
//! 4. Send `Attached` per new serial, `Detached` per vanished serial, then one `Changed`
//!
//! The state machine takes `Instant` arguments so it can be driven without real
//! delays; [`ChangeReconciler::spawn`] runs it on a worker thread against the clock.

use crate::gamma::device_cache::DeviceContextApi;
use crate::gamma::engine::GammaEngine;
use crate::identity::model::MonitorInfo;
use crate::identity::source::MonitorSource;
use std::collections::BTreeSet;
use std::sync::{Arc, mpsc};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Default quiet period before a pass runs
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// Payload-free "topology may have changed" notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopologySignal;

/// Events emitted after a reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    /// A monitor with a new serial appeared
    Attached(MonitorInfo),
    /// A previously attached monitor is gone; only the serial is populated
    Detached(MonitorInfo),
    /// A pass completed, whether or not anything was attached or detached
    Changed,
}

/// What the reconciler needs from the gamma engine
pub trait TopologySource: Send + Sync {
    /// Release every cached device context
    fn invalidate_device_contexts(&self);

    /// Resolve the currently attached monitors
    fn get_monitors(&self) -> Vec<MonitorInfo>;
}

impl<S: MonitorSource, A: DeviceContextApi> TopologySource for GammaEngine<S, A> {
    fn invalidate_device_contexts(&self) {
        GammaEngine::invalidate_device_contexts(self);
    }

    fn get_monitors(&self) -> Vec<MonitorInfo> {
        GammaEngine::get_monitors(self)
    }
}

/// Serials of the monitors attached as of the last pass
///
/// Ordered, so events are emitted in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownIdentitySet {
    serials: BTreeSet<String>,
}

impl KnownIdentitySet {
    /// Build the set from resolved monitors, skipping empty serials
    pub fn from_monitors(monitors: &[MonitorInfo]) -> Self {
        Self {
            serials: monitors
                .iter()
                .filter(|m| m.has_serial())
                .map(|m| m.serial_number.clone())
                .collect(),
        }
    }

    /// Whether a serial is in the set
    pub fn contains(&self, serial: &str) -> bool {
        self.serials.contains(serial)
    }

    /// Number of serials
    pub fn len(&self) -> usize {
        self.serials.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.serials.is_empty()
    }

    /// Serials in `next` that are not in `self`
    pub fn added<'a>(&'a self, next: &'a Self) -> impl Iterator<Item = &'a String> + 'a {
        next.serials.difference(&self.serials)
    }

    /// Serials in `self` that are not in `next`
    pub fn removed<'a>(&'a self, next: &'a Self) -> impl Iterator<Item = &'a String> + 'a {
        self.serials.difference(&next.serials)
    }
}

/// Debounce state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    /// No pass pending
    Idle,
    /// A pass runs once `deadline` is reached
    Debouncing {
        /// When the pending pass becomes due
        deadline: Instant,
    },
}

/// Debounced topology reconciler
pub struct ChangeReconciler<T: TopologySource> {
    source: Arc<T>,
    event_sender: mpsc::Sender<MonitorEvent>,
    window: Duration,
    state: DebounceState,
    known: KnownIdentitySet,
    passes: usize,
}

impl<T: TopologySource + 'static> ChangeReconciler<T> {
    /// Create a reconciler and take the initial identity snapshot
    pub fn new(source: Arc<T>, event_sender: mpsc::Sender<MonitorEvent>, window: Duration) -> Self {
        let known = KnownIdentitySet::from_monitors(&source.get_monitors());
        info!("Tracking {} monitors with serial numbers", known.len());
        Self {
            source,
            event_sender,
            window,
            state: DebounceState::Idle,
            known,
            passes: 0,
        }
    }

    /// Current debounce state
    pub fn state(&self) -> DebounceState {
        self.state
    }

    /// Serials attached as of the last pass
    pub fn known(&self) -> &KnownIdentitySet {
        &self.known
    }

    /// Number of passes run so far
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// Record a topology signal, restarting the quiet period
    pub fn notify(&mut self, now: Instant) {
        let deadline = now + self.window;
        if self.state == DebounceState::Idle {
            debug!("Topology change signalled, reconciling in {:?}", self.window);
        }
        self.state = DebounceState::Debouncing { deadline };
    }

    /// Time left before the pending pass is due, `None` when idle
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        match self.state {
            DebounceState::Idle => None,
            DebounceState::Debouncing { deadline } => Some(deadline.saturating_duration_since(now)),
        }
    }

    /// Run the pending pass if it is due
    ///
    /// Returns whether a pass ran.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.state {
            DebounceState::Debouncing { deadline } if now >= deadline => {
                self.run_pass();
                self.state = DebounceState::Idle;
                true
            }
            _ => false,
        }
    }

    fn send(&self, event: MonitorEvent) {
        if let Err(e) = self.event_sender.send(event) {
            error!("Failed to send monitor event {:?}: receiver dropped", e.0);
        }
    }

    fn run_pass(&mut self) {
        self.passes += 1;
        self.source.invalidate_device_contexts();

        let monitors = self.source.get_monitors();
        let current = KnownIdentitySet::from_monitors(&monitors);

        for serial in self.known.added(&current) {
            let monitor = monitors
                .iter()
                .find(|m| &m.serial_number == serial)
                .cloned()
                .unwrap_or_else(|| MonitorInfo::from_serial(serial.clone()));
            info!("Monitor attached: {monitor} ({serial})");
            self.send(MonitorEvent::Attached(monitor));
        }

        for serial in self.known.removed(&current) {
            info!("Monitor detached: {serial}");
            self.send(MonitorEvent::Detached(MonitorInfo::from_serial(serial.clone())));
        }

        debug!(
            "Reconciliation pass {} complete: {} monitors attached",
            self.passes,
            monitors.len()
        );
        self.known = current;
        self.send(MonitorEvent::Changed);
    }

    /// Drive the reconciler from a signal channel on a worker thread
    ///
    /// Signals that arrive during a pass stay queued and start a new quiet period
    /// once the pass finishes. The thread exits when every signal sender is dropped.
    pub fn spawn(mut self, signals: mpsc::Receiver<TopologySignal>) -> JoinHandle<()> {
        thread::spawn(move || {
            loop {
                let received = match self.time_until_due(Instant::now()) {
                    None => signals.recv().map_err(|_| mpsc::RecvTimeoutError::Disconnected),
                    Some(wait) => signals.recv_timeout(wait),
                };

                match received {
                    Ok(TopologySignal) => self.notify(Instant::now()),
                    Err(mpsc::RecvTimeoutError::Timeout) => {}
                    Err(mpsc::RecvTimeoutError::Disconnected) => {
                        debug!("Topology signal channel closed, stopping reconciler");
                        break;
                    }
                }

                self.poll(Instant::now());
            }
        })
    }
}
