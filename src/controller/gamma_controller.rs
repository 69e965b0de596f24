//! Gamma controller implementation
//!
//! Coordinates the gamma engine with the settings store: applies remembered
//! curves when monitors are connected and records the curves the user sets.

use crate::config::SettingsStore;
use crate::gamma::device_cache::DeviceContextApi;
use crate::gamma::engine::GammaEngine;
use crate::gamma::math::DEFAULT_GAMMA;
use crate::identity::model::MonitorInfo;
use crate::identity::source::MonitorSource;
use crate::monitor::MonitorEvent;
use std::sync::{Arc, mpsc};
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

/// Application logic controller
pub struct GammaController<S: MonitorSource, A: DeviceContextApi> {
    engine: Arc<GammaEngine<S, A>>,
    settings: Arc<SettingsStore>,
}

impl<S: MonitorSource + 'static, A: DeviceContextApi + 'static> GammaController<S, A> {
    /// Create a controller over a shared engine and settings store
    pub fn new(engine: Arc<GammaEngine<S, A>>, settings: Arc<SettingsStore>) -> Self {
        Self { engine, settings }
    }

    /// The gamma engine
    pub fn engine(&self) -> &GammaEngine<S, A> {
        &self.engine
    }

    /// The settings store
    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// React to a reconciler event
    ///
    /// Returns whether a remembered curve was applied.
    pub fn handle_event(&self, event: &MonitorEvent) -> bool {
        match event {
            MonitorEvent::Attached(monitor) => self.handle_attached(monitor),
            MonitorEvent::Detached(monitor) => {
                info!("Monitor disconnected: {}", monitor.serial_number);
                false
            }
            MonitorEvent::Changed => {
                debug!("Display topology changed");
                false
            }
        }
    }

    fn handle_attached(&self, monitor: &MonitorInfo) -> bool {
        let serial = &monitor.serial_number;
        // One-shot commands may have changed the file since the last event
        self.settings.reload();
        if !self.settings.apply_on_connect() {
            debug!("Apply-on-connect disabled, leaving {monitor} unchanged");
            return false;
        }
        if !self.settings.is_monitor_known(serial) {
            debug!("No remembered curve for {monitor} ({serial})");
            return false;
        }

        // Device names may have shifted since the event was produced
        let Some(current) = self
            .engine
            .get_monitors()
            .into_iter()
            .find(|m| &m.serial_number == serial)
        else {
            warn!("Monitor {serial} vanished before its curve could be applied");
            return false;
        };

        let gamma = self.settings.get_monitor_gamma(serial);
        info!("Applying remembered gamma {gamma:.2} to newly connected {current}");
        self.engine.set_gamma(&current, gamma)
    }

    /// Apply remembered curves to every attached monitor that has one
    ///
    /// Returns how many curves were applied.
    pub fn restore_all(&self) -> usize {
        self.settings.reload();
        let mut applied = 0;
        for monitor in self.engine.get_monitors() {
            if !self.settings.is_monitor_known(&monitor.serial_number) {
                continue;
            }
            let gamma = self.settings.get_monitor_gamma(&monitor.serial_number);
            if self.engine.set_gamma(&monitor, gamma) {
                applied += 1;
            }
        }
        info!("Restored remembered gamma on {applied} monitors");
        applied
    }

    /// Apply a curve and remember it if the driver accepted it
    ///
    /// Monitors without a serial are adjusted for this session only.
    pub fn set_and_remember(&self, monitor: &MonitorInfo, gamma: f64) -> bool {
        if !self.engine.set_gamma(monitor, gamma) {
            return false;
        }
        if monitor.has_serial() {
            self.settings
                .set_monitor_gamma(&monitor.serial_number, monitor.display_name(), gamma);
            self.settings
                .set_last_selected_serial(Some(&monitor.serial_number));
        } else {
            info!("{monitor} has no serial number; gamma will not be remembered");
        }
        true
    }

    /// Reset every attached monitor to the linear curve and remember it
    ///
    /// Returns how many monitors were reset.
    pub fn reset_all(&self) -> usize {
        self.engine
            .get_monitors()
            .iter()
            .filter(|monitor| self.set_and_remember(monitor, DEFAULT_GAMMA))
            .count()
    }

    /// Process events until every sender is dropped
    pub fn run(&self, events: &mpsc::Receiver<MonitorEvent>) {
        info!("Entering monitor event loop");
        while let Ok(event) = events.recv() {
            self.handle_event(&event);
        }
        info!("Monitor event channel closed, exiting event loop");
    }

    /// Run the event loop on a background thread
    pub fn spawn_event_loop(self: Arc<Self>, events: mpsc::Receiver<MonitorEvent>) -> JoinHandle<()> {
        std::thread::spawn(move || self.run(&events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamma::device_cache::fake::FakeApi;
    use crate::gamma::math::compute_ramp;
    use crate::identity::source::fake::FakeSource;
    use crate::test_utils::create_test_dir;
    use tempfile::TempDir;

    struct Fixture {
        controller: GammaController<FakeSource, FakeApi>,
        source: FakeSource,
        api: FakeApi,
        _dir: TempDir,
    }

    fn fixture(monitors: &[(&str, &str)]) -> Fixture {
        let dir = create_test_dir();
        let source = FakeSource::with_monitors(monitors);
        let api = FakeApi::with_devices(&["\\\\.\\DISPLAY1", "\\\\.\\DISPLAY2", "\\\\.\\DISPLAY3"]);
        let engine = Arc::new(GammaEngine::new(source.clone(), api.clone()));
        let settings = Arc::new(SettingsStore::with_path(dir.path().join("settings.json")));
        Fixture {
            controller: GammaController::new(engine, settings),
            source,
            api,
            _dir: dir,
        }
    }

    fn writes(api: &FakeApi) -> Vec<(String, crate::gamma::math::GammaRamp)> {
        api.state.lock().writes.clone()
    }

    #[test]
    fn test_attached_known_monitor_gets_curve() {
        let f = fixture(&[("S1", "\\\\.\\DISPLAY1")]);
        f.controller.settings().set_monitor_gamma("S1", "Monitor S1", 1.3);

        // The monitor reappears on a different output than the event reported
        f.source.set_monitors(&[("S1", "\\\\.\\DISPLAY2")]);
        let event = MonitorEvent::Attached(MonitorInfo {
            device_name: "\\\\.\\DISPLAY1".to_string(),
            serial_number: "S1".to_string(),
            ..MonitorInfo::default()
        });

        assert!(f.controller.handle_event(&event));
        let writes = writes(&f.api);
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, "\\\\.\\DISPLAY2");
        assert_eq!(writes[0].1, compute_ramp(1.3));
    }

    #[test]
    fn test_attached_unknown_monitor_is_left_alone() {
        let f = fixture(&[("S1", "\\\\.\\DISPLAY1")]);
        let event = MonitorEvent::Attached(MonitorInfo::from_serial("S1"));
        assert!(!f.controller.handle_event(&event));
        assert!(writes(&f.api).is_empty());
    }

    #[test]
    fn test_apply_on_connect_disabled() {
        let f = fixture(&[("S1", "\\\\.\\DISPLAY1")]);
        f.controller.settings().set_monitor_gamma("S1", "Monitor S1", 1.3);
        f.controller.settings().set_apply_on_connect(false);

        assert!(!f.controller.handle_event(&MonitorEvent::Attached(MonitorInfo::from_serial("S1"))));
        assert!(writes(&f.api).is_empty());
    }

    #[test]
    fn test_detached_and_changed_do_nothing() {
        let f = fixture(&[("S1", "\\\\.\\DISPLAY1")]);
        assert!(!f.controller.handle_event(&MonitorEvent::Detached(MonitorInfo::from_serial("S1"))));
        assert!(!f.controller.handle_event(&MonitorEvent::Changed));
        assert!(writes(&f.api).is_empty());
    }

    #[test]
    fn test_restore_all_applies_known_only() {
        let f = fixture(&[("S1", "\\\\.\\DISPLAY1"), ("S2", "\\\\.\\DISPLAY2"), ("", "\\\\.\\DISPLAY3")]);
        f.controller.settings().set_monitor_gamma("S2", "Monitor S2", 0.8);

        assert_eq!(f.controller.restore_all(), 1);
        let writes = writes(&f.api);
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, "\\\\.\\DISPLAY2");
    }

    #[test]
    fn test_set_and_remember() {
        let f = fixture(&[("S1", "\\\\.\\DISPLAY1"), ("", "\\\\.\\DISPLAY2")]);
        let monitors = f.controller.engine().get_monitors();

        assert!(f.controller.set_and_remember(&monitors[0], 1.55));
        assert!((f.controller.settings().get_monitor_gamma("S1") - 1.55).abs() < f64::EPSILON);
        assert_eq!(f.controller.settings().last_selected_serial().as_deref(), Some("S1"));

        // No serial: applied, not remembered
        assert!(f.controller.set_and_remember(&monitors[1], 1.2));
        assert_eq!(f.controller.settings().known_serials(), vec!["S1"]);
    }

    #[test]
    fn test_set_and_remember_names_unnamed_monitor() {
        let f = fixture(&[]);
        let monitor = MonitorInfo {
            device_name: "\\\\.\\DISPLAY1".to_string(),
            serial_number: "S9".to_string(),
            ..MonitorInfo::default()
        };

        assert!(f.controller.set_and_remember(&monitor, 1.2));
        let saved = f.controller.settings().snapshot();
        assert_eq!(saved.monitor_settings["S9"].friendly_name, "\\\\.\\DISPLAY1");
    }

    #[test]
    fn test_attached_sees_curve_saved_by_other_process() {
        let f = fixture(&[("S1", "\\\\.\\DISPLAY1")]);
        let one_shot = SettingsStore::with_path(f.controller.settings().path());
        one_shot.set_monitor_gamma("S1", "Monitor S1", 1.3);

        assert!(f.controller.handle_event(&MonitorEvent::Attached(MonitorInfo::from_serial("S1"))));
        assert_eq!(writes(&f.api)[0].1, compute_ramp(1.3));

        one_shot.set_apply_on_connect(false);
        assert!(!f.controller.handle_event(&MonitorEvent::Attached(MonitorInfo::from_serial("S1"))));
        assert_eq!(writes(&f.api).len(), 1);
    }

    #[test]
    fn test_restore_all_sees_curve_saved_by_other_process() {
        let f = fixture(&[("S1", "\\\\.\\DISPLAY1")]);
        SettingsStore::with_path(f.controller.settings().path()).set_monitor_gamma("S1", "Monitor S1", 0.7);

        assert_eq!(f.controller.restore_all(), 1);
        assert_eq!(writes(&f.api)[0].1, compute_ramp(0.7));
    }

    #[test]
    fn test_set_and_remember_skips_persist_on_failure() {
        let f = fixture(&[("S1", "\\\\.\\DISPLAY1")]);
        f.api.state.lock().fail_writes = true;
        let monitor = f.controller.engine().get_monitors().remove(0);

        assert!(!f.controller.set_and_remember(&monitor, 1.55));
        assert!(!f.controller.settings().is_monitor_known("S1"));
    }

    #[test]
    fn test_reset_all_remembers_default() {
        let f = fixture(&[("S1", "\\\\.\\DISPLAY1"), ("S2", "\\\\.\\DISPLAY2")]);
        f.controller.settings().set_monitor_gamma("S1", "Monitor S1", 1.8);

        assert_eq!(f.controller.reset_all(), 2);
        assert!((f.controller.settings().get_monitor_gamma("S1") - 1.0).abs() < f64::EPSILON);
        assert!(f.controller.settings().is_monitor_known("S2"));
    }

    #[test]
    fn test_event_loop_exits_on_disconnect() {
        let f = fixture(&[("S1", "\\\\.\\DISPLAY1")]);
        f.controller.settings().set_monitor_gamma("S1", "Monitor S1", 1.3);
        let controller = Arc::new(f.controller);

        let (tx, rx) = mpsc::channel();
        let handle = Arc::clone(&controller).spawn_event_loop(rx);
        tx.send(MonitorEvent::Attached(MonitorInfo::from_serial("S1"))).unwrap();
        tx.send(MonitorEvent::Changed).unwrap();
        drop(tx);
        handle.join().unwrap();

        assert_eq!(writes(&f.api).len(), 1);
    }
}
