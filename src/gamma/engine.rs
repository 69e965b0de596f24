//! Per-monitor gamma engine
//!
//! Ties identity resolution, the device context cache and the ramp math together
//! behind a small synchronous API. Every operation is best-effort: failures are
//! logged and turned into a neutral value (`1.0`) or `false`, never a panic.

use crate::error::{GammaKeeperError, Result};
use crate::gamma::device_cache::{ContextSource, DeviceContextApi, DeviceHandleCache};
use crate::gamma::math::{DEFAULT_GAMMA, clamp_gamma, compute_ramp, estimate_gamma};
use crate::gamma::windows_api::GdiDeviceContextApi;
use crate::identity::model::MonitorInfo;
use crate::identity::resolver::MonitorIdentityResolver;
use crate::identity::source::{MonitorSource, SystemMonitorSource};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

/// Engine wired to the real OS backends
pub type SystemGammaEngine = GammaEngine<SystemMonitorSource, GdiDeviceContextApi>;

/// Gamma engine over a monitor source and a device context backend
///
/// The device context cache sits behind a single mutex, so concurrent callers
/// (the command handler and the reconciler worker) never interleave handle
/// creation, ramp writes and invalidation.
pub struct GammaEngine<S: MonitorSource, A: DeviceContextApi> {
    resolver: MonitorIdentityResolver<S>,
    cache: Mutex<DeviceHandleCache<A>>,
}

impl SystemGammaEngine {
    /// Create an engine using the registry/EDID inventory and GDI contexts
    pub fn system() -> Self {
        Self::new(SystemMonitorSource::new(), GdiDeviceContextApi::new())
    }
}

impl<S: MonitorSource, A: DeviceContextApi> GammaEngine<S, A> {
    /// Create an engine over the given backends
    pub fn new(source: S, api: A) -> Self {
        Self {
            resolver: MonitorIdentityResolver::new(source),
            cache: Mutex::new(DeviceHandleCache::new(api)),
        }
    }

    /// Enumerate attached monitors
    ///
    /// Re-enumerates on every call; nothing is cached between calls.
    pub fn get_monitors(&self) -> Vec<MonitorInfo> {
        self.resolver.resolve()
    }

    /// Find an attached monitor by serial, device name or friendly name
    ///
    /// Matching is case-insensitive and checks serials first, so a serial that
    /// happens to equal another monitor's friendly name still wins.
    pub fn find_monitor(&self, selector: &str) -> Result<MonitorInfo> {
        let monitors = self.get_monitors();
        let matches = |value: &str| !value.is_empty() && value.eq_ignore_ascii_case(selector);
        monitors
            .iter()
            .find(|m| matches(&m.serial_number))
            .or_else(|| monitors.iter().find(|m| matches(&m.device_name)))
            .or_else(|| monitors.iter().find(|m| matches(&m.friendly_name)))
            .cloned()
            .ok_or_else(|| GammaKeeperError::MonitorNotFound(selector.to_string()))
    }

    /// Estimate a monitor's current gamma from its hardware ramp
    ///
    /// Returns `1.0` when no device context is available or the ramp cannot be
    /// read. The whole-screen fallback is never read: it reflects the primary
    /// display, not this monitor.
    pub fn get_gamma(&self, monitor: &MonitorInfo) -> f64 {
        let mut cache = self.cache.lock();
        let context = match cache.acquire(&monitor.device_name) {
            Ok(context) if context.source() == ContextSource::Screen => {
                warn!("Cannot read gamma for {monitor}: only the screen context is available");
                return DEFAULT_GAMMA;
            }
            Ok(context) => context,
            Err(e) => {
                warn!("Cannot read gamma for {monitor}: {e}");
                return DEFAULT_GAMMA;
            }
        };

        match context.read_ramp() {
            Ok(ramp) => {
                let gamma = estimate_gamma(&ramp);
                debug!("Current gamma for {monitor}: {gamma:.2}");
                gamma
            }
            Err(e) => {
                warn!("Failed to read gamma ramp for {monitor}: {e}");
                DEFAULT_GAMMA
            }
        }
    }

    /// Apply a gamma curve to a monitor
    ///
    /// The value is clamped to the supported range first. Returns `false` when no
    /// context is available or the driver rejects the ramp.
    pub fn set_gamma(&self, monitor: &MonitorInfo, gamma: f64) -> bool {
        let gamma = clamp_gamma(gamma);
        let ramp = compute_ramp(gamma);

        let mut cache = self.cache.lock();
        let context = match cache.acquire(&monitor.device_name) {
            Ok(context) => context,
            Err(e) => {
                warn!("Cannot set gamma {gamma:.2} on {monitor}: {e}");
                return false;
            }
        };

        match context.write_ramp(&ramp) {
            Ok(()) => {
                info!(
                    "Set gamma {gamma:.2} on {monitor} ({})",
                    monitor.device_name
                );
                true
            }
            Err(e) => {
                warn!("Failed to set gamma {gamma:.2} on {monitor}: {e}");
                false
            }
        }
    }

    /// Restore a monitor's linear curve
    pub fn reset_gamma(&self, monitor: &MonitorInfo) -> bool {
        self.set_gamma(monitor, DEFAULT_GAMMA)
    }

    /// Restore the linear curve on every attached monitor
    ///
    /// Returns how many monitors were reset successfully.
    pub fn reset_all(&self) -> usize {
        let monitors = self.get_monitors();
        let reset = monitors.iter().filter(|m| self.reset_gamma(m)).count();
        info!("Reset gamma on {reset}/{} monitors", monitors.len());
        reset
    }

    /// Release every cached device context
    ///
    /// Called after a topology change, since device names may now refer to
    /// different physical outputs.
    pub fn invalidate_device_contexts(&self) {
        self.cache.lock().invalidate_all();
    }

    /// Number of cached device contexts
    pub fn cached_context_count(&self) -> usize {
        self.cache.lock().len()
    }
}
