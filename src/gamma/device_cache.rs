//! Device context cache
//!
//! Owns the per-display drawing-surface handles needed to read and write gamma
//! ramps. Handles are created lazily on first use, keyed by the session-local
//! device name, and released together whenever display topology changes.
//!
//! # Acquisition order
//!
//! 1. Device-specific context (`CreateDC(NULL, device, ...)`), cached on success
//! 2. Context through the display driver (`CreateDC("DISPLAY", device, ...)`), cached on success
//! 3. Whole-screen context (`GetDC(NULL)`), never cached and released when the
//!    returned guard drops
//!
//! Raw handles never leave this module: callers receive a [`DeviceContext`]
//! guard that can only read or write ramps.

use crate::error::{GammaKeeperError, Result};
use crate::gamma::math::GammaRamp;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Low-level device context operations
///
/// Implemented by the GDI backend on Windows and by fakes in tests.
pub trait DeviceContextApi: Send {
    /// Raw handle type
    type Raw: Copy + Eq + std::fmt::Debug + Send;

    /// Create a context for a specific display device
    fn create_device_context(&self, device_name: &str) -> Option<Self::Raw>;

    /// Create a context for a display device through the display driver
    fn create_driver_context(&self, device_name: &str) -> Option<Self::Raw>;

    /// Get the whole-screen context
    fn screen_context(&self) -> Option<Self::Raw>;

    /// Delete a context created by `create_device_context` or `create_driver_context`
    fn delete_context(&self, raw: Self::Raw);

    /// Release the whole-screen context
    fn release_screen_context(&self, raw: Self::Raw);

    /// Read the current hardware gamma ramp
    fn read_ramp(&self, raw: Self::Raw) -> Result<GammaRamp>;

    /// Write a hardware gamma ramp
    fn write_ramp(&self, raw: Self::Raw, ramp: &GammaRamp) -> Result<()>;
}

/// Where a [`DeviceContext`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextSource {
    /// Cached device-specific context
    Device,
    /// Uncached whole-screen fallback
    Screen,
}

/// Scoped access to a device context
///
/// Cached contexts stay owned by the cache; a whole-screen fallback is released
/// when the guard drops.
pub struct DeviceContext<'a, A: DeviceContextApi> {
    api: &'a A,
    raw: A::Raw,
    source: ContextSource,
}

impl<A: DeviceContextApi> DeviceContext<'_, A> {
    /// Whether this is a cached device context or the whole-screen fallback
    pub fn source(&self) -> ContextSource {
        self.source
    }

    /// Read the current hardware gamma ramp
    pub fn read_ramp(&self) -> Result<GammaRamp> {
        self.api.read_ramp(self.raw)
    }

    /// Write a hardware gamma ramp
    pub fn write_ramp(&self, ramp: &GammaRamp) -> Result<()> {
        self.api.write_ramp(self.raw, ramp)
    }
}

impl<A: DeviceContextApi> Drop for DeviceContext<'_, A> {
    fn drop(&mut self) {
        if self.source == ContextSource::Screen {
            self.api.release_screen_context(self.raw);
        }
    }
}

/// Cache of device contexts keyed by device name
pub struct DeviceHandleCache<A: DeviceContextApi> {
    api: A,
    contexts: HashMap<String, A::Raw>,
}

impl<A: DeviceContextApi> DeviceHandleCache<A> {
    /// Create an empty cache over the given backend
    pub fn new(api: A) -> Self {
        Self {
            api,
            contexts: HashMap::new(),
        }
    }

    /// Acquire a context for a device, falling back to the whole screen
    ///
    /// Returns `NoDeviceContext` only when every path failed.
    pub fn acquire(&mut self, device_name: &str) -> Result<DeviceContext<'_, A>> {
        if let Some(&raw) = self.contexts.get(device_name) {
            debug!("Using cached device context for {device_name}: {raw:?}");
            return Ok(DeviceContext {
                api: &self.api,
                raw,
                source: ContextSource::Device,
            });
        }

        let created = self.api.create_device_context(device_name).or_else(|| {
            debug!("Device context for '{device_name}' failed, trying display driver");
            self.api.create_driver_context(device_name)
        });

        if let Some(raw) = created {
            debug!("Created device context for {device_name}: {raw:?}");
            self.contexts.insert(device_name.to_string(), raw);
            return Ok(DeviceContext {
                api: &self.api,
                raw,
                source: ContextSource::Device,
            });
        }

        warn!("No device-specific context for '{device_name}', falling back to screen context");
        match self.api.screen_context() {
            Some(raw) => Ok(DeviceContext {
                api: &self.api,
                raw,
                source: ContextSource::Screen,
            }),
            None => Err(GammaKeeperError::NoDeviceContext(device_name.to_string())),
        }
    }

    /// Release every cached context and clear the cache
    pub fn invalidate_all(&mut self) {
        if self.contexts.is_empty() {
            return;
        }
        debug!("Releasing {} cached device contexts", self.contexts.len());
        for (_, raw) in self.contexts.drain() {
            self.api.delete_context(raw);
        }
    }

    /// Number of cached contexts
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    /// Whether the cache holds no contexts
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Whether a context is cached for a device
    pub fn contains(&self, device_name: &str) -> bool {
        self.contexts.contains_key(device_name)
    }
}

impl<A: DeviceContextApi> Drop for DeviceHandleCache<A> {
    fn drop(&mut self) {
        self.invalidate_all();
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory device context backend

    use super::DeviceContextApi;
    use crate::error::{GammaKeeperError, Result, StringError};
    use crate::gamma::math::GammaRamp;
    use parking_lot::Mutex;
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;

    /// Handle value used for the whole-screen context
    pub const SCREEN: u32 = 0;

    /// Shared, inspectable state of the fake backend
    #[derive(Default)]
    pub struct FakeState {
        pub next_handle: u32,
        /// Devices for which `create_device_context` succeeds
        pub direct: HashSet<String>,
        /// Devices for which `create_driver_context` succeeds
        pub via_driver: HashSet<String>,
        pub screen_available: bool,
        pub fail_writes: bool,
        pub live: HashMap<u32, String>,
        pub deleted: Vec<u32>,
        pub screen_releases: usize,
        pub ramps: HashMap<u32, GammaRamp>,
        pub writes: Vec<(String, GammaRamp)>,
    }

    /// Fake backend; clones share state
    #[derive(Clone, Default)]
    pub struct FakeApi {
        pub state: Arc<Mutex<FakeState>>,
    }

    impl FakeApi {
        pub fn with_devices(devices: &[&str]) -> Self {
            let api = Self::default();
            {
                let mut state = api.state.lock();
                state.next_handle = 1;
                state.screen_available = true;
                state.direct = devices.iter().map(ToString::to_string).collect();
            }
            api
        }

        fn allocate(state: &mut FakeState, device_name: &str) -> u32 {
            let handle = state.next_handle.max(1);
            state.next_handle = handle + 1;
            state.live.insert(handle, device_name.to_string());
            handle
        }
    }

    impl DeviceContextApi for FakeApi {
        type Raw = u32;

        fn create_device_context(&self, device_name: &str) -> Option<u32> {
            let mut state = self.state.lock();
            state
                .direct
                .contains(device_name)
                .then(|| Self::allocate(&mut state, device_name))
        }

        fn create_driver_context(&self, device_name: &str) -> Option<u32> {
            let mut state = self.state.lock();
            state
                .via_driver
                .contains(device_name)
                .then(|| Self::allocate(&mut state, device_name))
        }

        fn screen_context(&self) -> Option<u32> {
            self.state.lock().screen_available.then_some(SCREEN)
        }

        fn delete_context(&self, raw: u32) {
            let mut state = self.state.lock();
            state.live.remove(&raw);
            state.deleted.push(raw);
        }

        fn release_screen_context(&self, _raw: u32) {
            self.state.lock().screen_releases += 1;
        }

        fn read_ramp(&self, raw: u32) -> Result<GammaRamp> {
            Ok(self
                .state
                .lock()
                .ramps
                .get(&raw)
                .cloned()
                .unwrap_or_else(GammaRamp::identity))
        }

        fn write_ramp(&self, raw: u32, ramp: &GammaRamp) -> Result<()> {
            let mut state = self.state.lock();
            if state.fail_writes {
                return Err(GammaKeeperError::GammaRampFailed(StringError::new(
                    "write rejected",
                )));
            }
            let device = if raw == SCREEN {
                "screen".to_string()
            } else {
                state.live.get(&raw).cloned().unwrap_or_default()
            };
            state.ramps.insert(raw, ramp.clone());
            state.writes.push((device, ramp.clone()));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::{FakeApi, SCREEN};
    use super::*;

    #[test]
    fn test_acquire_caches_device_context() {
        let api = FakeApi::with_devices(&["\\\\.\\DISPLAY1"]);
        let mut cache = DeviceHandleCache::new(api.clone());

        let first = cache.acquire("\\\\.\\DISPLAY1").unwrap().raw;
        let second = cache.acquire("\\\\.\\DISPLAY1").unwrap().raw;

        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
        assert_eq!(api.state.lock().live.len(), 1);
    }

    #[test]
    fn test_acquire_falls_back_to_driver_path() {
        let api = FakeApi::with_devices(&[]);
        api.state.lock().via_driver.insert("\\\\.\\DISPLAY2".to_string());
        let mut cache = DeviceHandleCache::new(api);

        let context = cache.acquire("\\\\.\\DISPLAY2").unwrap();
        assert_eq!(context.source(), ContextSource::Device);
        drop(context);
        assert!(cache.contains("\\\\.\\DISPLAY2"));
    }

    #[test]
    fn test_screen_fallback_is_not_cached_and_is_released() {
        let api = FakeApi::with_devices(&[]);
        let mut cache = DeviceHandleCache::new(api.clone());

        {
            let context = cache.acquire("\\\\.\\DISPLAY9").unwrap();
            assert_eq!(context.source(), ContextSource::Screen);
            assert_eq!(context.raw, SCREEN);
        }

        assert!(cache.is_empty());
        assert_eq!(api.state.lock().screen_releases, 1);

        // A later device gets its own attempt rather than the old screen handle
        api.state.lock().direct.insert("\\\\.\\DISPLAY3".to_string());
        let context = cache.acquire("\\\\.\\DISPLAY3").unwrap();
        assert_eq!(context.source(), ContextSource::Device);
    }

    #[test]
    fn test_no_context_at_all() {
        let api = FakeApi::with_devices(&[]);
        api.state.lock().screen_available = false;
        let mut cache = DeviceHandleCache::new(api);

        let result = cache.acquire("\\\\.\\DISPLAY1");
        assert!(matches!(
            result,
            Err(GammaKeeperError::NoDeviceContext(ref name)) if name == "\\\\.\\DISPLAY1"
        ));
    }

    #[test]
    fn test_invalidate_all_releases_every_handle() {
        let api = FakeApi::with_devices(&["\\\\.\\DISPLAY1", "\\\\.\\DISPLAY2"]);
        let mut cache = DeviceHandleCache::new(api.clone());

        let old1 = cache.acquire("\\\\.\\DISPLAY1").unwrap().raw;
        let old2 = cache.acquire("\\\\.\\DISPLAY2").unwrap().raw;

        cache.invalidate_all();

        assert!(cache.is_empty());
        {
            let state = api.state.lock();
            assert!(state.live.is_empty());
            assert!(state.deleted.contains(&old1));
            assert!(state.deleted.contains(&old2));
        }

        let fresh = cache.acquire("\\\\.\\DISPLAY1").unwrap().raw;
        assert_ne!(fresh, old1);
        assert_ne!(fresh, old2);
    }

    #[test]
    fn test_drop_releases_handles() {
        let api = FakeApi::with_devices(&["\\\\.\\DISPLAY1"]);
        {
            let mut cache = DeviceHandleCache::new(api.clone());
            let _ = cache.acquire("\\\\.\\DISPLAY1").unwrap();
        }
        assert!(api.state.lock().live.is_empty());
    }
}
