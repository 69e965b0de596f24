//! GDI device context backend
//!
//! Wraps `CreateDCW`/`GetDC` and `GetDeviceGammaRamp`/`SetDeviceGammaRamp`.
//! On non-Windows platforms every operation fails, which the cache and engine
//! treat as a missing device context.

use crate::gamma::device_cache::DeviceContextApi;

#[cfg(windows)]
pub use imp::{GdiDeviceContextApi, RawDc};

#[cfg(not(windows))]
pub use stub::GdiDeviceContextApi;

#[cfg(windows)]
mod imp {
    use super::DeviceContextApi;
    use crate::error::{GammaKeeperError, Result};
    use crate::gamma::math::GammaRamp;
    use tracing::{debug, warn};
    use windows::Win32::Graphics::Gdi::{CreateDCW, DeleteDC, GetDC, HDC, ReleaseDC};
    use windows::Win32::UI::ColorSystem::{GetDeviceGammaRamp, SetDeviceGammaRamp};
    use windows::core::{HSTRING, PCWSTR, w};

    /// Device context handle that may move between threads
    ///
    /// GDI display contexts are not bound to the creating thread for gamma ramp
    /// calls; all use is serialized by the cache's owner.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RawDc(HDC);

    // SAFETY: an HDC is an opaque kernel handle value. The cache that stores it is
    // only reachable through a mutex, so no two threads use a handle concurrently.
    #[expect(
        unsafe_code,
        reason = "HDC wraps a raw pointer; access is serialized by the owning cache"
    )]
    unsafe impl Send for RawDc {}

    /// Real GDI backend
    #[derive(Debug, Default, Clone, Copy)]
    pub struct GdiDeviceContextApi;

    impl GdiDeviceContextApi {
        /// Create the backend
        pub fn new() -> Self {
            Self
        }
    }

    impl DeviceContextApi for GdiDeviceContextApi {
        type Raw = RawDc;

        /// # Safety
        ///
        /// `CreateDCW` receives a null driver, a valid null-terminated device name
        /// owned by the `HSTRING` for the duration of the call, and no DEVMODE.
        /// The returned handle is checked before use.
        #[expect(unsafe_code, reason = "Windows FFI for CreateDCW")]
        fn create_device_context(&self, device_name: &str) -> Option<RawDc> {
            let device = HSTRING::from(device_name);
            let hdc = unsafe { CreateDCW(PCWSTR::null(), &device, PCWSTR::null(), None) };
            if hdc.is_invalid() {
                debug!(
                    "CreateDCW(NULL, '{device_name}') failed: {}",
                    windows::core::Error::from_thread()
                );
                None
            } else {
                Some(RawDc(hdc))
            }
        }

        #[expect(unsafe_code, reason = "Windows FFI for CreateDCW with the DISPLAY driver")]
        fn create_driver_context(&self, device_name: &str) -> Option<RawDc> {
            let device = HSTRING::from(device_name);
            let hdc = unsafe { CreateDCW(w!("DISPLAY"), &device, PCWSTR::null(), None) };
            if hdc.is_invalid() {
                debug!(
                    "CreateDCW(\"DISPLAY\", '{device_name}') failed: {}",
                    windows::core::Error::from_thread()
                );
                None
            } else {
                Some(RawDc(hdc))
            }
        }

        #[expect(unsafe_code, reason = "Windows FFI for GetDC")]
        fn screen_context(&self) -> Option<RawDc> {
            let hdc = unsafe { GetDC(None) };
            if hdc.is_invalid() {
                warn!("GetDC(NULL) failed");
                None
            } else {
                Some(RawDc(hdc))
            }
        }

        #[expect(unsafe_code, reason = "Windows FFI for DeleteDC")]
        fn delete_context(&self, raw: RawDc) {
            // SAFETY: raw came from CreateDCW and is deleted exactly once by the cache
            unsafe {
                let _ = DeleteDC(raw.0);
            }
        }

        #[expect(unsafe_code, reason = "Windows FFI for ReleaseDC")]
        fn release_screen_context(&self, raw: RawDc) {
            // SAFETY: raw came from GetDC(NULL) and is released exactly once by its guard
            unsafe {
                let _ = ReleaseDC(None, raw.0);
            }
        }

        /// # Safety
        ///
        /// `GammaRamp` is `#[repr(C)]` with three `[u16; 256]` arrays, exactly the
        /// 1536-byte buffer `GetDeviceGammaRamp` writes.
        #[expect(unsafe_code, reason = "Windows FFI for GetDeviceGammaRamp")]
        fn read_ramp(&self, raw: RawDc) -> Result<GammaRamp> {
            let mut ramp = GammaRamp::default();
            let ok = unsafe { GetDeviceGammaRamp(raw.0, (&raw mut ramp).cast()) };
            if ok.as_bool() {
                Ok(ramp)
            } else {
                Err(GammaKeeperError::GammaRampFailed(Box::new(
                    windows::core::Error::from_thread(),
                )))
            }
        }

        #[expect(unsafe_code, reason = "Windows FFI for SetDeviceGammaRamp")]
        fn write_ramp(&self, raw: RawDc, ramp: &GammaRamp) -> Result<()> {
            let ok = unsafe { SetDeviceGammaRamp(raw.0, std::ptr::from_ref(ramp).cast()) };
            if ok.as_bool() {
                Ok(())
            } else {
                let error = windows::core::Error::from_thread();
                warn!("SetDeviceGammaRamp failed: {error}");
                Err(GammaKeeperError::GammaRampFailed(Box::new(error)))
            }
        }
    }
}

#[cfg(not(windows))]
mod stub {
    use super::DeviceContextApi;
    use crate::error::{GammaKeeperError, Result, StringError};
    use crate::gamma::math::GammaRamp;

    /// Stub backend for non-Windows platforms; no context is ever available
    #[derive(Debug, Default, Clone, Copy)]
    pub struct GdiDeviceContextApi;

    impl GdiDeviceContextApi {
        /// Create the backend
        pub fn new() -> Self {
            Self
        }
    }

    impl DeviceContextApi for GdiDeviceContextApi {
        type Raw = ();

        fn create_device_context(&self, _device_name: &str) -> Option<()> {
            None
        }

        fn create_driver_context(&self, _device_name: &str) -> Option<()> {
            None
        }

        fn screen_context(&self) -> Option<()> {
            None
        }

        fn delete_context(&self, _raw: ()) {}

        fn release_screen_context(&self, _raw: ()) {}

        fn read_ramp(&self, _raw: ()) -> Result<GammaRamp> {
            Err(GammaKeeperError::GammaRampFailed(StringError::new(
                "Gamma ramps are only supported on Windows",
            )))
        }

        fn write_ramp(&self, _raw: (), _ramp: &GammaRamp) -> Result<()> {
            Err(GammaKeeperError::GammaRampFailed(StringError::new(
                "Gamma ramps are only supported on Windows",
            )))
        }
    }
}
