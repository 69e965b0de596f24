//! Single instance enforcement
//!
//! Ensures only one resident instance watches for display changes, using a
//! Windows named mutex. One-shot commands do not take the lock.

use crate::error::{GammaKeeperError, Result};
use tracing::{debug, error};

#[cfg(windows)]
use windows::Win32::Foundation::{CloseHandle, ERROR_ALREADY_EXISTS, GetLastError, HANDLE};
#[cfg(windows)]
use windows::Win32::System::Threading::CreateMutexW;

/// Name of the mutex held by the resident instance
pub const INSTANCE_MUTEX_NAME: &str = "Global\\GammaKeeper_SingleInstance_Mutex";

/// Single instance guard using a Windows named mutex (released on drop)
#[cfg(windows)]
pub struct SingleInstanceGuard {
    mutex_handle: HANDLE,
}

#[cfg(windows)]
impl SingleInstanceGuard {
    /// Take the application-wide instance lock
    pub fn new() -> Result<Self> {
        Self::acquire(INSTANCE_MUTEX_NAME)
    }

    /// Take a named instance lock, failing with `AlreadyRunning` if it is held
    ///
    /// # Safety
    ///
    /// `CreateMutexW` receives default security attributes and a name owned by
    /// the `HSTRING` for the duration of the call. `GetLastError` is read right
    /// after, before any other API call can overwrite it. A handle to an existing
    /// mutex is closed before returning.
    #[expect(unsafe_code, reason = "Windows FFI for CreateMutexW")]
    pub fn acquire(name: &str) -> Result<Self> {
        use windows::core::HSTRING;

        let mutex_name = HSTRING::from(name);
        unsafe {
            let mutex_handle = CreateMutexW(None, true, &mutex_name)?;
            if GetLastError() == ERROR_ALREADY_EXISTS {
                error!("Another instance of GammaKeeper is already running");
                let _ = CloseHandle(mutex_handle);
                return Err(GammaKeeperError::AlreadyRunning);
            }
            debug!("Single instance mutex {name} created");
            Ok(Self { mutex_handle })
        }
    }
}

#[cfg(windows)]
impl Drop for SingleInstanceGuard {
    #[expect(unsafe_code, reason = "Windows FFI for mutex cleanup")]
    fn drop(&mut self) {
        // SAFETY: the handle came from CreateMutexW and is closed exactly once
        unsafe {
            let _ = CloseHandle(self.mutex_handle);
        }
        debug!("Single instance mutex released");
    }
}

/// Names held by this process
#[cfg(not(windows))]
static HELD_NAMES: parking_lot::Mutex<std::collections::BTreeSet<String>> =
    parking_lot::Mutex::new(std::collections::BTreeSet::new());

/// In-process guard for non-Windows platforms
#[cfg(not(windows))]
pub struct SingleInstanceGuard {
    name: String,
}

#[cfg(not(windows))]
impl SingleInstanceGuard {
    /// Take the application-wide instance lock
    pub fn new() -> Result<Self> {
        Self::acquire(INSTANCE_MUTEX_NAME)
    }

    /// Take a named instance lock, failing with `AlreadyRunning` if it is held
    pub fn acquire(name: &str) -> Result<Self> {
        if !HELD_NAMES.lock().insert(name.to_string()) {
            error!("Another instance of GammaKeeper is already running");
            return Err(GammaKeeperError::AlreadyRunning);
        }
        debug!("Single instance lock {name} taken");
        Ok(Self {
            name: name.to_string(),
        })
    }
}

#[cfg(not(windows))]
impl Drop for SingleInstanceGuard {
    fn drop(&mut self) {
        HELD_NAMES.lock().remove(&self.name);
        debug!("Single instance lock released");
    }
}
