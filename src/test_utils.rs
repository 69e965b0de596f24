//! Shared test utilities for `GammaKeeper` unit tests.

use std::sync::Mutex;
use tempfile::TempDir;

/// Serializes tests that modify the APPDATA environment variable
static APPDATA_LOCK: Mutex<()> = Mutex::new(());

/// Create a temporary directory that is removed when dropped
pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Points APPDATA at a temporary directory for the lifetime of the guard
///
/// # Safety Considerations
///
/// `std::env::set_var` and `std::env::remove_var` are unsafe because another
/// thread may read the environment concurrently. Every test that touches APPDATA
/// goes through this guard, which holds `APPDATA_LOCK` for its whole lifetime,
/// and the original value is restored on drop, including during a panic unwind.
/// Tests that only need a settings file use explicit paths instead.
pub struct AppdataGuard {
    original: Option<String>,
    _lock: std::sync::MutexGuard<'static, ()>,
}

#[expect(
    unsafe_code,
    reason = "Test-only environment mutation serialized by APPDATA_LOCK"
)]
impl AppdataGuard {
    /// Set APPDATA to the given temp directory
    pub fn new(temp_dir: &TempDir) -> Self {
        // A panicking test poisons the lock; the guard state is still valid
        let lock = APPDATA_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let original = std::env::var("APPDATA").ok();
        // SAFETY: APPDATA_LOCK is held; see struct-level documentation
        unsafe {
            std::env::set_var("APPDATA", temp_dir.path());
        }
        Self {
            original,
            _lock: lock,
        }
    }
}

#[expect(
    unsafe_code,
    reason = "Test-only environment restore serialized by APPDATA_LOCK"
)]
impl Drop for AppdataGuard {
    fn drop(&mut self) {
        // SAFETY: APPDATA_LOCK is still held by this guard
        unsafe {
            match &self.original {
                Some(original) => std::env::set_var("APPDATA", original),
                None => std::env::remove_var("APPDATA"),
            }
        }
    }
}
