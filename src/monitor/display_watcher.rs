//! Display topology notification source
//!
//! Listens for the OS broadcasts that accompany monitor hot-plug, resolution
//! changes and device node changes, and forwards each one as a payload-free
//! [`TopologySignal`] to the reconciler worker.
//!
//! # How It Works
//!
//! 1. Register a window class and create a hidden top-level window on a dedicated thread
//! 2. Report creation success or failure back to [`DisplayWatcher::start`]
//! 3. Pump messages; on `WM_DISPLAYCHANGE` or `WM_DEVICECHANGE` send a signal
//!
//! The window procedure does no work beyond the send. Debouncing and enumeration
//! happen on the reconciler thread so the message pump never stalls.
//!
//! # Why Hidden Window (Not Message-Only)?
//!
//! Message-only windows (`HWND_MESSAGE`) do not receive broadcast messages such as
//! `WM_DISPLAYCHANGE` or `DBT_DEVNODES_CHANGED`. The window is created with
//! `WS_OVERLAPPEDWINDOW`, placed off-screen and never shown.

use crate::error::{GammaKeeperError, Result};
use crate::monitor::reconciler::TopologySignal;
use std::sync::mpsc;
use std::thread::JoinHandle;
use tracing::{debug, warn};

#[cfg(windows)]
use tracing::{error, info};

#[cfg(windows)]
use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
#[cfg(windows)]
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DispatchMessageW, GetMessageW, MSG, PostQuitMessage,
    RegisterClassW, UnregisterClassW, WINDOW_EX_STYLE, WM_DESTROY, WM_DEVICECHANGE,
    WM_DISPLAYCHANGE, WNDCLASSW, WS_OVERLAPPEDWINDOW,
};
#[cfg(windows)]
use windows::core::w;

/// Forward one topology signal
///
/// Returns `false` when the reconciler has gone away.
#[cfg_attr(not(windows), allow(dead_code))]
fn forward_signal(sender: &mpsc::Sender<TopologySignal>, message: &str) -> bool {
    debug!("Received {message}");
    if sender.send(TopologySignal).is_err() {
        warn!("Dropping {message}: reconciler is not running");
        return false;
    }
    true
}

/// Hidden-window listener for display topology broadcasts
pub struct DisplayWatcher {
    signal_sender: mpsc::Sender<TopologySignal>,
}

impl DisplayWatcher {
    /// Create a watcher that forwards signals to `signal_sender`
    pub fn new(signal_sender: mpsc::Sender<TopologySignal>) -> Self {
        Self { signal_sender }
    }

    /// Start listening on a background thread
    ///
    /// Blocks until the hidden window exists, so a failure is reported here rather
    /// than lost on the background thread.
    #[cfg(windows)]
    pub fn start(self) -> Result<JoinHandle<()>> {
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<()>>(1);

        let handle = std::thread::Builder::new()
            .name("display-watcher".to_string())
            .spawn(move || {
                info!("Starting display watcher thread");
                if let Err(e) = self.run_message_loop(&ready_tx) {
                    error!("Display watcher failed: {e}");
                    let _ = ready_tx.send(Err(e));
                }
                info!("Display watcher thread exited");
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(handle),
            Ok(Err(e)) => Err(GammaKeeperError::NotificationSourceUnavailable(Box::new(e))),
            Err(e) => Err(GammaKeeperError::NotificationSourceUnavailable(Box::new(e))),
        }
    }

    /// Start listening; always unavailable off Windows
    #[cfg(not(windows))]
    pub fn start(self) -> Result<JoinHandle<()>> {
        drop(self.signal_sender);
        Err(GammaKeeperError::NotificationSourceUnavailable(
            crate::error::StringError::new("display change notifications require Windows"),
        ))
    }

    /// Create the hidden window and pump messages until it is destroyed
    ///
    /// # Safety
    ///
    /// The class name is a static wide string. `WNDCLASSW` is fully initialized
    /// and `window_proc` matches `WNDPROC`. The window is created, used and
    /// destroyed on this thread only, which is also the thread owning the TLS
    /// sender read by `window_proc`.
    #[cfg(windows)]
    #[expect(unsafe_code, reason = "Windows FFI for window creation and message loop")]
    fn run_message_loop(self, ready: &mpsc::SyncSender<Result<()>>) -> Result<()> {
        let class_name = w!("GammaKeeper_DisplayWatcher");

        SIGNAL_SENDER_TLS.with(|cell| {
            *cell.borrow_mut() = Some(self.signal_sender);
        });

        unsafe {
            let wnd_class = WNDCLASSW {
                lpfnWndProc: Some(window_proc),
                lpszClassName: class_name,
                ..Default::default()
            };

            if RegisterClassW(&raw const wnd_class) == 0 {
                return Err(GammaKeeperError::WindowsApiError(
                    windows::core::Error::from_thread(),
                ));
            }

            let created = CreateWindowExW(
                WINDOW_EX_STYLE(0),
                class_name,
                w!("GammaKeeper Display Watcher"),
                WS_OVERLAPPEDWINDOW,
                -32000,
                -32000,
                1,
                1,
                None,
                None,
                None,
                None,
            );
            let hwnd = match created {
                Ok(hwnd) if !hwnd.0.is_null() => hwnd,
                Ok(_) => {
                    let _ = UnregisterClassW(class_name, None);
                    return Err(GammaKeeperError::WindowsApiError(
                        windows::core::Error::from_thread(),
                    ));
                }
                Err(e) => {
                    let _ = UnregisterClassW(class_name, None);
                    return Err(e.into());
                }
            };

            info!("Created hidden window {hwnd:?} for display change notifications");
            let _ = ready.send(Ok(()));

            let mut msg = MSG::default();
            while GetMessageW(&raw mut msg, None, 0, 0).as_bool() {
                DispatchMessageW(&raw const msg);
            }

            let _ = UnregisterClassW(class_name, None);
            debug!("Unregistered display watcher window class");
        }

        SIGNAL_SENDER_TLS.with(|cell| cell.borrow_mut().take());
        Ok(())
    }
}

#[cfg(windows)]
thread_local! {
    static SIGNAL_SENDER_TLS: std::cell::RefCell<Option<mpsc::Sender<TopologySignal>>> =
        const { std::cell::RefCell::new(None) };
}

#[cfg(windows)]
fn forward_from_tls(message: &str) {
    SIGNAL_SENDER_TLS.with(|cell| {
        if let Some(sender) = cell.borrow().as_ref() {
            forward_signal(sender, message);
        }
    });
}

/// Window procedure for the hidden window
#[cfg(windows)]
#[expect(unsafe_code, reason = "Windows FFI callback")]
unsafe extern "system" fn window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_DISPLAYCHANGE => {
            forward_from_tls("WM_DISPLAYCHANGE");
            LRESULT(0)
        }
        WM_DEVICECHANGE => {
            debug!("WM_DEVICECHANGE event type 0x{:04X}", wparam.0);
            forward_from_tls("WM_DEVICECHANGE");
            // TRUE grants any query-remove request
            LRESULT(1)
        }
        WM_DESTROY => {
            debug!("Received WM_DESTROY message");
            unsafe {
                PostQuitMessage(0);
            }
            LRESULT(0)
        }
        _ => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
    }
}
