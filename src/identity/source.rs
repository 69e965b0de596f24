//! OS data sources for monitor identity
//!
//! [`MonitorSource`] is the seam between the resolver and the operating system.
//! The system implementation reads:
//!
//! - the inventory from the EDID blocks cached under
//!   `HKLM\SYSTEM\CurrentControlSet\Enum\DISPLAY\<model>\<instance>\Device Parameters`
//! - the display outputs from `EnumDisplayDevicesW`, with a second call per output
//!   to get the attached monitor's device interface path
//!
//! Both lists are returned best-effort: a failed query yields fewer entries, never
//! an error.

use crate::identity::model::{DisplayOutput, InventoryRecord};

#[cfg(windows)]
pub use imp::SystemMonitorSource;

#[cfg(not(windows))]
pub use stub::SystemMonitorSource;

/// Source of raw monitor data
pub trait MonitorSource: Send + Sync {
    /// Monitor inventory records carrying serial numbers
    fn inventory(&self) -> Vec<InventoryRecord>;

    /// Display outputs in OS enumeration order
    fn display_outputs(&self) -> Vec<DisplayOutput>;
}

#[cfg(windows)]
mod imp {
    use super::MonitorSource;
    use crate::error::{GammaKeeperError, Result};
    use crate::identity::edid::parse_edid;
    use crate::identity::model::{DisplayOutput, InventoryRecord, MonitorDevice};
    use tracing::{debug, warn};
    use windows::Win32::Graphics::Gdi::{
        DISPLAY_DEVICE_ATTACHED_TO_DESKTOP, DISPLAY_DEVICE_PRIMARY_DEVICE, DISPLAY_DEVICEW,
        EnumDisplayDevicesW,
    };
    use windows::core::{HSTRING, PCWSTR};
    use winreg::RegKey;
    use winreg::enums::{HKEY_LOCAL_MACHINE, KEY_READ};

    /// Registry root holding one subkey per monitor model
    const DISPLAY_ENUM_KEY: &str = r"SYSTEM\CurrentControlSet\Enum\DISPLAY";

    /// Ask `EnumDisplayDevicesW` for the device interface path in `DeviceID`
    const EDD_GET_DEVICE_INTERFACE_NAME: u32 = 0x0000_0001;

    /// Upper bound on outputs enumerated; guards against a misbehaving driver
    const MAX_OUTPUTS: u32 = 64;

    /// Convert a NUL-terminated wide buffer to a `String`
    fn from_wide(buffer: &[u16]) -> String {
        let len = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
        String::from_utf16_lossy(&buffer[..len])
    }

    fn empty_device() -> DISPLAY_DEVICEW {
        DISPLAY_DEVICEW {
            cb: u32::try_from(std::mem::size_of::<DISPLAY_DEVICEW>()).unwrap_or(u32::MAX),
            ..Default::default()
        }
    }

    /// Reads monitor data from the registry and the display enumeration
    #[derive(Debug, Default, Clone, Copy)]
    pub struct SystemMonitorSource;

    impl SystemMonitorSource {
        /// Create the source
        pub fn new() -> Self {
            Self
        }

        /// Query the first monitor attached to an output
        ///
        /// # Safety
        ///
        /// `EnumDisplayDevicesW` writes into a properly sized `DISPLAY_DEVICEW`
        /// whose `cb` field is initialized; the device name `HSTRING` outlives the call.
        #[expect(unsafe_code, reason = "Windows FFI for EnumDisplayDevicesW")]
        fn query_monitor(device_name: &str) -> Option<MonitorDevice> {
            let parent = HSTRING::from(device_name);
            let mut device = empty_device();
            let found = unsafe {
                EnumDisplayDevicesW(&parent, 0, &raw mut device, EDD_GET_DEVICE_INTERFACE_NAME)
            };
            if !found.as_bool() {
                debug!("No monitor reported on output {device_name}");
                return None;
            }
            Some(MonitorDevice {
                device_id: from_wide(&device.DeviceID),
                device_string: from_wide(&device.DeviceString),
            })
        }

        /// Open the registry key listing every monitor model seen on this machine
        fn open_inventory() -> Result<RegKey> {
            RegKey::predef(HKEY_LOCAL_MACHINE)
                .open_subkey_with_flags(DISPLAY_ENUM_KEY, KEY_READ)
                .map_err(|e| GammaKeeperError::EnumerationFailed(Box::new(e)))
        }

        fn read_instance(model_key: &RegKey, model: &str, instance: &str) -> Option<InventoryRecord> {
            let parameters = model_key
                .open_subkey_with_flags(format!(r"{instance}\Device Parameters"), KEY_READ)
                .ok()?;
            let value = parameters.get_raw_value("EDID").ok()?;
            let Some(identity) = parse_edid(&value.bytes[..]) else {
                debug!("Ignoring malformed EDID for DISPLAY\\{model}\\{instance}");
                return None;
            };
            Some(InventoryRecord {
                instance_path: format!(r"DISPLAY\{model}\{instance}"),
                friendly_name: identity.friendly_name,
                serial_number: identity.serial_number,
                manufacturer: identity.manufacturer,
            })
        }
    }

    impl MonitorSource for SystemMonitorSource {
        fn inventory(&self) -> Vec<InventoryRecord> {
            let display = match Self::open_inventory() {
                Ok(key) => key,
                Err(e) => {
                    warn!("Cannot open monitor inventory {DISPLAY_ENUM_KEY}: {e}");
                    return Vec::new();
                }
            };

            let mut records = Vec::new();
            for model in display.enum_keys().filter_map(std::result::Result::ok) {
                let Ok(model_key) = display.open_subkey_with_flags(&model, KEY_READ) else {
                    continue;
                };
                for instance in model_key.enum_keys().filter_map(std::result::Result::ok) {
                    if let Some(record) = Self::read_instance(&model_key, &model, &instance) {
                        records.push(record);
                    }
                }
            }
            records
        }

        #[expect(unsafe_code, reason = "Windows FFI for EnumDisplayDevicesW")]
        fn display_outputs(&self) -> Vec<DisplayOutput> {
            let mut outputs = Vec::new();
            for index in 0..MAX_OUTPUTS {
                let mut device = empty_device();
                // SAFETY: device is a valid, correctly sized out-parameter
                let found =
                    unsafe { EnumDisplayDevicesW(PCWSTR::null(), index, &raw mut device, 0) };
                if !found.as_bool() {
                    break;
                }

                let device_name = from_wide(&device.DeviceName);
                let flags = device.StateFlags.0;
                let attached = flags & DISPLAY_DEVICE_ATTACHED_TO_DESKTOP.0 != 0;
                let monitor = if attached {
                    Self::query_monitor(&device_name)
                } else {
                    None
                };

                outputs.push(DisplayOutput {
                    device_string: from_wide(&device.DeviceString),
                    attached,
                    primary: flags & DISPLAY_DEVICE_PRIMARY_DEVICE.0 != 0,
                    monitor,
                    device_name,
                });
            }
            outputs
        }
    }
}

#[cfg(not(windows))]
mod stub {
    use super::MonitorSource;
    use crate::identity::model::{DisplayOutput, InventoryRecord};

    /// Stub source for non-Windows platforms; reports no monitors
    #[derive(Debug, Default, Clone, Copy)]
    pub struct SystemMonitorSource;

    impl SystemMonitorSource {
        /// Create the source
        pub fn new() -> Self {
            Self
        }
    }

    impl MonitorSource for SystemMonitorSource {
        fn inventory(&self) -> Vec<InventoryRecord> {
            Vec::new()
        }

        fn display_outputs(&self) -> Vec<DisplayOutput> {
            Vec::new()
        }
    }
}
