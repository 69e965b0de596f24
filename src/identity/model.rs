//! Monitor identity data types

use serde::{Deserialize, Serialize};

/// A physical monitor as resolved during one enumeration pass
///
/// `serial_number` is the durable identity key across reconnects and reboots;
/// `device_name` is only meaningful within the current session and is what the
/// OS uses to address the output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorInfo {
    /// OS logical display name (e.g. `\\.\DISPLAY1`)
    pub device_name: String,
    /// Human-readable model name, may be empty
    pub friendly_name: String,
    /// Panel serial number, empty when the inventory had no matching record
    pub serial_number: String,
    /// Three-letter PNP manufacturer id
    pub manufacturer: String,
    /// Monitor device interface path
    pub device_path: String,
    /// Whether the OS marks this display as primary
    pub is_primary: bool,
}

impl MonitorInfo {
    /// Minimal record carrying only a serial, used when the full record is gone
    pub fn from_serial(serial_number: impl Into<String>) -> Self {
        Self {
            serial_number: serial_number.into(),
            ..Self::default()
        }
    }

    /// Whether this monitor can be remembered across sessions
    pub fn has_serial(&self) -> bool {
        !self.serial_number.is_empty()
    }

    /// Label for display: friendly name, or the device name when it is empty
    pub fn display_name(&self) -> &str {
        if self.friendly_name.is_empty() {
            &self.device_name
        } else {
            &self.friendly_name
        }
    }
}

impl std::fmt::Display for MonitorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A monitor record from the inventory source
///
/// Keyed by a source-specific path fragment that appears inside the monitor's
/// device interface path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryRecord {
    /// Path fragment, e.g. `DISPLAY\DEL4321\5&1a2b3c4d&0&UID4353`
    pub instance_path: String,
    /// Model name
    pub friendly_name: String,
    /// Serial number
    pub serial_number: String,
    /// Manufacturer id
    pub manufacturer: String,
}

/// The monitor attached to a display output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorDevice {
    /// Device interface path (extended identity string)
    pub device_id: String,
    /// Monitor description, e.g. "Generic PnP Monitor"
    pub device_string: String,
}

/// A display output as reported by the OS display enumeration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayOutput {
    /// Logical display name
    pub device_name: String,
    /// Adapter description
    pub device_string: String,
    /// Whether the output is attached to the desktop
    pub attached: bool,
    /// Whether the output is the primary display
    pub primary: bool,
    /// First monitor on this output, if it could be queried
    pub monitor: Option<MonitorDevice>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_falls_back_to_device_name() {
        let mut monitor = MonitorInfo {
            device_name: "\\\\.\\DISPLAY1".to_string(),
            ..MonitorInfo::default()
        };
        assert_eq!(monitor.display_name(), "\\\\.\\DISPLAY1");

        monitor.friendly_name = "DELL U2720Q".to_string();
        assert_eq!(monitor.display_name(), "DELL U2720Q");
        assert_eq!(monitor.to_string(), "DELL U2720Q");
    }

    #[test]
    fn test_from_serial() {
        let monitor = MonitorInfo::from_serial("S1");
        assert!(monitor.has_serial());
        assert!(monitor.device_name.is_empty());
        assert!(!MonitorInfo::default().has_serial());
    }
}
