//! Monitor identity resolution
//!
//! Merges two loosely related OS data sources into one [`MonitorInfo`] per
//! attached display:
//!
//! 1. The inventory source (EDID records), keyed by an instance path fragment
//! 2. The display enumeration, which knows device names, attachment and primary
//!    state, and the monitor's device interface path
//!
//! The only link between them is that the inventory path fragment appears
//! somewhere inside the interface path. Matching is a case-insensitive substring
//! test after normalizing `#` and `\` separators, first match wins. A colliding
//! or missing match leaves the serial empty; the monitor is still usable for the
//! current session, it just cannot be remembered.

use crate::identity::model::{DisplayOutput, InventoryRecord, MonitorInfo};
use crate::identity::source::MonitorSource;
use tracing::{debug, warn};

/// Resolves monitor identities from a [`MonitorSource`]
pub struct MonitorIdentityResolver<S: MonitorSource> {
    source: S,
}

impl<S: MonitorSource> MonitorIdentityResolver<S> {
    /// Create a resolver over a source
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// The underlying source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Resolve all attached monitors in OS enumeration order
    pub fn resolve(&self) -> Vec<MonitorInfo> {
        let inventory = self.source.inventory();
        for record in &inventory {
            debug!(
                "Inventory monitor: {} - Serial: {} - Path: {}",
                record.friendly_name, record.serial_number, record.instance_path
            );
        }

        let outputs = self.source.display_outputs();
        let monitors = merge(&inventory, &outputs);
        debug!("Resolved {} attached monitors", monitors.len());
        monitors
    }
}

/// Normalize an identity string for comparison
fn normalize(path: &str) -> String {
    path.replace('#', "\\").to_lowercase()
}

/// Find the inventory record whose path fragment appears in `identity`
///
/// Empty fragments never match. When more than one record matches, the first one
/// wins and the collision is logged.
pub fn correlate<'a>(identity: &str, inventory: &'a [InventoryRecord]) -> Option<&'a InventoryRecord> {
    let identity = normalize(identity);
    let mut matches = inventory.iter().filter(|record| {
        !record.instance_path.is_empty() && identity.contains(&normalize(&record.instance_path))
    });

    let first = matches.next()?;
    let extra = matches.count();
    if extra > 0 {
        warn!(
            "Ambiguous monitor identity: '{identity}' matches {} inventory records, using '{}'",
            extra + 1,
            first.instance_path
        );
    }
    Some(first)
}

/// Merge inventory records into the attached display outputs
pub fn merge(inventory: &[InventoryRecord], outputs: &[DisplayOutput]) -> Vec<MonitorInfo> {
    outputs
        .iter()
        .filter(|output| {
            if !output.attached {
                debug!("Skipping detached output {}", output.device_name);
            }
            output.attached
        })
        .map(|output| resolve_output(inventory, output))
        .collect()
}

fn resolve_output(inventory: &[InventoryRecord], output: &DisplayOutput) -> MonitorInfo {
    let mut monitor = MonitorInfo {
        device_name: output.device_name.clone(),
        is_primary: output.primary,
        ..MonitorInfo::default()
    };

    let Some(device) = &output.monitor else {
        monitor.friendly_name.clone_from(&output.device_string);
        return monitor;
    };

    monitor.device_path.clone_from(&device.device_id);
    if let Some(record) = correlate(&device.device_id, inventory) {
        monitor.friendly_name.clone_from(&record.friendly_name);
        monitor.serial_number.clone_from(&record.serial_number);
        monitor.manufacturer.clone_from(&record.manufacturer);
    } else {
        debug!(
            "No inventory record for {} ({}), serial unknown",
            output.device_name, device.device_id
        );
        monitor.friendly_name.clone_from(&device.device_string);
    }
    monitor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::model::MonitorDevice;
    use crate::identity::source::fake::FakeSource;
    use std::collections::BTreeSet;

    fn record(path: &str, name: &str, serial: &str) -> InventoryRecord {
        InventoryRecord {
            instance_path: path.to_string(),
            friendly_name: name.to_string(),
            serial_number: serial.to_string(),
            manufacturer: "DEL".to_string(),
        }
    }

    fn output(index: u32, attached: bool, device_id: Option<&str>) -> DisplayOutput {
        DisplayOutput {
            device_name: format!("\\\\.\\DISPLAY{index}"),
            device_string: "NVIDIA GeForce RTX 3080".to_string(),
            attached,
            primary: index == 1,
            monitor: device_id.map(|id| MonitorDevice {
                device_id: id.to_string(),
                device_string: "Generic PnP Monitor".to_string(),
            }),
        }
    }

    const PATH_A: &str = "\\\\?\\DISPLAY#DEL4321#5&1a2b3c4d&0&UID4353#{e6f07b5f-ee97-4a90-b076-33f57bf4eaa7}";
    const PATH_B: &str = "\\\\?\\DISPLAY#GSM5B7F#5&1a2b3c4d&0&UID4354#{e6f07b5f-ee97-4a90-b076-33f57bf4eaa7}";

    #[test]
    fn test_correlate_normalizes_separators_and_case() {
        let inventory = vec![record("display\\del4321\\5&1A2B3C4D&0&UID4353", "DELL U2720Q", "S1")];
        let matched = correlate(PATH_A, &inventory).unwrap();
        assert_eq!(matched.serial_number, "S1");
        assert!(correlate(PATH_B, &inventory).is_none());
    }

    #[test]
    fn test_correlate_ignores_empty_fragment() {
        let inventory = vec![record("", "Ghost", "S0")];
        assert!(correlate(PATH_A, &inventory).is_none());
    }

    #[test]
    fn test_correlate_first_match_wins_on_collision() {
        // A model-only fragment collides with every instance of that model
        let inventory = vec![
            record("DISPLAY\\DEL4321", "DELL first", "S1"),
            record("DISPLAY\\DEL4321\\5&1a2b3c4d&0&UID4353", "DELL second", "S2"),
        ];
        assert_eq!(correlate(PATH_A, &inventory).unwrap().serial_number, "S1");
    }

    #[test]
    fn test_merge_skips_detached_outputs() {
        let outputs = vec![output(1, true, Some(PATH_A)), output(2, false, None), output(3, true, Some(PATH_B))];
        let monitors = merge(&[], &outputs);
        let names: Vec<_> = monitors.iter().map(|m| m.device_name.as_str()).collect();
        assert_eq!(names, vec!["\\\\.\\DISPLAY1", "\\\\.\\DISPLAY3"]);
    }

    #[test]
    fn test_merge_copies_inventory_on_match() {
        let inventory = vec![record("DISPLAY\\DEL4321\\5&1a2b3c4d&0&UID4353", "DELL U2720Q", "S1")];
        let monitors = merge(&inventory, &[output(1, true, Some(PATH_A))]);

        assert_eq!(monitors.len(), 1);
        let monitor = &monitors[0];
        assert_eq!(monitor.friendly_name, "DELL U2720Q");
        assert_eq!(monitor.serial_number, "S1");
        assert_eq!(monitor.manufacturer, "DEL");
        assert_eq!(monitor.device_path, PATH_A);
        assert!(monitor.is_primary);
    }

    #[test]
    fn test_merge_falls_back_to_os_strings() {
        let monitors = merge(&[], &[output(2, true, Some(PATH_B)), output(3, true, None)]);

        assert_eq!(monitors[0].friendly_name, "Generic PnP Monitor");
        assert!(monitors[0].serial_number.is_empty());
        assert!(!monitors[0].is_primary);

        assert_eq!(monitors[1].friendly_name, "NVIDIA GeForce RTX 3080");
        assert!(monitors[1].device_path.is_empty());
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let source = FakeSource::new(
            vec![
                record("DISPLAY\\DEL4321\\5&1a2b3c4d&0&UID4353", "DELL U2720Q", "S1"),
                record("DISPLAY\\GSM5B7F\\5&1a2b3c4d&0&UID4354", "LG ULTRAGEAR", "S2"),
            ],
            vec![output(1, true, Some(PATH_A)), output(2, true, Some(PATH_B))],
        );
        let resolver = MonitorIdentityResolver::new(source);

        let serials = |monitors: Vec<MonitorInfo>| -> BTreeSet<String> {
            monitors.into_iter().map(|m| m.serial_number).collect()
        };
        let first = serials(resolver.resolve());
        let second = serials(resolver.resolve());

        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert!(first.contains("S1") && first.contains("S2"));
    }
}
