//! Locally attached devices.
//!
//! Devices are keyed by id but addressed by capability: a command names a
//! [`DeviceType`] and every device whose descriptor matches receives it.
//! Registry order is stable (sorted by id) so dispatch order is deterministic.

use std::{collections::BTreeMap, fmt, str::FromStr};

pub use definer_proto::DeviceType;
use serde::{Deserialize, Serialize};

use crate::error::HandleError;

/// Transport a device is reached over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stack {
    /// TCP over the local wireless network
    Wifi,
}

impl FromStr for Stack {
    type Err = HandleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wifi" => Ok(Self::Wifi),
            other => Err(HandleError::UnsupportedStack { stack: other.to_string() }),
        }
    }
}

impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wifi => f.write_str("wifi"),
        }
    }
}

/// An IoT device reachable from this hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Unique id
    pub id: String,
    /// Firmware version
    #[serde(default)]
    pub version: String,
    /// Manufacturer name
    #[serde(default)]
    pub manufacturer: String,
    /// Transport kind, e.g. `wifi`
    pub stack: String,
    /// Network address
    pub address: String,
    /// Network port
    pub port: u16,
    /// Capability descriptor
    #[serde(rename = "type")]
    pub kind: DeviceType,
}

impl Device {
    /// Parsed transport kind.
    pub fn stack(&self) -> Result<Stack, HandleError> {
        self.stack.parse()
    }

    /// `address:port` for dialing.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// Whether this device answers to `target`.
    ///
    /// Cores must be equal; an empty target modifier matches any modifier.
    pub fn answers_to(&self, target: &DeviceType) -> bool {
        self.kind.core == target.core
            && (target.modifier.is_empty() || self.kind.modifier == target.modifier)
    }
}

/// Devices attached to this hub.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    devices: BTreeMap<String, Device>,
}

impl DeviceRegistry {
    /// Registry holding `devices`; later duplicates of an id win.
    pub fn from_devices(devices: impl IntoIterator<Item = Device>) -> Self {
        Self { devices: devices.into_iter().map(|d| (d.id.clone(), d)).collect() }
    }

    /// Register a device, returning the one it replaced.
    pub fn insert(&mut self, device: Device) -> Option<Device> {
        self.devices.insert(device.id.clone(), device)
    }

    /// Remove a device. Removing an unknown id is a no-op.
    pub fn remove(&mut self, id: &str) -> Option<Device> {
        self.devices.remove(id)
    }

    /// Look up a device by id.
    pub fn lookup(&self, id: &str) -> Option<&Device> {
        self.devices.get(id)
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.devices.contains_key(id)
    }

    /// Every device answering to `target`, in id order.
    pub fn matching(&self, target: &DeviceType) -> Vec<Device> {
        self.devices.values().filter(|d| d.answers_to(target)).cloned().collect()
    }

    /// Number of devices.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Owned copy of every device, in id order.
    pub fn to_vec(&self) -> Vec<Device> {
        self.devices.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(id: &str, core: &str, modifier: &str) -> Device {
        Device {
            id: id.into(),
            version: "1.0".into(),
            manufacturer: "acme".into(),
            stack: "wifi".into(),
            address: "127.0.0.1".into(),
            port: 9000,
            kind: DeviceType::new(core, modifier),
        }
    }

    fn registry() -> DeviceRegistry {
        DeviceRegistry::from_devices([
            device("lamp-1", "light", "ceiling"),
            device("lamp-2", "light", "desk"),
            device("lamp-3", "light", ""),
            device("fan-1", "fan", "ceiling"),
        ])
    }

    fn ids(devices: &[Device]) -> Vec<&str> {
        devices.iter().map(|d| d.id.as_str()).collect()
    }

    #[test]
    fn empty_modifier_matches_every_modifier() {
        let found = registry().matching(&DeviceType::any("light"));
        assert_eq!(ids(&found), ["lamp-1", "lamp-2", "lamp-3"]);
    }

    #[test]
    fn modifier_must_match_exactly() {
        let found = registry().matching(&DeviceType::new("light", "ceiling"));
        assert_eq!(ids(&found), ["lamp-1"]);
    }

    #[test]
    fn unknown_core_matches_nothing() {
        assert!(registry().matching(&DeviceType::any("lock")).is_empty());
    }

    #[test]
    fn remove_absent_device_is_noop() {
        let mut devices = registry();
        assert!(devices.remove("dev-42").is_none());
        assert_eq!(devices.len(), 4);

        assert!(devices.remove("fan-1").is_some());
        assert!(devices.lookup("fan-1").is_none());
    }

    #[test]
    fn stack_parsing() {
        let mut lamp = device("lamp-1", "light", "");
        assert_eq!(lamp.stack().unwrap(), Stack::Wifi);

        lamp.stack = "zigbee".into();
        assert!(matches!(lamp.stack(), Err(HandleError::UnsupportedStack { stack }) if stack == "zigbee"));
    }

    #[test]
    fn endpoint_joins_address_and_port() {
        assert_eq!(device("lamp-1", "light", "").endpoint(), "127.0.0.1:9000");
    }
}
