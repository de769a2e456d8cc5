//! Registry of known devices.

use std::collections::HashMap;

use insteon_protocol::{DeviceId, ProtocolResult};

use crate::devices::{Device, DeviceKind};

/// Devices by address. Entries live as long as the connection.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: HashMap<DeviceId, Device>,
}

impl DeviceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The device at `id`, created as `kind` if absent or registered as
    /// another kind.
    pub fn get_or_create(&mut self, id: DeviceId, kind: DeviceKind) -> &mut Device {
        let device = self
            .devices
            .entry(id)
            .or_insert_with(|| Device::new(id, kind));
        if device.kind() != kind {
            *device = Device::new(id, kind);
        }
        device
    }

    /// Like [`get_or_create`](Self::get_or_create) with the id given as hex.
    pub fn get_or_create_hex(&mut self, id: &str, kind: DeviceKind) -> ProtocolResult<&mut Device> {
        let id: DeviceId = id.parse()?;
        Ok(self.get_or_create(id, kind))
    }

    /// The device at `id`, if registered.
    pub fn get(&self, id: &DeviceId) -> Option<&Device> {
        self.devices.get(id)
    }

    /// Mutable access to the device at `id`.
    pub fn get_mut(&mut self, id: &DeviceId) -> Option<&mut Device> {
        self.devices.get_mut(id)
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: &DeviceId) -> bool {
        self.devices.contains_key(id)
    }

    /// Number of registered devices.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Whether no devices are registered.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// All registered devices.
    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    #[test]
    fn test_get_or_create_reuses_entry() {
        let mut registry = DeviceRegistry::new();
        let id: DeviceId = "1A2B3C".parse().unwrap();
        let now = Instant::now();
        registry
            .get_or_create(id, DeviceKind::Light)
            .is_duplicate(0x11, 1, now, Duration::from_secs(5));

        let device = registry.get_or_create(id, DeviceKind::Light);
        assert!(device.last_cmd().is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_or_create_replaces_other_kind() {
        let mut registry = DeviceRegistry::new();
        let id: DeviceId = "1A2B3C".parse().unwrap();
        registry
            .get_or_create(id, DeviceKind::Light)
            .is_duplicate(0x11, 1, Instant::now(), Duration::from_secs(5));

        let device = registry.get_or_create(id, DeviceKind::Motion);
        assert_eq!(device.kind(), DeviceKind::Motion);
        assert!(device.last_cmd().is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_hex_ids_are_case_insensitive() {
        let mut registry = DeviceRegistry::new();
        registry.get_or_create_hex("aabbcc", DeviceKind::Door).unwrap();
        assert!(registry.contains(&"AABBCC".parse().unwrap()));
        assert!(registry.get_or_create_hex("xyz", DeviceKind::Door).is_err());
    }
}
