//! Device capability implementations.
//!
//! Each device category decodes the commands it sends into
//! [`DeviceEventKind`]s. The router decides which capability method to call;
//! a handler only has to know what its device means by a command.

mod io;
mod light;
mod meter;
mod sensors;
mod thermostat;
mod x10;

use std::time::{Duration, Instant};

use insteon_protocol::DeviceId;
use serde::{Deserialize, Serialize};

use crate::event::DeviceEventKind;

pub use io::{GarageDoor, IoModule};
pub use light::Light;
pub use meter::Meter;
pub use sensors::{DoorSensor, LeakSensor, MotionSensor};
pub use thermostat::Thermostat;
pub use x10::{x10_device_id, X10Unit};

/// Capability interface every device category implements.
pub trait DeviceHandler: Send {
    /// A direct command the device sent to the IM.
    fn handle_direct(&mut self, cmd1: u8, cmd2: u8) -> Option<DeviceEventKind>;

    /// An ALL-Link broadcast or cleanup from the device.
    fn handle_all_link_broadcast(&mut self, group: u8, cmd1: u8, cmd2: u8)
        -> Option<DeviceEventKind>;

    /// A direct ACK from the device.
    fn handle_ack(&mut self, _cmd1: u8, _cmd2: u8) -> Option<DeviceEventKind> {
        None
    }

    /// Whether ACKs from this device carry state worth reporting.
    fn emit_on_ack(&self) -> bool {
        false
    }
}

/// Device categories with a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    /// Dimmer, switch, keypad or outlet.
    Light,
    /// Thermostat.
    Thermostat,
    /// Motion sensor.
    Motion,
    /// Open/close sensor.
    Door,
    /// Leak sensor.
    Leak,
    /// Energy meter.
    Meter,
    /// I/O module.
    Io,
    /// I/O module in garage door mode.
    Garage,
    /// X10 unit reached through the IM.
    X10,
}

impl DeviceKind {
    /// A fresh handler for this kind.
    pub fn create_handler(self) -> Box<dyn DeviceHandler> {
        match self {
            DeviceKind::Light => Box::new(Light),
            DeviceKind::Thermostat => Box::new(Thermostat),
            DeviceKind::Motion => Box::new(MotionSensor),
            DeviceKind::Door => Box::new(DoorSensor),
            DeviceKind::Leak => Box::new(LeakSensor),
            DeviceKind::Meter => Box::new(Meter),
            DeviceKind::Io => Box::new(IoModule),
            DeviceKind::Garage => Box::new(GarageDoor),
            DeviceKind::X10 => Box::new(X10Unit),
        }
    }
}

/// Key of the last delivered event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastCommand {
    /// Command 1.
    pub cmd1: u8,
    /// Command 2 for direct commands, group for broadcasts.
    pub cmd2_or_group: u8,
    /// When it was last seen.
    pub at: Instant,
}

/// A registered device: its handler plus the dedup cache.
pub struct Device {
    id: DeviceId,
    kind: DeviceKind,
    handler: Box<dyn DeviceHandler>,
    last_cmd: Option<LastCommand>,
}

impl Device {
    /// Create a device of the given kind.
    pub fn new(id: DeviceId, kind: DeviceKind) -> Self {
        Device {
            id,
            kind,
            handler: kind.create_handler(),
            last_cmd: None,
        }
    }

    /// Device address.
    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// Registered kind.
    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    /// The capability implementation.
    pub fn handler(&mut self) -> &mut dyn DeviceHandler {
        self.handler.as_mut()
    }

    /// The last delivered event.
    pub fn last_cmd(&self) -> Option<&LastCommand> {
        self.last_cmd.as_ref()
    }

    /// Record an event and report whether it repeats the previous one
    /// within `window`.
    ///
    /// A repeat refreshes the timestamp, so a burst of repeats is
    /// suppressed until it goes quiet for a full window.
    pub fn is_duplicate(&mut self, cmd1: u8, cmd2_or_group: u8, now: Instant, window: Duration) -> bool {
        let duplicate = match &self.last_cmd {
            Some(last) => {
                last.cmd1 == cmd1
                    && last.cmd2_or_group == cmd2_or_group
                    && now.saturating_duration_since(last.at) < window
            }
            None => false,
        };
        self.last_cmd = Some(LastCommand {
            cmd1,
            cmd2_or_group,
            at: now,
        });
        duplicate
    }
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("last_cmd", &self.last_cmd)
            .finish()
    }
}

/// On/off pair shared by most battery sensors.
fn on_off(cmd1: u8, on: DeviceEventKind, off: DeviceEventKind) -> Option<DeviceEventKind> {
    match cmd1 {
        insteon_protocol::CMD_LIGHT_ON => Some(on),
        insteon_protocol::CMD_LIGHT_OFF => Some(off),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(5000);

    fn device() -> Device {
        Device::new("1A2B3C".parse().unwrap(), DeviceKind::Light)
    }

    #[test]
    fn test_first_event_is_not_duplicate() {
        let mut dev = device();
        assert!(!dev.is_duplicate(0x11, 1, Instant::now(), WINDOW));
    }

    #[test]
    fn test_duplicate_window_slides() {
        let mut dev = device();
        let t0 = Instant::now();
        assert!(!dev.is_duplicate(0x11, 1, t0, WINDOW));
        assert!(dev.is_duplicate(0x11, 1, t0 + Duration::from_millis(3000), WINDOW));
        // Still within 5s of the refreshed timestamp.
        assert!(dev.is_duplicate(0x11, 1, t0 + Duration::from_millis(7000), WINDOW));
        assert!(!dev.is_duplicate(0x11, 1, t0 + Duration::from_millis(12_500), WINDOW));
    }

    #[test]
    fn test_different_event_is_not_duplicate() {
        let mut dev = device();
        let t0 = Instant::now();
        assert!(!dev.is_duplicate(0x11, 1, t0, WINDOW));
        assert!(!dev.is_duplicate(0x13, 1, t0, WINDOW));
        assert!(!dev.is_duplicate(0x13, 2, t0, WINDOW));
    }

    #[test]
    fn test_every_kind_has_a_handler() {
        let kinds = [
            DeviceKind::Light,
            DeviceKind::Thermostat,
            DeviceKind::Motion,
            DeviceKind::Door,
            DeviceKind::Leak,
            DeviceKind::Meter,
            DeviceKind::Io,
            DeviceKind::Garage,
            DeviceKind::X10,
        ];
        for kind in kinds {
            let mut dev = Device::new(DeviceId::default(), kind);
            assert_eq!(dev.kind(), kind);
            // Unknown commands are never decoded.
            assert_eq!(dev.handler().handle_direct(0xEE, 0xEE), None);
        }
    }

    #[test]
    fn test_kind_from_yaml() {
        let kind: DeviceKind = serde_yaml::from_str("garage").unwrap();
        assert_eq!(kind, DeviceKind::Garage);
    }
}
