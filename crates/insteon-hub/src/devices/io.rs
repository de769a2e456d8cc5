//! I/O modules, plain and in garage door mode.

use insteon_protocol::{CMD_IO_OUTPUT_OFF, CMD_IO_OUTPUT_ON, CMD_LIGHT_OFF, CMD_LIGHT_ON};

use super::{on_off, DeviceHandler};
use crate::event::DeviceEventKind;

fn relay_ack(cmd1: u8) -> Option<DeviceEventKind> {
    match cmd1 {
        CMD_IO_OUTPUT_ON | CMD_LIGHT_ON => Some(DeviceEventKind::RelayOn),
        CMD_IO_OUTPUT_OFF | CMD_LIGHT_OFF => Some(DeviceEventKind::RelayOff),
        _ => None,
    }
}

/// I/O module: one sensor input, one relay.
#[derive(Debug, Default)]
pub struct IoModule;

impl DeviceHandler for IoModule {
    fn handle_direct(&mut self, cmd1: u8, _cmd2: u8) -> Option<DeviceEventKind> {
        on_off(cmd1, DeviceEventKind::SensorOn, DeviceEventKind::SensorOff)
    }

    fn handle_all_link_broadcast(&mut self, _group: u8, cmd1: u8, _cmd2: u8) -> Option<DeviceEventKind> {
        on_off(cmd1, DeviceEventKind::SensorOn, DeviceEventKind::SensorOff)
    }

    fn handle_ack(&mut self, cmd1: u8, _cmd2: u8) -> Option<DeviceEventKind> {
        relay_ack(cmd1)
    }

    fn emit_on_ack(&self) -> bool {
        true
    }
}

/// I/O module wired to a garage door. The sensor is on while the door is
/// closed.
#[derive(Debug, Default)]
pub struct GarageDoor;

impl DeviceHandler for GarageDoor {
    fn handle_direct(&mut self, cmd1: u8, _cmd2: u8) -> Option<DeviceEventKind> {
        on_off(cmd1, DeviceEventKind::Closed, DeviceEventKind::Opened)
    }

    fn handle_all_link_broadcast(&mut self, _group: u8, cmd1: u8, _cmd2: u8) -> Option<DeviceEventKind> {
        on_off(cmd1, DeviceEventKind::Closed, DeviceEventKind::Opened)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_sensor_and_relay() {
        let mut io = IoModule;
        assert_eq!(io.handle_all_link_broadcast(1, 0x11, 0), Some(DeviceEventKind::SensorOn));
        assert_eq!(io.handle_direct(0x13, 0), Some(DeviceEventKind::SensorOff));
        assert_eq!(io.handle_ack(0x45, 0), Some(DeviceEventKind::RelayOn));
        assert_eq!(io.handle_ack(0x46, 0), Some(DeviceEventKind::RelayOff));
    }

    #[test]
    fn test_garage_sensor_is_inverted() {
        let mut garage = GarageDoor;
        assert!(!garage.emit_on_ack());
        assert_eq!(garage.handle_all_link_broadcast(1, 0x11, 0), Some(DeviceEventKind::Closed));
        assert_eq!(garage.handle_all_link_broadcast(1, 0x13, 0), Some(DeviceEventKind::Opened));
    }
}
