//! Battery powered sensors.
//!
//! These devices only talk in group broadcasts. The group tells which input
//! changed:
//!
//! | Group | Motion      | Door          | Leak      |
//! |-------|-------------|---------------|-----------|
//! | 1     | motion/clear| opened/closed | dry       |
//! | 2     | dusk/dawn   |               | wet       |
//! | 3     | low battery | low battery   |           |
//! | 4     | heartbeat   | heartbeat     | heartbeat |

use insteon_protocol::{CMD_LIGHT_OFF, CMD_LIGHT_ON};

use super::{on_off, DeviceHandler};
use crate::event::DeviceEventKind;

const GROUP_PRIMARY: u8 = 1;
const GROUP_SECONDARY: u8 = 2;
const GROUP_LOW_BATTERY: u8 = 3;
const GROUP_HEARTBEAT: u8 = 4;

fn heartbeat(cmd1: u8) -> Option<DeviceEventKind> {
    matches!(cmd1, CMD_LIGHT_ON | CMD_LIGHT_OFF).then_some(DeviceEventKind::Heartbeat)
}

/// Motion sensor.
#[derive(Debug, Default)]
pub struct MotionSensor;

impl DeviceHandler for MotionSensor {
    fn handle_direct(&mut self, _cmd1: u8, _cmd2: u8) -> Option<DeviceEventKind> {
        None
    }

    fn handle_all_link_broadcast(&mut self, group: u8, cmd1: u8, _cmd2: u8) -> Option<DeviceEventKind> {
        match group {
            GROUP_PRIMARY => on_off(cmd1, DeviceEventKind::Motion, DeviceEventKind::Clear),
            GROUP_SECONDARY => on_off(cmd1, DeviceEventKind::Dusk, DeviceEventKind::Dawn),
            GROUP_LOW_BATTERY => (cmd1 == CMD_LIGHT_ON).then_some(DeviceEventKind::LowBattery),
            GROUP_HEARTBEAT => heartbeat(cmd1),
            _ => None,
        }
    }
}

/// Open/close sensor.
#[derive(Debug, Default)]
pub struct DoorSensor;

impl DeviceHandler for DoorSensor {
    fn handle_direct(&mut self, _cmd1: u8, _cmd2: u8) -> Option<DeviceEventKind> {
        None
    }

    fn handle_all_link_broadcast(&mut self, group: u8, cmd1: u8, _cmd2: u8) -> Option<DeviceEventKind> {
        match group {
            GROUP_PRIMARY => on_off(cmd1, DeviceEventKind::Opened, DeviceEventKind::Closed),
            GROUP_LOW_BATTERY => (cmd1 == CMD_LIGHT_ON).then_some(DeviceEventKind::LowBattery),
            GROUP_HEARTBEAT => heartbeat(cmd1),
            _ => None,
        }
    }
}

/// Leak sensor.
#[derive(Debug, Default)]
pub struct LeakSensor;

impl DeviceHandler for LeakSensor {
    fn handle_direct(&mut self, _cmd1: u8, _cmd2: u8) -> Option<DeviceEventKind> {
        None
    }

    fn handle_all_link_broadcast(&mut self, group: u8, cmd1: u8, _cmd2: u8) -> Option<DeviceEventKind> {
        match (group, cmd1) {
            (GROUP_PRIMARY, CMD_LIGHT_ON) => Some(DeviceEventKind::Dry),
            (GROUP_SECONDARY, CMD_LIGHT_ON) => Some(DeviceEventKind::Wet),
            (GROUP_HEARTBEAT, _) => heartbeat(cmd1),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motion_groups() {
        let mut sensor = MotionSensor;
        assert_eq!(sensor.handle_all_link_broadcast(1, 0x11, 0), Some(DeviceEventKind::Motion));
        assert_eq!(sensor.handle_all_link_broadcast(1, 0x13, 0), Some(DeviceEventKind::Clear));
        assert_eq!(sensor.handle_all_link_broadcast(2, 0x11, 0), Some(DeviceEventKind::Dusk));
        assert_eq!(sensor.handle_all_link_broadcast(2, 0x13, 0), Some(DeviceEventKind::Dawn));
        assert_eq!(sensor.handle_all_link_broadcast(3, 0x11, 0), Some(DeviceEventKind::LowBattery));
        assert_eq!(sensor.handle_all_link_broadcast(4, 0x13, 0), Some(DeviceEventKind::Heartbeat));
        assert_eq!(sensor.handle_all_link_broadcast(5, 0x11, 0), None);
    }

    #[test]
    fn test_door_groups() {
        let mut sensor = DoorSensor;
        assert_eq!(sensor.handle_all_link_broadcast(1, 0x11, 0), Some(DeviceEventKind::Opened));
        assert_eq!(sensor.handle_all_link_broadcast(1, 0x13, 0), Some(DeviceEventKind::Closed));
        assert_eq!(sensor.handle_all_link_broadcast(2, 0x11, 0), None);
    }

    #[test]
    fn test_leak_groups() {
        let mut sensor = LeakSensor;
        assert_eq!(sensor.handle_all_link_broadcast(1, 0x11, 0), Some(DeviceEventKind::Dry));
        assert_eq!(sensor.handle_all_link_broadcast(2, 0x11, 0), Some(DeviceEventKind::Wet));
        assert_eq!(sensor.handle_all_link_broadcast(4, 0x11, 0), Some(DeviceEventKind::Heartbeat));
        assert_eq!(sensor.handle_all_link_broadcast(1, 0x13, 0), None);
    }
}
