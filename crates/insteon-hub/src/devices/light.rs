//! Dimmers, switches, keypads and outlets.

use insteon_protocol::*;

use super::DeviceHandler;
use crate::event::DeviceEventKind;

/// Lighting control device.
#[derive(Debug, Default)]
pub struct Light;

impl Light {
    fn decode(cmd1: u8, cmd2: u8) -> Option<DeviceEventKind> {
        match cmd1 {
            CMD_LIGHT_ON => Some(DeviceEventKind::TurnOn { level: cmd2 }),
            CMD_LIGHT_ON_FAST => Some(DeviceEventKind::TurnOnFast),
            CMD_LIGHT_OFF => Some(DeviceEventKind::TurnOff),
            CMD_LIGHT_OFF_FAST => Some(DeviceEventKind::TurnOffFast),
            CMD_LIGHT_BRIGHTEN => Some(DeviceEventKind::Bright),
            CMD_LIGHT_DIM => Some(DeviceEventKind::Dim),
            CMD_START_MANUAL_CHANGE => Some(DeviceEventKind::StartManualChange { up: cmd2 == 0x01 }),
            CMD_STOP_MANUAL_CHANGE => Some(DeviceEventKind::StopManualChange),
            _ => None,
        }
    }
}

impl DeviceHandler for Light {
    fn handle_direct(&mut self, cmd1: u8, cmd2: u8) -> Option<DeviceEventKind> {
        Self::decode(cmd1, cmd2)
    }

    fn handle_all_link_broadcast(&mut self, _group: u8, cmd1: u8, cmd2: u8) -> Option<DeviceEventKind> {
        // Broadcasts leave cmd2 at zero; the responder goes to its own on-level.
        match (cmd1, cmd2) {
            (CMD_LIGHT_ON, 0x00) => Some(DeviceEventKind::TurnOn { level: LEVEL_MAX }),
            _ => Self::decode(cmd1, cmd2),
        }
    }

    fn handle_ack(&mut self, cmd1: u8, cmd2: u8) -> Option<DeviceEventKind> {
        match cmd1 {
            // The ACK to an on/off command carries the new level
            CMD_LIGHT_ON | CMD_LIGHT_ON_FAST | CMD_LIGHT_OFF | CMD_LIGHT_OFF_FAST if cmd2 > 0 => {
                Some(DeviceEventKind::TurnOn { level: cmd2 })
            }
            CMD_LIGHT_ON | CMD_LIGHT_ON_FAST | CMD_LIGHT_OFF | CMD_LIGHT_OFF_FAST => {
                Some(DeviceEventKind::TurnOff)
            }
            _ => None,
        }
    }

    fn emit_on_ack(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_on_keeps_level() {
        let mut light = Light;
        assert_eq!(
            light.handle_direct(0x11, 0x80),
            Some(DeviceEventKind::TurnOn { level: 0x80 })
        );
        assert_eq!(light.handle_direct(0x13, 0x00), Some(DeviceEventKind::TurnOff));
    }

    #[test]
    fn test_broadcast_on_is_full_level() {
        let mut light = Light;
        assert_eq!(
            light.handle_all_link_broadcast(1, 0x11, 0x00),
            Some(DeviceEventKind::TurnOn { level: 0xFF })
        );
        assert_eq!(
            light.handle_all_link_broadcast(1, 0x17, 0x00),
            Some(DeviceEventKind::StartManualChange { up: false })
        );
    }

    #[test]
    fn test_ack_reports_level() {
        let mut light = Light;
        assert!(light.emit_on_ack());
        assert_eq!(
            light.handle_ack(0x11, 0x40),
            Some(DeviceEventKind::TurnOn { level: 0x40 })
        );
        assert_eq!(light.handle_ack(0x13, 0x00), Some(DeviceEventKind::TurnOff));
        assert_eq!(light.handle_ack(0x19, 0x40), None);
    }
}
