//! X10 units reached through the IM.
//!
//! X10 traffic arrives as pairs of `0252` messages: an address (house and
//! unit code) followed by a function (house and function code). The router
//! remembers the address and delivers the function to the device registered
//! under [`x10_device_id`].

use insteon_protocol::{DeviceId, X10_ALL_LIGHTS_ON, X10_ALL_UNITS_OFF, X10_BRIGHT, X10_DIM, X10_OFF, X10_ON};

use super::DeviceHandler;
use crate::event::DeviceEventKind;

/// Registry id for an X10 unit. `house` and `unit` are the raw 4-bit codes.
pub fn x10_device_id(house: u8, unit: u8) -> DeviceId {
    DeviceId([0x00, house & 0x0F, unit & 0x0F])
}

/// X10 unit. `handle_direct` receives the function code as cmd1.
#[derive(Debug, Default)]
pub struct X10Unit;

impl DeviceHandler for X10Unit {
    fn handle_direct(&mut self, cmd1: u8, _cmd2: u8) -> Option<DeviceEventKind> {
        match cmd1 {
            X10_ON | X10_ALL_LIGHTS_ON => Some(DeviceEventKind::TurnOn { level: u8::MAX }),
            X10_OFF | X10_ALL_UNITS_OFF => Some(DeviceEventKind::TurnOff),
            X10_DIM => Some(DeviceEventKind::Dim),
            X10_BRIGHT => Some(DeviceEventKind::Bright),
            _ => None,
        }
    }

    fn handle_all_link_broadcast(&mut self, _group: u8, _cmd1: u8, _cmd2: u8) -> Option<DeviceEventKind> {
        None
    }
}
