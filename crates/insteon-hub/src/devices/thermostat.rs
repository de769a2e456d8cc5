//! Thermostats.
//!
//! Status changes arrive as direct messages to the IM; stage calls arrive as
//! group broadcasts on groups 1 to 4.

use insteon_protocol::*;

use super::DeviceHandler;
use crate::event::{DeviceEventKind, ThermostatStage};

/// Thermostat.
#[derive(Debug, Default)]
pub struct Thermostat;

impl DeviceHandler for Thermostat {
    fn handle_direct(&mut self, cmd1: u8, cmd2: u8) -> Option<DeviceEventKind> {
        match cmd1 {
            CMD_THERMOSTAT_TEMP_CHANGE => Some(DeviceEventKind::TemperatureChange {
                degrees: f32::from(cmd2) / 2.0,
            }),
            CMD_THERMOSTAT_HUMIDITY_CHANGE => Some(DeviceEventKind::HumidityChange { percent: cmd2 }),
            CMD_THERMOSTAT_MODE_CHANGE => Some(DeviceEventKind::ModeChange {
                mode: cmd2 & 0x0F,
                fan_on: cmd2 & 0xF0 != 0,
            }),
            CMD_THERMOSTAT_COOL_SET_POINT => Some(DeviceEventKind::CoolSetPointChange { degrees: cmd2 }),
            CMD_THERMOSTAT_HEAT_SET_POINT => Some(DeviceEventKind::HeatSetPointChange { degrees: cmd2 }),
            _ => None,
        }
    }

    fn handle_all_link_broadcast(&mut self, group: u8, cmd1: u8, _cmd2: u8) -> Option<DeviceEventKind> {
        let stage = match group {
            1 => ThermostatStage::Cooling,
            2 => ThermostatStage::Heating,
            3 => ThermostatStage::Dehumidifying,
            4 => ThermostatStage::Humidifying,
            _ => return None,
        };
        let active = match cmd1 {
            CMD_LIGHT_ON => true,
            CMD_LIGHT_OFF => false,
            _ => return None,
        };
        Some(DeviceEventKind::Call { stage, active })
    }
}
