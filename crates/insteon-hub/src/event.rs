//! Events published by the hub.

use insteon_protocol::{DeviceId, Message};
use serde::Serialize;

use crate::devices::DeviceKind;

/// Everything the hub reports to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum HubEvent {
    /// The connection is up.
    Connect,
    /// The connection ended.
    Close {
        /// It ended because of an error.
        had_error: bool,
    },
    /// A transport or I/O error.
    Error(String),
    /// About to write a command (uppercase hex).
    SendCommand {
        /// Hex of the bytes written.
        raw: String,
    },
    /// Every message parsed from the IM.
    RecvCommand(Message),
    /// A device message nobody claimed.
    Command(Message),
    /// A notification from a registered device.
    Device(DeviceEvent),
}

/// A notification decoded by a device handler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceEvent {
    /// Device that sent it.
    pub id: DeviceId,
    /// Kind the device is registered as.
    pub kind: DeviceKind,
    /// ALL-Link group, for broadcasts and cleanups.
    pub group: Option<u8>,
    /// What happened.
    pub event: DeviceEventKind,
}

/// What a device reported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceEventKind {
    /// Turned on at a level.
    TurnOn {
        /// Level 0x00..=0xFF.
        level: u8,
    },
    /// Turned on instantly.
    TurnOnFast,
    /// Turned off.
    TurnOff,
    /// Turned off instantly.
    TurnOffFast,
    /// Button held; the level is ramping.
    StartManualChange {
        /// Ramping up rather than down.
        up: bool,
    },
    /// Button released.
    StopManualChange,
    /// Motion detected.
    Motion,
    /// Motion cleared.
    Clear,
    /// Light level fell below the dusk threshold.
    Dusk,
    /// Light level rose above the dusk threshold.
    Dawn,
    /// Contact opened.
    Opened,
    /// Contact closed.
    Closed,
    /// Water detected.
    Wet,
    /// No water detected.
    Dry,
    /// Periodic liveness report.
    Heartbeat,
    /// Battery is low.
    LowBattery,
    /// Thermostat mode changed.
    ModeChange {
        /// System mode (low nibble of cmd2).
        mode: u8,
        /// Fan forced on.
        fan_on: bool,
    },
    /// Ambient temperature changed.
    TemperatureChange {
        /// Degrees in the thermostat's unit.
        degrees: f32,
    },
    /// Relative humidity changed.
    HumidityChange {
        /// Percent.
        percent: u8,
    },
    /// Cooling set point changed.
    CoolSetPointChange {
        /// Degrees.
        degrees: u8,
    },
    /// Heating set point changed.
    HeatSetPointChange {
        /// Degrees.
        degrees: u8,
    },
    /// Thermostat started or stopped calling for a stage.
    Call {
        /// Which stage.
        stage: ThermostatStage,
        /// Calling (true) or satisfied (false).
        active: bool,
    },
    /// Meter reported a change; the host should read it.
    ReportRequested,
    /// I/O module sensor input went on.
    SensorOn,
    /// I/O module sensor input went off.
    SensorOff,
    /// I/O module relay confirmed on.
    RelayOn,
    /// I/O module relay confirmed off.
    RelayOff,
    /// Dim one step.
    Dim,
    /// Brighten one step.
    Bright,
}

/// Thermostat stages reported by group broadcasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThermostatStage {
    /// Group 1.
    Cooling,
    /// Group 2.
    Heating,
    /// Group 3.
    Dehumidifying,
    /// Group 4.
    Humidifying,
}
