//! Protocol constants
//!
//! These constants define the message type codes, control bytes, flag masks
//! and command numbers used by the Insteon PLM/Hub serial protocol.

// ============================================================================
// Control Bytes
// ============================================================================

/// Start-of-message byte that precedes every IM message.
pub const START_OF_MESSAGE: u8 = 0x02;
/// Positive acknowledgement appended to IM echoes.
pub const ACK: u8 = 0x06;
/// Negative acknowledgement (IM busy or command not accepted).
pub const NAK: u8 = 0x15;

/// `START_OF_MESSAGE` as it appears in the hex buffer.
pub const START_OF_MESSAGE_HEX: &str = "02";
/// `NAK` as it appears in the hex buffer.
pub const NAK_HEX: &str = "15";

// ============================================================================
// Message Type Codes (IM → host)
// ============================================================================

/// Standard message received.
pub const MSG_STANDARD_RECEIVED: u8 = 0x50;
/// Extended message received.
pub const MSG_EXTENDED_RECEIVED: u8 = 0x51;
/// X10 message received.
pub const MSG_X10_RECEIVED: u8 = 0x52;
/// ALL-Linking completed.
pub const MSG_ALL_LINK_COMPLETE: u8 = 0x53;
/// ALL-Link cleanup failure report.
pub const MSG_CLEANUP_FAILURE: u8 = 0x56;
/// ALL-Link record response.
pub const MSG_ALL_LINK_RECORD: u8 = 0x57;
/// ALL-Link cleanup status report.
pub const MSG_CLEANUP_STATUS: u8 = 0x58;

// ============================================================================
// Message Type Codes (host → IM, echoed back with ACK/NAK)
// ============================================================================

/// Get IM info.
pub const MSG_GET_IM_INFO: u8 = 0x60;
/// Send ALL-Link command.
pub const MSG_SEND_ALL_LINK: u8 = 0x61;
/// Send standard or extended message.
pub const MSG_SEND_DIRECT: u8 = 0x62;
/// Send X10.
pub const MSG_SEND_X10: u8 = 0x63;
/// Start ALL-Linking.
pub const MSG_START_LINKING: u8 = 0x64;
/// Cancel ALL-Linking.
pub const MSG_CANCEL_LINKING: u8 = 0x65;
/// Get first ALL-Link record.
pub const MSG_GET_FIRST_LINK: u8 = 0x69;
/// Get next ALL-Link record.
pub const MSG_GET_NEXT_LINK: u8 = 0x6A;
/// Manage ALL-Link record.
pub const MSG_MANAGE_LINK_RECORD: u8 = 0x6F;

// ============================================================================
// Message Lengths (hex characters, including the leading 02)
// ============================================================================

/// Length of a standard received message.
pub const LEN_STANDARD_RECEIVED: usize = 22;
/// Length of an extended received message.
pub const LEN_EXTENDED_RECEIVED: usize = 50;
/// Length of an X10 received message.
pub const LEN_X10_RECEIVED: usize = 8;
/// Length of an ALL-Linking completed message.
pub const LEN_ALL_LINK_COMPLETE: usize = 20;
/// Length of an ALL-Link cleanup failure report.
pub const LEN_CLEANUP_FAILURE: usize = 14;
/// Length of an ALL-Link record response.
pub const LEN_ALL_LINK_RECORD: usize = 20;
/// Length of an ALL-Link cleanup status report.
pub const LEN_CLEANUP_STATUS: usize = 6;
/// Length of a get IM info echo.
pub const LEN_GET_IM_INFO: usize = 18;
/// Length of a send ALL-Link command echo.
pub const LEN_SEND_ALL_LINK: usize = 12;
/// Minimum characters needed before a direct echo can be sized.
pub const LEN_SEND_DIRECT_MIN: usize = 12;
/// Length of a standard direct echo.
pub const LEN_SEND_DIRECT_STANDARD: usize = 18;
/// Length of an extended direct echo.
pub const LEN_SEND_DIRECT_EXTENDED: usize = 46;
/// Offset (hex characters) of the flags byte inside a direct echo.
pub const SEND_DIRECT_FLAGS_OFFSET: usize = 10;
/// Length of an X10 echo.
pub const LEN_SEND_X10: usize = 10;
/// Length of a start linking echo.
pub const LEN_START_LINKING: usize = 10;
/// Length of a cancel linking echo.
pub const LEN_CANCEL_LINKING: usize = 6;
/// Length of a get first/next link record echo.
pub const LEN_GET_LINK: usize = 6;
/// Length of a manage link record echo.
pub const LEN_MANAGE_LINK_RECORD: usize = 24;

/// Characters skipped when the type code at the buffer head is unknown.
pub const UNKNOWN_TYPE_SKIP: usize = 4;

// ============================================================================
// Message Flags
// ============================================================================

/// Extended message bit of the flags byte.
pub const FLAG_EXTENDED: u8 = 0x10;
/// Flags for an outgoing standard direct message (max hops 3, hops left 3).
pub const FLAGS_STANDARD_DIRECT: u8 = 0x0F;
/// Flags for an outgoing extended direct message.
pub const FLAGS_EXTENDED_DIRECT: u8 = 0x1F;

/// Number of user data bytes carried by an extended message.
pub const USER_DATA_LEN: usize = 14;

// ============================================================================
// Link Record Flags
// ============================================================================

/// Record is in use.
pub const LINK_FLAG_IN_USE: u8 = 0x80;
/// Record describes a controller link.
pub const LINK_FLAG_CONTROLLER: u8 = 0x40;
/// Record has been used before.
pub const LINK_FLAG_USED_BEFORE: u8 = 0x02;

// ============================================================================
// Linking Codes
// ============================================================================

/// IM is the responder.
pub const LINK_CODE_RESPONDER: u8 = 0x00;
/// IM is the controller.
pub const LINK_CODE_CONTROLLER: u8 = 0x01;
/// Either side may be the controller.
pub const LINK_CODE_EITHER: u8 = 0x03;
/// The link was deleted.
pub const LINK_CODE_DELETED: u8 = 0xFF;

// ============================================================================
// Manage Link Record Control Codes
// ============================================================================

/// Find the first record matching group and id.
pub const MANAGE_FIND_FIRST: u8 = 0x00;
/// Find the next matching record.
pub const MANAGE_FIND_NEXT: u8 = 0x01;
/// Modify a matching record or add it.
pub const MANAGE_MODIFY_OR_ADD: u8 = 0x20;
/// Add a controller record.
pub const MANAGE_ADD_CONTROLLER: u8 = 0x40;
/// Add a responder record.
pub const MANAGE_ADD_RESPONDER: u8 = 0x41;
/// Delete a matching record.
pub const MANAGE_DELETE: u8 = 0x80;

// ============================================================================
// Standard Command Numbers (cmd1)
// ============================================================================

/// ALL-Link cleanup success report (I2CS broadcast).
pub const CMD_CLEANUP_SUCCESS: u8 = 0x06;
/// Product data request.
pub const CMD_PRODUCT_DATA_REQUEST: u8 = 0x03;
/// Enter linking mode.
pub const CMD_ENTER_LINKING: u8 = 0x09;
/// Enter unlinking mode.
pub const CMD_ENTER_UNLINKING: u8 = 0x0A;
/// Get Insteon engine version.
pub const CMD_ENGINE_VERSION: u8 = 0x0D;
/// Ping.
pub const CMD_PING: u8 = 0x0F;
/// ID request.
pub const CMD_ID_REQUEST: u8 = 0x10;
/// Light on.
pub const CMD_LIGHT_ON: u8 = 0x11;
/// Light on fast.
pub const CMD_LIGHT_ON_FAST: u8 = 0x12;
/// Light off.
pub const CMD_LIGHT_OFF: u8 = 0x13;
/// Light off fast.
pub const CMD_LIGHT_OFF_FAST: u8 = 0x14;
/// Brighten one step.
pub const CMD_LIGHT_BRIGHTEN: u8 = 0x15;
/// Dim one step.
pub const CMD_LIGHT_DIM: u8 = 0x16;
/// Start manual change.
pub const CMD_START_MANUAL_CHANGE: u8 = 0x17;
/// Stop manual change.
pub const CMD_STOP_MANUAL_CHANGE: u8 = 0x18;
/// Status request.
pub const CMD_STATUS_REQUEST: u8 = 0x19;
/// Get operating flags.
pub const CMD_GET_OPERATING_FLAGS: u8 = 0x1F;
/// Set operating flags.
pub const CMD_SET_OPERATING_FLAGS: u8 = 0x20;
/// Extended get/set.
pub const CMD_EXTENDED_GET_SET: u8 = 0x2E;
/// Read/write ALL-Link database.
pub const CMD_READ_WRITE_ALDB: u8 = 0x2F;
/// Thermostat temperature change notification (cmd2 = degrees x 2).
pub const CMD_THERMOSTAT_TEMP_CHANGE: u8 = 0x6E;
/// Thermostat humidity change notification.
pub const CMD_THERMOSTAT_HUMIDITY_CHANGE: u8 = 0x6F;
/// Thermostat mode/fan change notification.
pub const CMD_THERMOSTAT_MODE_CHANGE: u8 = 0x70;
/// Thermostat cool set point change notification.
pub const CMD_THERMOSTAT_COOL_SET_POINT: u8 = 0x71;
/// Thermostat heat set point change notification.
pub const CMD_THERMOSTAT_HEAT_SET_POINT: u8 = 0x72;
/// Meter reset.
pub const CMD_METER_RESET: u8 = 0x80;
/// Meter status request.
pub const CMD_METER_STATUS: u8 = 0x82;
/// I/O module output on.
pub const CMD_IO_OUTPUT_ON: u8 = 0x45;
/// I/O module output off.
pub const CMD_IO_OUTPUT_OFF: u8 = 0x46;

// ============================================================================
// X10
// ============================================================================

/// X10 flag: the raw byte carries house code and unit code.
pub const X10_FLAG_UNIT: u8 = 0x00;
/// X10 flag: the raw byte carries house code and function code.
pub const X10_FLAG_COMMAND: u8 = 0x80;
/// X10 function: all units off.
pub const X10_ALL_UNITS_OFF: u8 = 0x00;
/// X10 function: all lights on.
pub const X10_ALL_LIGHTS_ON: u8 = 0x01;
/// X10 function: on.
pub const X10_ON: u8 = 0x02;
/// X10 function: off.
pub const X10_OFF: u8 = 0x03;
/// X10 function: dim.
pub const X10_DIM: u8 = 0x04;
/// X10 function: bright.
pub const X10_BRIGHT: u8 = 0x05;

/// Full brightness level.
pub const LEVEL_MAX: u8 = 0xFF;

// ============================================================================
// Device Categories
// ============================================================================

/// Device category names, indexed by category number.
pub const DEVICE_CATEGORIES: [&str; 23] = [
    "Generalized Controllers",
    "Dimmable Lighting Control",
    "Switched Lighting Control",
    "Network Bridges",
    "Irrigation Control",
    "Climate Control",
    "Pool and Spa Control",
    "Sensors and Actuators",
    "Home Entertainment",
    "Energy Management",
    "Built-In Appliance Control",
    "Plumbing",
    "Communication",
    "Computer Control",
    "Window Coverings",
    "Access Control",
    "Security, Health, Safety",
    "Surveillance",
    "Automotive",
    "Pet Care",
    "Toys",
    "Timekeeping",
    "Holiday",
];

/// Default TCP port of an Insteon Hub.
pub const DEFAULT_HUB_PORT: u16 = 9761;
