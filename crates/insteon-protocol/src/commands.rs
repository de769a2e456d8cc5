//! Commands that can be sent to the IM.

use crate::checksum::{checksum, crc16};
use crate::constants::*;
use crate::error::{ProtocolError, ProtocolResult};
use crate::types::*;

/// Trailer appended to extended user data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Integrity {
    /// D14 holds the additive checksum.
    Checksum,
    /// D13..D14 hold the CRC-16 (I2CS devices such as thermostats).
    Crc,
}

/// Commands that can be sent to the IM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Read the IM's own address and firmware.
    GetImInfo,

    /// Standard direct message to a device.
    Direct {
        /// Target device.
        to: DeviceId,
        /// Command 1.
        cmd1: u8,
        /// Command 2.
        cmd2: u8,
    },

    /// Extended direct message to a device. `data` already carries its trailer.
    Extended {
        /// Target device.
        to: DeviceId,
        /// Command 1.
        cmd1: u8,
        /// Command 2.
        cmd2: u8,
        /// User data D1..D14.
        data: [u8; USER_DATA_LEN],
    },

    /// ALL-Link command to a group.
    AllLink {
        /// ALL-Link group.
        group: u8,
        /// Command 1.
        cmd1: u8,
        /// Command 2.
        cmd2: u8,
    },

    /// Raw X10 byte.
    X10 {
        /// House code and unit/command nibble pair.
        x10: u8,
        /// 0x00 unit code, 0x80 command.
        flag: u8,
    },

    /// Put the IM into linking mode.
    StartLinking {
        /// Linking code (responder, controller, either, delete).
        code: u8,
        /// ALL-Link group.
        group: u8,
    },

    /// Leave linking mode.
    CancelLinking,

    /// Read the first ALL-Link database record.
    GetFirstLink,

    /// Read the next ALL-Link database record.
    GetNextLink,

    /// Find, add, modify or delete an ALL-Link record.
    ManageLinkRecord {
        /// Control code (`MANAGE_*`).
        control: u8,
        /// Record flags.
        flags: u8,
        /// ALL-Link group.
        group: u8,
        /// Linked device.
        id: DeviceId,
        /// Link data.
        data: [u8; 3],
    },
}

impl Command {
    /// Build an extended command, padding `data` to 14 bytes and appending
    /// the requested trailer.
    pub fn extended(
        to: DeviceId,
        cmd1: u8,
        cmd2: u8,
        data: &[u8],
        integrity: Integrity,
    ) -> ProtocolResult<Self> {
        let max = match integrity {
            Integrity::Checksum => USER_DATA_LEN - 1,
            Integrity::Crc => USER_DATA_LEN - 2,
        };
        if data.len() > max {
            return Err(ProtocolError::UserDataTooLong {
                max,
                actual: data.len(),
            });
        }

        let mut padded = [0u8; USER_DATA_LEN];
        padded[..data.len()].copy_from_slice(data);
        match integrity {
            Integrity::Checksum => {
                padded[USER_DATA_LEN - 1] = checksum(cmd1, cmd2, &padded);
            }
            Integrity::Crc => {
                let [hi, lo] = crc16(cmd1, cmd2, &padded).to_be_bytes();
                padded[USER_DATA_LEN - 2] = hi;
                padded[USER_DATA_LEN - 1] = lo;
            }
        }

        Ok(Command::Extended {
            to,
            cmd1,
            cmd2,
            data: padded,
        })
    }

    /// Ping a device.
    pub fn ping(to: DeviceId) -> Self {
        Command::Direct {
            to,
            cmd1: CMD_PING,
            cmd2: 0x00,
        }
    }

    /// Ask a device to broadcast its category (SET button pressed).
    pub fn id_request(to: DeviceId) -> Self {
        Command::Direct {
            to,
            cmd1: CMD_ID_REQUEST,
            cmd2: 0x00,
        }
    }

    /// Ask a device which Insteon engine it runs.
    pub fn engine_version(to: DeviceId) -> Self {
        Command::Direct {
            to,
            cmd1: CMD_ENGINE_VERSION,
            cmd2: 0x00,
        }
    }

    /// Turn a device on at `level` (0x00..=0xFF).
    pub fn turn_on(to: DeviceId, level: u8) -> Self {
        Command::Direct {
            to,
            cmd1: CMD_LIGHT_ON,
            cmd2: level,
        }
    }

    /// Turn a device on at a percentage of full brightness.
    pub fn turn_on_percent(to: DeviceId, percent: u8) -> ProtocolResult<Self> {
        Ok(Command::turn_on(to, level_from_percent(percent)?))
    }

    /// Turn a device on instantly at full level.
    pub fn turn_on_fast(to: DeviceId) -> Self {
        Command::Direct {
            to,
            cmd1: CMD_LIGHT_ON_FAST,
            cmd2: LEVEL_MAX,
        }
    }

    /// Turn a device off.
    pub fn turn_off(to: DeviceId) -> Self {
        Command::Direct {
            to,
            cmd1: CMD_LIGHT_OFF,
            cmd2: 0x00,
        }
    }

    /// Turn a device off instantly.
    pub fn turn_off_fast(to: DeviceId) -> Self {
        Command::Direct {
            to,
            cmd1: CMD_LIGHT_OFF_FAST,
            cmd2: 0x00,
        }
    }

    /// Brighten one step.
    pub fn brighten(to: DeviceId) -> Self {
        Command::Direct {
            to,
            cmd1: CMD_LIGHT_BRIGHTEN,
            cmd2: 0x00,
        }
    }

    /// Dim one step.
    pub fn dim(to: DeviceId) -> Self {
        Command::Direct {
            to,
            cmd1: CMD_LIGHT_DIM,
            cmd2: 0x00,
        }
    }

    /// Request device status. The ACK carries the level in cmd2.
    pub fn status_request(to: DeviceId, kind: u8) -> Self {
        Command::Direct {
            to,
            cmd1: CMD_STATUS_REQUEST,
            cmd2: kind,
        }
    }

    /// Request product data. The device answers with an extended message.
    pub fn product_data_request(to: DeviceId) -> Self {
        Command::Direct {
            to,
            cmd1: CMD_PRODUCT_DATA_REQUEST,
            cmd2: 0x00,
        }
    }

    /// Extended get for a button/group. The device answers with an extended message.
    pub fn extended_get(to: DeviceId, group: u8) -> ProtocolResult<Self> {
        Command::extended(
            to,
            CMD_EXTENDED_GET_SET,
            0x00,
            &[group],
            Integrity::Checksum,
        )
    }

    /// ALL-Link command to a scene/group.
    pub fn all_link(group: u8, cmd1: u8, cmd2: u8) -> Self {
        Command::AllLink { group, cmd1, cmd2 }
    }

    /// Start linking with the IM as controller, responder or either.
    pub fn start_linking(code: u8, group: u8) -> Self {
        Command::StartLinking { code, group }
    }

    /// Target device of a direct or extended command.
    pub fn target(&self) -> Option<DeviceId> {
        match self {
            Command::Direct { to, .. } | Command::Extended { to, .. } => Some(*to),
            _ => None,
        }
    }

    /// Command 1 of a direct or extended command.
    pub fn cmd1(&self) -> Option<u8> {
        match self {
            Command::Direct { cmd1, .. } | Command::Extended { cmd1, .. } => Some(*cmd1),
            _ => None,
        }
    }

    /// Whether this is an extended direct message.
    pub fn is_extended(&self) -> bool {
        matches!(self, Command::Extended { .. })
    }

    /// IM message type code.
    pub fn code(&self) -> u8 {
        match self {
            Command::GetImInfo => MSG_GET_IM_INFO,
            Command::Direct { .. } | Command::Extended { .. } => MSG_SEND_DIRECT,
            Command::AllLink { .. } => MSG_SEND_ALL_LINK,
            Command::X10 { .. } => MSG_SEND_X10,
            Command::StartLinking { .. } => MSG_START_LINKING,
            Command::CancelLinking => MSG_CANCEL_LINKING,
            Command::GetFirstLink => MSG_GET_FIRST_LINK,
            Command::GetNextLink => MSG_GET_NEXT_LINK,
            Command::ManageLinkRecord { .. } => MSG_MANAGE_LINK_RECORD,
        }
    }

    /// Encode the command to bytes for transmission.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![START_OF_MESSAGE, self.code()];

        match self {
            Command::GetImInfo
            | Command::CancelLinking
            | Command::GetFirstLink
            | Command::GetNextLink => {}

            Command::Direct { to, cmd1, cmd2 } => {
                buf.extend_from_slice(to.as_bytes());
                buf.extend_from_slice(&[FLAGS_STANDARD_DIRECT, *cmd1, *cmd2]);
            }

            Command::Extended {
                to,
                cmd1,
                cmd2,
                data,
            } => {
                buf.extend_from_slice(to.as_bytes());
                buf.extend_from_slice(&[FLAGS_EXTENDED_DIRECT, *cmd1, *cmd2]);
                buf.extend_from_slice(data);
            }

            Command::AllLink { group, cmd1, cmd2 } => {
                buf.extend_from_slice(&[*group, *cmd1, *cmd2]);
            }

            Command::X10 { x10, flag } => {
                buf.extend_from_slice(&[*x10, *flag]);
            }

            Command::StartLinking { code, group } => {
                buf.extend_from_slice(&[*code, *group]);
            }

            Command::ManageLinkRecord {
                control,
                flags,
                group,
                id,
                data,
            } => {
                buf.extend_from_slice(&[*control, *flags, *group]);
                buf.extend_from_slice(id.as_bytes());
                buf.extend_from_slice(data);
            }
        }

        buf
    }

    /// Encoded command as uppercase hex, the form echoed back by the IM.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.encode())
    }
}

/// Convert a brightness percentage (0..=100) to a level byte.
pub fn level_from_percent(percent: u8) -> ProtocolResult<u8> {
    if percent > 100 {
        return Err(ProtocolError::out_of_range("percent", percent as u32, 0, 100));
    }
    Ok(((percent as u32 * 255 + 50) / 100) as u8)
}

/// Convert a level byte to a brightness percentage.
pub fn percent_from_level(level: u8) -> u8 {
    ((level as u32 * 100 + 127) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> DeviceId {
        "1A2B3C".parse().unwrap()
    }

    #[test]
    fn test_encode_standard_direct() {
        assert_eq!(Command::turn_on(id(), 0xFF).to_hex(), "02621A2B3C0F11FF");
        assert_eq!(Command::ping(id()).to_hex(), "02621A2B3C0F0F00");
    }

    #[test]
    fn test_encode_extended_checksum() {
        let cmd = Command::extended_get(id(), 0x01).unwrap();
        assert_eq!(
            cmd.to_hex(),
            "02621A2B3C1F2E0001000000000000000000000000D1"
        );
        assert!(cmd.is_extended());
    }

    #[test]
    fn test_encode_extended_crc() {
        let cmd = Command::extended(id(), 0x2E, 0x02, &[0x01], Integrity::Crc).unwrap();
        assert!(cmd.to_hex().ends_with("6B75"));
    }

    #[test]
    fn test_extended_rejects_long_data() {
        let err = Command::extended(id(), 0x2E, 0x00, &[0u8; 14], Integrity::Checksum);
        assert_eq!(
            err,
            Err(ProtocolError::UserDataTooLong {
                max: 13,
                actual: 14
            })
        );
    }

    #[test]
    fn test_encode_im_commands() {
        assert_eq!(Command::GetImInfo.to_hex(), "0260");
        assert_eq!(Command::all_link(0x01, 0x11, 0x00).to_hex(), "0261011100");
        assert_eq!(Command::start_linking(0x01, 0x00).to_hex(), "02640100");
        assert_eq!(Command::GetNextLink.to_hex(), "026A");
        let manage = Command::ManageLinkRecord {
            control: MANAGE_DELETE,
            flags: 0xE2,
            group: 0x01,
            id: id(),
            data: [0x01, 0x20, 0x41],
        };
        assert_eq!(manage.to_hex(), "026F80E2011A2B3C012041");
    }

    #[test]
    fn test_level_conversion() {
        assert_eq!(level_from_percent(0), Ok(0x00));
        assert_eq!(level_from_percent(50), Ok(0x80));
        assert_eq!(level_from_percent(100), Ok(0xFF));
        assert!(level_from_percent(101).is_err());
        assert_eq!(percent_from_level(0xFF), 100);
        assert_eq!(percent_from_level(0x80), 50);
    }
}
