//! Messages received from the IM.
//!
//! Every variant keeps the exact hex characters it was parsed from in `raw`.
//! The decoders in this module are only called by the dispatch table, which
//! guarantees the byte slice has the exact length of the message type.

use serde::Serialize;

use crate::checksum::{checksum_matches, crc_matches};
use crate::constants::*;
use crate::types::*;

/// A standard (non-extended) message from a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StandardMessage {
    /// Exact hex characters consumed.
    pub raw: String,
    /// Sending device.
    pub from: DeviceId,
    /// Destination (IM id, or group number for ALL-Link broadcasts).
    pub to: DeviceId,
    /// Message flags.
    pub flags: MessageFlags,
    /// Command 1.
    pub cmd1: u8,
    /// Command 2.
    pub cmd2: u8,
}

impl StandardMessage {
    /// Message subtype.
    pub fn message_type(&self) -> MessageType {
        self.flags.message_type()
    }

    /// Group number of an ALL-Link broadcast (the destination field read as a number).
    pub fn group(&self) -> u8 {
        self.to.0[2]
    }
}

/// An extended message from a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtendedMessage {
    /// Exact hex characters consumed.
    pub raw: String,
    /// Sending device.
    pub from: DeviceId,
    /// Destination.
    pub to: DeviceId,
    /// Message flags.
    pub flags: MessageFlags,
    /// Command 1.
    pub cmd1: u8,
    /// Command 2.
    pub cmd2: u8,
    /// User data D1..D14.
    pub data: [u8; USER_DATA_LEN],
    /// D14 holds a correct additive checksum.
    pub checksum_valid: bool,
    /// D13..D14 hold a correct CRC-16.
    pub crc_valid: bool,
}

impl ExtendedMessage {
    /// Message subtype.
    pub fn message_type(&self) -> MessageType {
        self.flags.message_type()
    }

    /// Whether either integrity trailer checks out.
    pub fn is_intact(&self) -> bool {
        self.checksum_valid || self.crc_valid
    }
}

/// Echo of a direct (0262) message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectEcho {
    /// Exact hex characters consumed.
    pub raw: String,
    /// Target device.
    pub to: DeviceId,
    /// Message flags as sent.
    pub flags: MessageFlags,
    /// Command 1.
    pub cmd1: u8,
    /// Command 2.
    pub cmd2: u8,
    /// User data for extended messages.
    pub data: Option<[u8; USER_DATA_LEN]>,
    /// IM accepted the message.
    pub ack: bool,
}

/// Messages the IM produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Message {
    /// Standard message received (0250).
    Standard(StandardMessage),

    /// Extended message received (0251).
    Extended(ExtendedMessage),

    /// X10 message received (0252).
    X10Received {
        /// Exact hex characters consumed.
        raw: String,
        /// X10 raw byte (house code and unit/command).
        x10: u8,
        /// 0x00 for a unit code, 0x80 for a command.
        flag: u8,
    },

    /// ALL-Linking completed (0253).
    LinkComplete {
        /// Exact hex characters consumed.
        raw: String,
        /// Role the IM took.
        role: LinkRole,
        /// ALL-Link group.
        group: u8,
        /// Linked device.
        id: DeviceId,
        /// Category of the linked device.
        info: DeviceInfo,
    },

    /// ALL-Link cleanup failure report (0256).
    CleanupFailure {
        /// Exact hex characters consumed.
        raw: String,
        /// ALL-Link group.
        group: u8,
        /// Device that did not acknowledge the cleanup.
        id: DeviceId,
    },

    /// ALL-Link record response (0257).
    LinkRecord {
        /// Exact hex characters consumed.
        raw: String,
        /// The record.
        record: LinkRecord,
    },

    /// ALL-Link cleanup status report (0258).
    CleanupStatus {
        /// Exact hex characters consumed.
        raw: String,
        /// All cleanups were acknowledged.
        ack: bool,
    },

    /// Get IM info echo (0260).
    ImInfo {
        /// Exact hex characters consumed.
        raw: String,
        /// IM address.
        id: DeviceId,
        /// IM category and firmware.
        info: DeviceInfo,
        /// IM accepted the request.
        ack: bool,
    },

    /// Send ALL-Link command echo (0261).
    AllLinkEcho {
        /// Exact hex characters consumed.
        raw: String,
        /// ALL-Link group.
        group: u8,
        /// Command 1.
        cmd1: u8,
        /// Command 2.
        cmd2: u8,
        /// IM accepted the command.
        ack: bool,
    },

    /// Direct message echo (0262).
    DirectEcho(DirectEcho),

    /// X10 echo (0263).
    X10Echo {
        /// Exact hex characters consumed.
        raw: String,
        /// X10 raw byte.
        x10: u8,
        /// X10 flag.
        flag: u8,
        /// IM accepted the command.
        ack: bool,
    },

    /// Start linking echo (0264).
    StartLinkingEcho {
        /// Exact hex characters consumed.
        raw: String,
        /// Linking code.
        code: u8,
        /// ALL-Link group.
        group: u8,
        /// IM accepted the command.
        ack: bool,
    },

    /// Cancel linking echo (0265).
    CancelLinkingEcho {
        /// Exact hex characters consumed.
        raw: String,
        /// IM accepted the command.
        ack: bool,
    },

    /// Get first ALL-Link record echo (0269).
    GetFirstLinkEcho {
        /// Exact hex characters consumed.
        raw: String,
        /// A record follows; NAK means the database is empty.
        ack: bool,
    },

    /// Get next ALL-Link record echo (026A).
    GetNextLinkEcho {
        /// Exact hex characters consumed.
        raw: String,
        /// A record follows; NAK means there are no more records.
        ack: bool,
    },

    /// Manage ALL-Link record echo (026F).
    ManageLinkEcho {
        /// Exact hex characters consumed.
        raw: String,
        /// Control code.
        control: u8,
        /// Record as sent.
        record: LinkRecord,
        /// IM accepted the command.
        ack: bool,
    },
}

impl Message {
    /// Exact hex characters this message was parsed from.
    pub fn raw(&self) -> &str {
        match self {
            Message::Standard(m) => &m.raw,
            Message::Extended(m) => &m.raw,
            Message::DirectEcho(m) => &m.raw,
            Message::X10Received { raw, .. }
            | Message::LinkComplete { raw, .. }
            | Message::CleanupFailure { raw, .. }
            | Message::LinkRecord { raw, .. }
            | Message::CleanupStatus { raw, .. }
            | Message::ImInfo { raw, .. }
            | Message::AllLinkEcho { raw, .. }
            | Message::X10Echo { raw, .. }
            | Message::StartLinkingEcho { raw, .. }
            | Message::CancelLinkingEcho { raw, .. }
            | Message::GetFirstLinkEcho { raw, .. }
            | Message::GetNextLinkEcho { raw, .. }
            | Message::ManageLinkEcho { raw, .. } => raw,
        }
    }

    /// Message type code (second byte).
    pub fn code(&self) -> u8 {
        match self {
            Message::Standard(_) => MSG_STANDARD_RECEIVED,
            Message::Extended(_) => MSG_EXTENDED_RECEIVED,
            Message::X10Received { .. } => MSG_X10_RECEIVED,
            Message::LinkComplete { .. } => MSG_ALL_LINK_COMPLETE,
            Message::CleanupFailure { .. } => MSG_CLEANUP_FAILURE,
            Message::LinkRecord { .. } => MSG_ALL_LINK_RECORD,
            Message::CleanupStatus { .. } => MSG_CLEANUP_STATUS,
            Message::ImInfo { .. } => MSG_GET_IM_INFO,
            Message::AllLinkEcho { .. } => MSG_SEND_ALL_LINK,
            Message::DirectEcho(_) => MSG_SEND_DIRECT,
            Message::X10Echo { .. } => MSG_SEND_X10,
            Message::StartLinkingEcho { .. } => MSG_START_LINKING,
            Message::CancelLinkingEcho { .. } => MSG_CANCEL_LINKING,
            Message::GetFirstLinkEcho { .. } => MSG_GET_FIRST_LINK,
            Message::GetNextLinkEcho { .. } => MSG_GET_NEXT_LINK,
            Message::ManageLinkEcho { .. } => MSG_MANAGE_LINK_RECORD,
        }
    }

    /// ACK/NAK of an echo of something the host sent. `None` for messages
    /// that originate from the network.
    pub fn echo_ack(&self) -> Option<bool> {
        match self {
            Message::ImInfo { ack, .. }
            | Message::AllLinkEcho { ack, .. }
            | Message::X10Echo { ack, .. }
            | Message::StartLinkingEcho { ack, .. }
            | Message::CancelLinkingEcho { ack, .. }
            | Message::GetFirstLinkEcho { ack, .. }
            | Message::GetNextLinkEcho { ack, .. }
            | Message::ManageLinkEcho { ack, .. } => Some(*ack),
            Message::DirectEcho(echo) => Some(echo.ack),
            _ => None,
        }
    }

    /// The echoed command without its trailing ACK/NAK byte.
    pub fn echo_body(&self) -> Option<&str> {
        self.echo_ack()?;
        let raw = self.raw();
        raw.get(..raw.len().saturating_sub(2))
    }
}

// ============================================================================
// Decoders
// ============================================================================

fn id_at(b: &[u8], offset: usize) -> DeviceId {
    DeviceId::from_slice(&b[offset..]).unwrap_or_default()
}

fn user_data(b: &[u8], offset: usize) -> [u8; USER_DATA_LEN] {
    let mut data = [0u8; USER_DATA_LEN];
    data.copy_from_slice(&b[offset..offset + USER_DATA_LEN]);
    data
}

fn is_ack(byte: u8) -> bool {
    byte == ACK
}

pub(crate) fn decode_standard(raw: String, b: &[u8]) -> Message {
    Message::Standard(StandardMessage {
        raw,
        from: id_at(b, 2),
        to: id_at(b, 5),
        flags: MessageFlags(b[8]),
        cmd1: b[9],
        cmd2: b[10],
    })
}

pub(crate) fn decode_extended(raw: String, b: &[u8]) -> Message {
    let (cmd1, cmd2) = (b[9], b[10]);
    let data = user_data(b, 11);
    Message::Extended(ExtendedMessage {
        raw,
        from: id_at(b, 2),
        to: id_at(b, 5),
        flags: MessageFlags(b[8]),
        cmd1,
        cmd2,
        data,
        checksum_valid: checksum_matches(cmd1, cmd2, &data),
        crc_valid: crc_matches(cmd1, cmd2, &data),
    })
}

pub(crate) fn decode_x10_received(raw: String, b: &[u8]) -> Message {
    Message::X10Received {
        raw,
        x10: b[2],
        flag: b[3],
    }
}

pub(crate) fn decode_link_complete(raw: String, b: &[u8]) -> Message {
    Message::LinkComplete {
        raw,
        role: LinkRole::from(b[2]),
        group: b[3],
        id: id_at(b, 4),
        info: DeviceInfo {
            category: b[7],
            subcategory: b[8],
            firmware: b[9],
        },
    }
}

pub(crate) fn decode_cleanup_failure(raw: String, b: &[u8]) -> Message {
    Message::CleanupFailure {
        raw,
        group: b[3],
        id: id_at(b, 4),
    }
}

pub(crate) fn decode_link_record(raw: String, b: &[u8]) -> Message {
    Message::LinkRecord {
        raw,
        record: LinkRecord {
            flags: LinkFlags::from(b[2]),
            group: b[3],
            id: id_at(b, 4),
            data: [b[7], b[8], b[9]],
        },
    }
}

pub(crate) fn decode_cleanup_status(raw: String, b: &[u8]) -> Message {
    Message::CleanupStatus {
        raw,
        ack: is_ack(b[2]),
    }
}

pub(crate) fn decode_im_info(raw: String, b: &[u8]) -> Message {
    Message::ImInfo {
        raw,
        id: id_at(b, 2),
        info: DeviceInfo {
            category: b[5],
            subcategory: b[6],
            firmware: b[7],
        },
        ack: is_ack(b[8]),
    }
}

pub(crate) fn decode_all_link_echo(raw: String, b: &[u8]) -> Message {
    Message::AllLinkEcho {
        raw,
        group: b[2],
        cmd1: b[3],
        cmd2: b[4],
        ack: is_ack(b[5]),
    }
}

pub(crate) fn decode_direct_echo(raw: String, b: &[u8]) -> Message {
    let flags = MessageFlags(b[5]);
    let data = flags.is_extended().then(|| user_data(b, 8));
    let ack = b.last().copied().map(is_ack).unwrap_or(false);
    Message::DirectEcho(DirectEcho {
        raw,
        to: id_at(b, 2),
        flags,
        cmd1: b[6],
        cmd2: b[7],
        data,
        ack,
    })
}

pub(crate) fn decode_x10_echo(raw: String, b: &[u8]) -> Message {
    Message::X10Echo {
        raw,
        x10: b[2],
        flag: b[3],
        ack: is_ack(b[4]),
    }
}

pub(crate) fn decode_start_linking_echo(raw: String, b: &[u8]) -> Message {
    Message::StartLinkingEcho {
        raw,
        code: b[2],
        group: b[3],
        ack: is_ack(b[4]),
    }
}

pub(crate) fn decode_cancel_linking_echo(raw: String, b: &[u8]) -> Message {
    Message::CancelLinkingEcho {
        raw,
        ack: is_ack(b[2]),
    }
}

pub(crate) fn decode_get_first_link_echo(raw: String, b: &[u8]) -> Message {
    Message::GetFirstLinkEcho {
        raw,
        ack: is_ack(b[2]),
    }
}

pub(crate) fn decode_get_next_link_echo(raw: String, b: &[u8]) -> Message {
    Message::GetNextLinkEcho {
        raw,
        ack: is_ack(b[2]),
    }
}

pub(crate) fn decode_manage_link_echo(raw: String, b: &[u8]) -> Message {
    Message::ManageLinkEcho {
        raw,
        control: b[2],
        record: LinkRecord {
            flags: LinkFlags::from(b[3]),
            group: b[4],
            id: id_at(b, 5),
            data: [b[8], b[9], b[10]],
        },
        ack: is_ack(b[11]),
    }
}
