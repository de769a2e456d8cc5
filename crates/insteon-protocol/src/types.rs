//! Common types used in the protocol.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::*;
use crate::error::ProtocolError;

/// Size of an Insteon device address in bytes.
pub const DEVICE_ID_SIZE: usize = 3;

/// A 3-byte Insteon device address, written as six hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct DeviceId(pub [u8; DEVICE_ID_SIZE]);

impl DeviceId {
    /// Create a new device id from bytes.
    pub fn new(bytes: [u8; DEVICE_ID_SIZE]) -> Self {
        DeviceId(bytes)
    }

    /// Create from a slice. Returns None if the slice is too short.
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() >= DEVICE_ID_SIZE {
            let mut bytes = [0u8; DEVICE_ID_SIZE];
            bytes.copy_from_slice(&slice[..DEVICE_ID_SIZE]);
            Some(DeviceId(bytes))
        } else {
            None
        }
    }

    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; DEVICE_ID_SIZE] {
        &self.0
    }

    /// Uppercase hex representation (`1A2B3C`).
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }

    /// The id read as a big-endian integer.
    ///
    /// Group broadcasts carry the group number in the destination field,
    /// so this is how the group is recovered.
    pub fn as_u32(&self) -> u32 {
        u32::from_be_bytes([0, self.0[0], self.0[1], self.0[2]])
    }
}

impl FromStr for DeviceId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != DEVICE_ID_SIZE * 2 {
            return Err(ProtocolError::InvalidDeviceId(s.to_string()));
        }
        let bytes = hex::decode(s).map_err(|_| ProtocolError::InvalidDeviceId(s.to_string()))?;
        DeviceId::from_slice(&bytes).ok_or_else(|| ProtocolError::InvalidDeviceId(s.to_string()))
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}{:02X}{:02X}", self.0[0], self.0[1], self.0[2])
    }
}

impl Serialize for DeviceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for DeviceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Message subtype carried in the top three bits of the flags byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MessageType {
    /// Direct message (0).
    Direct,
    /// ACK of a direct message (1).
    DirectAck,
    /// ALL-Link cleanup direct message (2).
    Cleanup,
    /// ACK of an ALL-Link cleanup (3).
    CleanupAck,
    /// Broadcast message (4).
    Broadcast,
    /// NAK of a direct message (5).
    DirectNak,
    /// ALL-Link broadcast (6).
    AllLinkBroadcast,
    /// NAK of an ALL-Link cleanup (7).
    CleanupNak,
}

impl MessageType {
    /// Decode from the 3-bit subtype number.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => MessageType::Direct,
            1 => MessageType::DirectAck,
            2 => MessageType::Cleanup,
            3 => MessageType::CleanupAck,
            4 => MessageType::Broadcast,
            5 => MessageType::DirectNak,
            6 => MessageType::AllLinkBroadcast,
            _ => MessageType::CleanupNak,
        }
    }

    /// The 3-bit subtype number.
    pub fn bits(self) -> u8 {
        match self {
            MessageType::Direct => 0,
            MessageType::DirectAck => 1,
            MessageType::Cleanup => 2,
            MessageType::CleanupAck => 3,
            MessageType::Broadcast => 4,
            MessageType::DirectNak => 5,
            MessageType::AllLinkBroadcast => 6,
            MessageType::CleanupNak => 7,
        }
    }
}

/// The flags byte of a standard or extended message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MessageFlags(pub u8);

impl MessageFlags {
    /// Message subtype (bits 7..5).
    pub fn message_type(&self) -> MessageType {
        MessageType::from_bits(self.0 >> 5)
    }

    /// Whether the extended bit is set.
    pub fn is_extended(&self) -> bool {
        self.0 & FLAG_EXTENDED != 0
    }

    /// Hops left (bits 3..2).
    pub fn hops_left(&self) -> u8 {
        (self.0 >> 2) & 0x03
    }

    /// Maximum hops (bits 1..0).
    pub fn max_hops(&self) -> u8 {
        self.0 & 0x03
    }
}

/// Category information reported by a device or the IM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// Device category.
    pub category: u8,
    /// Device subcategory.
    pub subcategory: u8,
    /// Firmware revision.
    pub firmware: u8,
}

impl DeviceInfo {
    /// Human-readable category name, if the category is known.
    pub fn category_name(&self) -> Option<&'static str> {
        category_name(self.category)
    }
}

/// Look up the name of a device category.
pub fn category_name(category: u8) -> Option<&'static str> {
    DEVICE_CATEGORIES.get(category as usize).copied()
}

/// Decoded ALL-Link record flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LinkFlags {
    /// Raw flag byte.
    pub raw: u8,
    /// Record is in use.
    pub is_in_use: bool,
    /// IM (or device) is the controller for this link.
    pub is_controller: bool,
    /// Record has been used before.
    pub has_been_used: bool,
    /// Record is the high-water mark (all flags clear).
    pub is_last: bool,
}

impl From<u8> for LinkFlags {
    fn from(raw: u8) -> Self {
        LinkFlags {
            raw,
            is_in_use: raw & LINK_FLAG_IN_USE != 0,
            is_controller: raw & LINK_FLAG_CONTROLLER != 0,
            has_been_used: raw & LINK_FLAG_USED_BEFORE != 0,
            is_last: raw == 0,
        }
    }
}

/// One ALL-Link database record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LinkRecord {
    /// Record flags.
    pub flags: LinkFlags,
    /// ALL-Link group.
    pub group: u8,
    /// Linked device.
    pub id: DeviceId,
    /// Link-specific data (on-level, ramp rate, button for responders).
    pub data: [u8; 3],
}

impl LinkRecord {
    /// Responder on-level.
    pub fn on_level(&self) -> u8 {
        self.data[0]
    }

    /// Responder ramp rate.
    pub fn ramp_rate(&self) -> u8 {
        self.data[1]
    }

    /// Responder button/group.
    pub fn button(&self) -> u8 {
        self.data[2]
    }
}

/// Role reported in an ALL-Linking completed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LinkRole {
    /// IM is the responder.
    Responder,
    /// IM is the controller.
    Controller,
    /// Link was deleted.
    Deleted,
    /// Any other code.
    Unknown(u8),
}

impl From<u8> for LinkRole {
    fn from(code: u8) -> Self {
        match code {
            LINK_CODE_RESPONDER => LinkRole::Responder,
            LINK_CODE_CONTROLLER => LinkRole::Controller,
            LINK_CODE_DELETED => LinkRole::Deleted,
            other => LinkRole::Unknown(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_id_parse() {
        let id: DeviceId = "1a2B3c".parse().unwrap();
        assert_eq!(id.as_bytes(), &[0x1A, 0x2B, 0x3C]);
        assert_eq!(id.to_string(), "1A2B3C");
        assert_eq!(id.as_u32(), 0x1A2B3C);
    }

    #[test]
    fn test_device_id_rejects_malformed() {
        assert!("12345".parse::<DeviceId>().is_err());
        assert!("1234567".parse::<DeviceId>().is_err());
        assert!("GG0000".parse::<DeviceId>().is_err());
    }

    #[test]
    fn test_message_flags() {
        let flags = MessageFlags(0xCF);
        assert_eq!(flags.message_type(), MessageType::AllLinkBroadcast);
        assert!(!flags.is_extended());
        assert_eq!(flags.hops_left(), 3);
        assert_eq!(flags.max_hops(), 3);

        let flags = MessageFlags(0x2B);
        assert_eq!(flags.message_type(), MessageType::DirectAck);

        let flags = MessageFlags(0x1F);
        assert_eq!(flags.message_type(), MessageType::Direct);
        assert!(flags.is_extended());
    }

    #[test]
    fn test_link_flags() {
        let flags = LinkFlags::from(0xE2);
        assert!(flags.is_in_use);
        assert!(flags.is_controller);
        assert!(flags.has_been_used);
        assert!(!flags.is_last);

        let flags = LinkFlags::from(0xA2);
        assert!(!flags.is_controller);

        assert!(LinkFlags::from(0x00).is_last);
    }

    #[test]
    fn test_category_names() {
        assert_eq!(category_name(0x01), Some("Dimmable Lighting Control"));
        assert_eq!(category_name(0x16), Some("Holiday"));
        assert_eq!(category_name(0x17), None);
    }
}
