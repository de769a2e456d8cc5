//! Message dispatch table.
//!
//! Maps the type code that follows `02` to the number of hex characters the
//! message occupies and the decoder that turns those characters into a
//! [`Message`]. Only the direct echo (`62`) has a computed size: its flags
//! byte at offset 10 says whether 14 bytes of user data follow.

use log::{debug, trace};

use crate::buffer::HexBuffer;
use crate::constants::*;
use crate::error::{ProtocolError, ProtocolResult};
use crate::messages::{self, Message};

/// How many characters a message needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Size {
    /// The message occupies exactly this many characters.
    Exact(usize),
    /// Not enough is buffered to know yet.
    NeedMoreData,
}

/// How a table entry determines its message size.
#[derive(Clone, Copy)]
pub enum Sizing {
    /// Fixed length in hex characters.
    Fixed(usize),
    /// Length computed from the buffered characters.
    Computed(fn(&HexBuffer) -> Size),
}

/// One registered message type.
#[derive(Clone, Copy)]
pub struct DispatchEntry {
    /// Type code following the `02` start byte.
    pub code: u8,
    /// Short name for logging.
    pub name: &'static str,
    /// How to size the message.
    pub sizing: Sizing,
    /// Decoder, given the exact characters and their decoded bytes.
    pub parse: fn(String, &[u8]) -> Message,
}

impl DispatchEntry {
    /// Size of the message at the head of `buffer`.
    pub fn size_of(&self, buffer: &HexBuffer) -> Size {
        let size = match self.sizing {
            Sizing::Fixed(len) => Size::Exact(len),
            Sizing::Computed(f) => f(buffer),
        };
        match size {
            Size::Exact(len) if buffer.len() < len => Size::NeedMoreData,
            other => other,
        }
    }
}

impl std::fmt::Debug for DispatchEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchEntry")
            .field("code", &format_args!("0x{:02X}", self.code))
            .field("name", &self.name)
            .finish()
    }
}

/// Size a direct echo from its flags byte.
fn direct_echo_size(buffer: &HexBuffer) -> Size {
    if buffer.len() < LEN_SEND_DIRECT_MIN {
        return Size::NeedMoreData;
    }
    match buffer.byte_at(SEND_DIRECT_FLAGS_OFFSET) {
        Some(flags) if flags & FLAG_EXTENDED != 0 => Size::Exact(LEN_SEND_DIRECT_EXTENDED),
        Some(_) => Size::Exact(LEN_SEND_DIRECT_STANDARD),
        None => Size::NeedMoreData,
    }
}

/// Every message type the engine understands.
pub static DISPATCH_TABLE: &[DispatchEntry] = &[
    DispatchEntry {
        code: MSG_STANDARD_RECEIVED,
        name: "standard",
        sizing: Sizing::Fixed(LEN_STANDARD_RECEIVED),
        parse: messages::decode_standard,
    },
    DispatchEntry {
        code: MSG_EXTENDED_RECEIVED,
        name: "extended",
        sizing: Sizing::Fixed(LEN_EXTENDED_RECEIVED),
        parse: messages::decode_extended,
    },
    DispatchEntry {
        code: MSG_X10_RECEIVED,
        name: "x10",
        sizing: Sizing::Fixed(LEN_X10_RECEIVED),
        parse: messages::decode_x10_received,
    },
    DispatchEntry {
        code: MSG_ALL_LINK_COMPLETE,
        name: "link-complete",
        sizing: Sizing::Fixed(LEN_ALL_LINK_COMPLETE),
        parse: messages::decode_link_complete,
    },
    DispatchEntry {
        code: MSG_CLEANUP_FAILURE,
        name: "cleanup-failure",
        sizing: Sizing::Fixed(LEN_CLEANUP_FAILURE),
        parse: messages::decode_cleanup_failure,
    },
    DispatchEntry {
        code: MSG_ALL_LINK_RECORD,
        name: "link-record",
        sizing: Sizing::Fixed(LEN_ALL_LINK_RECORD),
        parse: messages::decode_link_record,
    },
    DispatchEntry {
        code: MSG_CLEANUP_STATUS,
        name: "cleanup-status",
        sizing: Sizing::Fixed(LEN_CLEANUP_STATUS),
        parse: messages::decode_cleanup_status,
    },
    DispatchEntry {
        code: MSG_GET_IM_INFO,
        name: "im-info",
        sizing: Sizing::Fixed(LEN_GET_IM_INFO),
        parse: messages::decode_im_info,
    },
    DispatchEntry {
        code: MSG_SEND_ALL_LINK,
        name: "all-link-echo",
        sizing: Sizing::Fixed(LEN_SEND_ALL_LINK),
        parse: messages::decode_all_link_echo,
    },
    DispatchEntry {
        code: MSG_SEND_DIRECT,
        name: "direct-echo",
        sizing: Sizing::Computed(direct_echo_size),
        parse: messages::decode_direct_echo,
    },
    DispatchEntry {
        code: MSG_SEND_X10,
        name: "x10-echo",
        sizing: Sizing::Fixed(LEN_SEND_X10),
        parse: messages::decode_x10_echo,
    },
    DispatchEntry {
        code: MSG_START_LINKING,
        name: "start-linking-echo",
        sizing: Sizing::Fixed(LEN_START_LINKING),
        parse: messages::decode_start_linking_echo,
    },
    DispatchEntry {
        code: MSG_CANCEL_LINKING,
        name: "cancel-linking-echo",
        sizing: Sizing::Fixed(LEN_CANCEL_LINKING),
        parse: messages::decode_cancel_linking_echo,
    },
    DispatchEntry {
        code: MSG_GET_FIRST_LINK,
        name: "get-first-link-echo",
        sizing: Sizing::Fixed(LEN_GET_LINK),
        parse: messages::decode_get_first_link_echo,
    },
    DispatchEntry {
        code: MSG_GET_NEXT_LINK,
        name: "get-next-link-echo",
        sizing: Sizing::Fixed(LEN_GET_LINK),
        parse: messages::decode_get_next_link_echo,
    },
    DispatchEntry {
        code: MSG_MANAGE_LINK_RECORD,
        name: "manage-link-echo",
        sizing: Sizing::Fixed(LEN_MANAGE_LINK_RECORD),
        parse: messages::decode_manage_link_echo,
    },
];

/// Find the table entry for a type code.
pub fn lookup(code: u8) -> Option<&'static DispatchEntry> {
    DISPATCH_TABLE.iter().find(|entry| entry.code == code)
}

/// Outcome of one dispatch step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchResult {
    /// A message was parsed and removed from the buffer.
    Processed(Message),
    /// Unrecognised characters were dropped (count given, always > 0).
    Skipped(usize),
    /// The head of the buffer is an incomplete message.
    InsufficientData,
}

/// Parse and consume the message at the head of `buffer`.
///
/// Every `Skipped` result consumes at least one byte, so repeated calls
/// always reach `InsufficientData`.
pub fn next_message(buffer: &mut HexBuffer) -> DispatchResult {
    if buffer.len() < 2 {
        return DispatchResult::InsufficientData;
    }

    if !buffer.starts_with(START_OF_MESSAGE_HEX) {
        debug!("dropping stray byte {:?}", buffer.peek(2).unwrap_or_default());
        buffer.skip(2);
        return DispatchResult::Skipped(2);
    }

    let code = match buffer.byte_at(2) {
        Some(code) => code,
        None => return DispatchResult::InsufficientData,
    };

    let entry = match lookup(code) {
        Some(entry) => entry,
        None => {
            debug!("skipping unknown message type 0x{:02X}", code);
            buffer.skip(UNKNOWN_TYPE_SKIP);
            return DispatchResult::Skipped(UNKNOWN_TYPE_SKIP);
        }
    };

    let len = match entry.size_of(buffer) {
        Size::Exact(len) => len,
        Size::NeedMoreData => return DispatchResult::InsufficientData,
    };

    let raw = buffer.consume(len);
    match hex::decode(&raw) {
        Ok(bytes) => {
            trace!("parsed {} message {}", entry.name, raw);
            DispatchResult::Processed((entry.parse)(raw, &bytes))
        }
        Err(_) => DispatchResult::Skipped(len),
    }
}

/// Decode the complete message at the start of `text`.
///
/// Unlike [`next_message`] nothing is skipped: text that is not hex, does
/// not start with `02`, has an unknown type code or ends early is an error.
/// Returns the message and the number of characters it occupied.
pub fn decode_message(text: &str) -> ProtocolResult<(Message, usize)> {
    if !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ProtocolError::InvalidHex(text.to_string()));
    }

    let mut buffer = HexBuffer::new();
    buffer.push_hex(text);
    if buffer.len() < 4 {
        return Err(ProtocolError::MessageTooShort {
            expected: 4,
            actual: buffer.len(),
        });
    }
    if !buffer.starts_with(START_OF_MESSAGE_HEX) {
        return Err(ProtocolError::InvalidHex(text.to_string()));
    }

    let code = buffer
        .byte_at(2)
        .ok_or_else(|| ProtocolError::InvalidHex(text.to_string()))?;
    let entry = lookup(code).ok_or(ProtocolError::UnknownMessageType(code))?;

    let len = match entry.size_of(&buffer) {
        Size::Exact(len) => len,
        Size::NeedMoreData => {
            let expected = match entry.sizing {
                Sizing::Fixed(len) => len,
                Sizing::Computed(size) => match size(&buffer) {
                    Size::Exact(len) => len,
                    // Only the direct echo is computed; it needs its flags byte
                    Size::NeedMoreData => LEN_SEND_DIRECT_MIN,
                },
            };
            return Err(ProtocolError::MessageTooShort {
                expected,
                actual: buffer.len(),
            });
        }
    };

    let raw = buffer.consume(len);
    let bytes = hex::decode(&raw).map_err(|_| ProtocolError::InvalidHex(raw.clone()))?;
    Ok(((entry.parse)(raw, &bytes), len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessageType;

    const STANDARD: &str = "02501A2B3C000001CF1100";

    fn buffer(text: &str) -> HexBuffer {
        let mut buf = HexBuffer::new();
        buf.push_hex(text);
        buf
    }

    #[test]
    fn test_table_codes_are_unique() {
        for (i, a) in DISPATCH_TABLE.iter().enumerate() {
            for b in &DISPATCH_TABLE[i + 1..] {
                assert_ne!(a.code, b.code, "duplicate entry {:?}", a);
            }
        }
    }

    #[test]
    fn test_fixed_sizes() {
        let expected = [
            (0x50, 22),
            (0x51, 50),
            (0x53, 20),
            (0x57, 20),
            (0x58, 6),
            (0x60, 18),
            (0x61, 12),
            (0x63, 10),
            (0x64, 10),
            (0x65, 6),
            (0x69, 6),
            (0x6A, 6),
            (0x6F, 24),
        ];
        for (code, len) in expected {
            let entry = lookup(code).expect("registered");
            let buf = buffer(&"0".repeat(len));
            assert_eq!(entry.size_of(&buf), Size::Exact(len), "code {:02X}", code);
        }
    }

    #[test]
    fn test_direct_echo_size_from_flags() {
        let entry = lookup(0x62).unwrap();
        assert_eq!(entry.size_of(&buffer("02621A2B3C")), Size::NeedMoreData);
        assert_eq!(
            entry.size_of(&buffer("02621A2B3C0F11FF06")),
            Size::Exact(18)
        );
        // Extended flag seen but the body has not arrived yet.
        assert_eq!(entry.size_of(&buffer("02621A2B3C1F")), Size::NeedMoreData);
        let extended = "02621A2B3C1F2E0001000000000000000000000000D106";
        assert_eq!(entry.size_of(&buffer(extended)), Size::Exact(46));
    }

    #[test]
    fn test_next_message_processes_and_consumes() {
        let mut buf = buffer(STANDARD);
        buf.push_hex("0258");
        match next_message(&mut buf) {
            DispatchResult::Processed(Message::Standard(m)) => {
                assert_eq!(m.message_type(), MessageType::AllLinkBroadcast);
                assert_eq!(m.raw, STANDARD);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(buf.as_str(), "0258");
        assert_eq!(next_message(&mut buf), DispatchResult::InsufficientData);
    }

    #[test]
    fn test_unknown_type_skips_four() {
        let mut buf = buffer("02FF");
        buf.push_hex(STANDARD);
        assert_eq!(next_message(&mut buf), DispatchResult::Skipped(4));
        assert!(matches!(
            next_message(&mut buf),
            DispatchResult::Processed(Message::Standard(_))
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_resynchronises_after_garbage() {
        let mut buf = buffer("DEADBEEF0299");
        buf.push_hex(STANDARD);
        let mut parsed = Vec::new();
        let mut last_len = buf.len();
        loop {
            match next_message(&mut buf) {
                DispatchResult::Processed(msg) => parsed.push(msg),
                DispatchResult::Skipped(n) => assert!(n > 0),
                DispatchResult::InsufficientData => break,
            }
            assert!(buf.len() < last_len);
            last_len = buf.len();
        }
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].raw(), STANDARD);
    }

    #[test]
    fn test_partial_message_waits() {
        let mut buf = HexBuffer::new();
        for chunk in ["0", "25", "01A2B3C0", "00001CF11", "00"] {
            assert_eq!(next_message(&mut buf), DispatchResult::InsufficientData);
            buf.push_hex(chunk);
        }
        assert!(matches!(
            next_message(&mut buf),
            DispatchResult::Processed(Message::Standard(_))
        ));
    }

    #[test]
    fn test_decode_message_reports_length() {
        let text = format!("{}0260AABBCC03370006", STANDARD);
        let (msg, used) = decode_message(&text).unwrap();
        assert_eq!(used, STANDARD.len());
        assert_eq!(msg.raw(), STANDARD);

        let (msg, used) = decode_message(&text[used..]).unwrap();
        assert_eq!(used, 18);
        assert!(matches!(msg, Message::ImInfo { .. }));
    }

    #[test]
    fn test_decode_message_errors() {
        assert_eq!(
            decode_message("0250zz"),
            Err(ProtocolError::InvalidHex("0250zz".to_string()))
        );
        assert_eq!(
            decode_message("0650"),
            Err(ProtocolError::InvalidHex("0650".to_string()))
        );
        assert_eq!(decode_message("02FF00"), Err(ProtocolError::UnknownMessageType(0xFF)));
        assert_eq!(
            decode_message("02501A2B3C"),
            Err(ProtocolError::MessageTooShort {
                expected: 22,
                actual: 10
            })
        );
        assert_eq!(
            decode_message("02621A"),
            Err(ProtocolError::MessageTooShort {
                expected: 12,
                actual: 6
            })
        );
    }
}
