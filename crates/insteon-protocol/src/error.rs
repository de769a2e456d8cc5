//! Protocol error types.

use thiserror::Error;

/// Errors that can occur when working with the Insteon protocol.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Device id is not exactly six hex characters.
    #[error("invalid device id {0:?}: expected 6 hex characters")]
    InvalidDeviceId(String),

    /// Text is not a hex-encoded IM message.
    #[error("invalid hex: {0:?}")]
    InvalidHex(String),

    /// Message is too short for its type.
    #[error("message too short: expected {expected} hex characters, got {actual}")]
    MessageTooShort {
        /// Expected length in hex characters.
        expected: usize,
        /// Actual length received.
        actual: usize,
    },

    /// Message type code has no entry in the dispatch table.
    #[error("unknown message type: 0x{0:02X}")]
    UnknownMessageType(u8),

    /// Extended user data is longer than 14 bytes.
    #[error("user data too long: maximum {max} bytes, got {actual}")]
    UserDataTooLong {
        /// Maximum allowed length.
        max: usize,
        /// Actual length supplied.
        actual: usize,
    },

    /// Argument outside its valid range.
    #[error("{name} out of range: {value} (valid {min}..={max})")]
    OutOfRange {
        /// Argument name.
        name: &'static str,
        /// Value supplied.
        value: u32,
        /// Smallest accepted value.
        min: u32,
        /// Largest accepted value.
        max: u32,
    },
}

impl ProtocolError {
    /// Create an out-of-range error.
    pub fn out_of_range(name: &'static str, value: u32, min: u32, max: u32) -> Self {
        ProtocolError::OutOfRange {
            name,
            value,
            min,
            max,
        }
    }
}

/// Result type alias for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProtocolError::InvalidDeviceId("12345".to_string());
        assert!(err.to_string().contains("12345"));

        let err = ProtocolError::out_of_range("level", 120, 0, 100);
        assert_eq!(err.to_string(), "level out of range: 120 (valid 0..=100)");

        let err = ProtocolError::UnknownMessageType(0xFF);
        assert!(err.to_string().contains("0xFF"));
    }
}
