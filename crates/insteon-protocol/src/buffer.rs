//! Receive buffer for the hex byte stream.
//!
//! The IM does not frame its output. Bytes arrive in arbitrary chunks and
//! messages are recognised by their `02 <type>` prefix. The buffer stores the
//! stream as uppercase hex text so message lengths can be expressed in
//! characters, exactly as they appear on hex-text transports.
//!
//! ```text
//! +----+------+-------------------------+----+------+-----
//! | 02 | type | body (fixed or sized)   | 02 | type | ...
//! +----+------+-------------------------+----+------+-----
//! ```

use bytes::{Buf, BytesMut};

/// Initial capacity of the receive buffer (hex characters).
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024;

/// Accumulates received data as uppercase hex characters.
#[derive(Debug, Default)]
pub struct HexBuffer {
    /// Buffered characters, always ASCII `0-9A-F`.
    buffer: BytesMut,
}

impl HexBuffer {
    /// Create a new, empty buffer.
    pub fn new() -> Self {
        HexBuffer {
            buffer: BytesMut::with_capacity(DEFAULT_BUFFER_CAPACITY),
        }
    }

    /// Append raw bytes (serial and TCP transports).
    pub fn push_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(hex::encode_upper(data).as_bytes());
    }

    /// Append hex text (HTTP-polled transports).
    ///
    /// Characters that are not hex digits are dropped and lowercase digits
    /// are normalised to uppercase.
    pub fn push_hex(&mut self, text: &str) {
        for c in text.bytes() {
            if c.is_ascii_hexdigit() {
                self.buffer.extend_from_slice(&[c.to_ascii_uppercase()]);
            }
        }
    }

    /// Number of buffered hex characters.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// The buffered characters.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.buffer).unwrap_or_default()
    }

    /// The first `n` characters, if that many are buffered.
    pub fn peek(&self, n: usize) -> Option<&str> {
        self.as_str().get(..n)
    }

    /// Whether the buffer starts with the given characters.
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.buffer.starts_with(prefix.as_bytes())
    }

    /// Decode the byte whose first hex character is at `offset`.
    pub fn byte_at(&self, offset: usize) -> Option<u8> {
        let pair = self.as_str().get(offset..offset + 2)?;
        u8::from_str_radix(pair, 16).ok()
    }

    /// Remove and return up to `n` characters from the front.
    pub fn consume(&mut self, n: usize) -> String {
        let n = n.min(self.buffer.len());
        let taken = self.buffer.split_to(n);
        String::from_utf8_lossy(&taken).into_owned()
    }

    /// Drop up to `n` characters from the front.
    pub fn skip(&mut self, n: usize) {
        let n = n.min(self.buffer.len());
        self.buffer.advance(n);
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_bytes_encodes_uppercase() {
        let mut buf = HexBuffer::new();
        buf.push_bytes(&[0x02, 0x50, 0xab]);
        assert_eq!(buf.as_str(), "0250AB");
        assert_eq!(buf.len(), 6);
    }

    #[test]
    fn test_push_hex_filters_and_normalises() {
        let mut buf = HexBuffer::new();
        buf.push_hex("02 5a\r\nzz1f");
        assert_eq!(buf.as_str(), "025A1F");
    }

    #[test]
    fn test_consume_never_exceeds_length() {
        let mut buf = HexBuffer::new();
        buf.push_hex("0260");
        assert_eq!(buf.consume(10), "0260");
        assert!(buf.is_empty());
        assert_eq!(buf.consume(2), "");
    }

    #[test]
    fn test_byte_at_and_peek() {
        let mut buf = HexBuffer::new();
        buf.push_hex("02621A2B3C0F");
        assert_eq!(buf.byte_at(10), Some(0x0F));
        assert_eq!(buf.byte_at(12), None);
        assert_eq!(buf.peek(4), Some("0262"));
        assert_eq!(buf.peek(13), None);
    }
}
