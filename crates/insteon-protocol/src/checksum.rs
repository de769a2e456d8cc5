//! Integrity checks for extended messages.
//!
//! Extended messages end with one of two trailers:
//!
//! ```text
//! checksum: D14 = (~(cmd1 + cmd2 + D1..D13) + 1) & 0xFF
//! crc:      D13..D14 = crc16(cmd1, cmd2, D1..D12)
//! ```

use crate::constants::USER_DATA_LEN;

/// Two's complement of the byte sum of `cmd1`, `cmd2` and the first 13 data bytes.
pub fn checksum(cmd1: u8, cmd2: u8, data: &[u8]) -> u8 {
    let sum = data
        .iter()
        .take(USER_DATA_LEN - 1)
        .fold(cmd1.wrapping_add(cmd2), |acc, b| acc.wrapping_add(*b));
    (!sum).wrapping_add(1)
}

/// CRC-16 over `cmd1`, `cmd2` and the first 12 data bytes.
///
/// Each byte is shifted in least significant bit first; the feedback bit is
/// the input bit XORed with register bits 15, 14, 12 and 3.
pub fn crc16(cmd1: u8, cmd2: u8, data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    let bytes = [cmd1, cmd2]
        .into_iter()
        .chain(data.iter().take(USER_DATA_LEN - 2).copied());

    for byte in bytes {
        let mut b = byte;
        for _ in 0..8 {
            let mut fb = (b & 0x01) as u16;
            if crc & 0x8000 != 0 {
                fb ^= 1;
            }
            if crc & 0x4000 != 0 {
                fb ^= 1;
            }
            if crc & 0x1000 != 0 {
                fb ^= 1;
            }
            if crc & 0x0008 != 0 {
                fb ^= 1;
            }
            crc = (crc << 1) | fb;
            b >>= 1;
        }
    }
    crc
}

/// Whether the checksum trailer of an extended payload is correct.
pub fn checksum_matches(cmd1: u8, cmd2: u8, data: &[u8; USER_DATA_LEN]) -> bool {
    checksum(cmd1, cmd2, data) == data[USER_DATA_LEN - 1]
}

/// Whether the CRC trailer of an extended payload is correct.
pub fn crc_matches(cmd1: u8, cmd2: u8, data: &[u8; USER_DATA_LEN]) -> bool {
    let crc = crc16(cmd1, cmd2, data);
    crc.to_be_bytes() == [data[USER_DATA_LEN - 2], data[USER_DATA_LEN - 1]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_all_zero() {
        assert_eq!(checksum(0x00, 0x00, &[0u8; 14]), 0x00);
    }

    #[test]
    fn test_checksum_extended_get() {
        let mut data = [0u8; 14];
        data[0] = 0x01;
        assert_eq!(checksum(0x2E, 0x00, &data), 0xD1);
    }

    #[test]
    fn test_checksum_ignores_trailer() {
        let mut data = [0u8; 14];
        data[0] = 0x01;
        data[13] = 0xD1;
        assert_eq!(checksum(0x2E, 0x00, &data), 0xD1);
        assert!(checksum_matches(0x2E, 0x00, &data));
    }

    #[test]
    fn test_crc_reference_values() {
        assert_eq!(crc16(0x00, 0x00, &[0u8; 14]), 0x0000);

        let mut data = [0u8; 14];
        data[0] = 0x01;
        assert_eq!(crc16(0x2E, 0x02, &data), 0x6B75);

        let data = [
            0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x00, 0x00,
        ];
        assert_eq!(crc16(0x6B, 0x0B, &data), 0xA1F6);
    }

    #[test]
    fn test_crc_matches_trailer() {
        let mut data = [0u8; 14];
        data[0] = 0x01;
        data[12] = 0x6B;
        data[13] = 0x75;
        assert!(crc_matches(0x2E, 0x02, &data));
        data[13] = 0x76;
        assert!(!crc_matches(0x2E, 0x02, &data));
    }
}
