// Frame checksum — CRC-16 over everything between the start byte and the checksum itself

use crc::{Crc, CRC_16_IBM_3740};

/// CRC-16, poly 0x1021, init 0xFFFF, unreflected, no final xor
const MOBIUS_CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

/// A 16-bit integrity function applied to frames.
pub trait Checksum {
    fn checksum(&self, bytes: &[u8]) -> u16;
}

/// The checksum Mobius devices compute over request frames
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MobiusCrc;

impl Checksum for MobiusCrc {
    fn checksum(&self, bytes: &[u8]) -> u16 {
        crc16(bytes)
    }
}

pub fn crc16(bytes: &[u8]) -> u16 {
    MOBIUS_CRC16.checksum(bytes)
}

/// Byte range of `frame` covered by its checksum: `[1, len - 2)`.
///
/// Returns `None` for frames too short to carry a checksum.
pub fn covered_range(frame: &[u8]) -> Option<&[u8]> {
    if frame.len() < 3 {
        return None;
    }
    Some(&frame[1..frame.len() - 2])
}

/// Checksum stored little-endian in the last two bytes of `frame`
pub fn stored_checksum(frame: &[u8]) -> Option<u16> {
    let len = frame.len();
    if len < 3 {
        return None;
    }
    Some(u16::from_le_bytes([frame[len - 2], frame[len - 1]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc16_check_value() {
        // Standard check input for CRC-16/IBM-3740 (CCITT-FALSE)
        assert_eq!(crc16(b"123456789"), 0x29B1);
    }

    #[test]
    fn test_crc16_empty_is_init() {
        assert_eq!(crc16(&[]), 0xFFFF);
    }

    #[test]
    fn test_covered_range_skips_start_and_checksum() {
        let frame = [0x02, 0xAA, 0xBB, 0xCC, 0x11, 0x22];
        assert_eq!(covered_range(&frame), Some(&[0xAA, 0xBB, 0xCC][..]));
        assert_eq!(stored_checksum(&frame), Some(0x2211));
    }

    #[test]
    fn test_short_frames_have_no_checksum() {
        assert!(covered_range(&[0x02, 0x00]).is_none());
        assert!(stored_checksum(&[0x02]).is_none());
    }
}
