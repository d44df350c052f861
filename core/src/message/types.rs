// Mobius wire types — frame layout and protocol constants
//
// Every request and response shares one layout:
//
// ┌───────┬─────────┬────────┬────────────┬──────────┬─────────────┬─────────┬──────────┐
// │ Start │ OpGroup │ OpCode │ Message ID │ Reserved │ Data length │ Data    │ Checksum │
// │ 1 B   │ 1 B     │ 1 B    │ u16 LE     │ u16 BE   │ u16 LE      │ N bytes │ u16 LE   │
// └───────┴─────────┴────────┴────────────┴──────────┴─────────────┴─────────┴──────────┘
//
// The reserved word is the only big-endian field on the wire.

use serde::{Deserialize, Serialize};
use std::fmt;

/// First byte of every frame
pub const START_BYTE: u8 = 0x02;

/// Op group tag carried by requests (C2CI request)
pub const OP_GROUP_REQUEST: u8 = 0xDE;

/// Op group tag carried by confirmations (C2CI confirm)
pub const OP_GROUP_CONFIRM: u8 = 0xDF;

/// Bytes before the data segment
pub const HEADER_SIZE: usize = 9;

/// Trailing checksum size
pub const CHECKSUM_SIZE: usize = 2;

/// Header plus checksum; a frame of this size carries no data
pub const FRAME_OVERHEAD: usize = HEADER_SIZE + CHECKSUM_SIZE;

/// Largest data segment the 16-bit length field can describe
pub const MAX_DATA_LENGTH: usize = u16::MAX as usize;

/// Data segment of an accepted SET confirmation
pub const SUCCESS_PAYLOAD: [u8; 3] = [0x00, 0xFF, 0xFF];

/// First message id used after every successful connect
pub const INITIAL_MESSAGE_ID: u16 = 2;

// Field offsets within a frame
pub(crate) const OFFSET_OP_GROUP: usize = 1;
pub(crate) const OFFSET_OP_CODE: usize = 2;
pub(crate) const OFFSET_MESSAGE_ID: usize = 3;
pub(crate) const OFFSET_RESERVED: usize = 5;
pub(crate) const OFFSET_DATA_LENGTH: usize = 7;

/// Attribute operation carried in the op code byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum OpCode {
    /// GetC2AttrFsciRequest
    Get = 0x17,
    /// SetC2AttrFsciRequest
    Set = 0x18,
}

impl OpCode {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Reserved word the device expects alongside this op code
    pub fn reserved_word(self) -> u16 {
        match self {
            OpCode::Get => 0x0000,
            OpCode::Set => 0x0800,
        }
    }
}

impl TryFrom<u8> for OpCode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x17 => Ok(OpCode::Get),
            0x18 => Ok(OpCode::Set),
            other => Err(other),
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpCode::Get => write!(f, "GET"),
            OpCode::Set => write!(f, "SET"),
        }
    }
}

/// An encoded request, ready to be written to the request characteristic.
///
/// The frame owns its bytes; length and content cannot drift apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFrame {
    bytes: Vec<u8>,
}

impl RequestFrame {
    pub(crate) fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn op_code(&self) -> Option<OpCode> {
        OpCode::try_from(self.bytes[OFFSET_OP_CODE]).ok()
    }

    pub fn message_id(&self) -> u16 {
        u16::from_le_bytes([
            self.bytes[OFFSET_MESSAGE_ID],
            self.bytes[OFFSET_MESSAGE_ID + 1],
        ])
    }

    pub fn reserved(&self) -> u16 {
        u16::from_be_bytes([
            self.bytes[OFFSET_RESERVED],
            self.bytes[OFFSET_RESERVED + 1],
        ])
    }

    /// The attribute selector bytes carried by this request
    pub fn data(&self) -> &[u8] {
        &self.bytes[HEADER_SIZE..self.bytes.len() - CHECKSUM_SIZE]
    }

    pub fn checksum(&self) -> u16 {
        let len = self.bytes.len();
        u16::from_le_bytes([self.bytes[len - 2], self.bytes[len - 1]])
    }
}

impl AsRef<[u8]> for RequestFrame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// How the trailing checksum of a response is treated.
///
/// The confirm path checksum has been seen to disagree with the request
/// algorithm on real devices, so the default is to ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumPolicy {
    #[default]
    Ignore,
    Validate,
}

impl fmt::Display for ChecksumPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChecksumPolicy::Ignore => write!(f, "ignore"),
            ChecksumPolicy::Validate => write!(f, "validate"),
        }
    }
}

impl std::str::FromStr for ChecksumPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ignore" => Ok(ChecksumPolicy::Ignore),
            "validate" => Ok(ChecksumPolicy::Validate),
            other => Err(format!("unknown checksum policy: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_code_reserved_words() {
        assert_eq!(OpCode::Get.reserved_word(), 0x0000);
        assert_eq!(OpCode::Set.reserved_word(), 0x0800);
    }

    #[test]
    fn test_op_code_from_byte() {
        assert_eq!(OpCode::try_from(0x17), Ok(OpCode::Get));
        assert_eq!(OpCode::try_from(0x18), Ok(OpCode::Set));
        assert_eq!(OpCode::try_from(0x19), Err(0x19));
    }

    #[test]
    fn test_checksum_policy_parse() {
        assert_eq!("Validate".parse::<ChecksumPolicy>(), Ok(ChecksumPolicy::Validate));
        assert_eq!("ignore".parse::<ChecksumPolicy>(), Ok(ChecksumPolicy::Ignore));
        assert!("strict".parse::<ChecksumPolicy>().is_err());
    }
}
