// Message module — Mobius wire format

pub mod attribute;
pub mod checksum;
pub mod codec;
pub mod types;

pub use attribute::{
    decode_scene_id, AttributeSelector, ATTRIBUTE_CURRENT_SCENE, ATTRIBUTE_OPERATION_STATE,
    ATTRIBUTE_SCENE, FEED_SCENE_ID, OPERATION_STATE_SCHEDULE,
};
pub use checksum::{crc16, Checksum, MobiusCrc};
pub use codec::FrameCodec;
pub use types::{
    ChecksumPolicy, OpCode, RequestFrame, FRAME_OVERHEAD, HEADER_SIZE, INITIAL_MESSAGE_ID,
    OP_GROUP_CONFIRM, OP_GROUP_REQUEST, START_BYTE, SUCCESS_PAYLOAD,
};
