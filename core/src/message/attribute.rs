// Attribute selectors — opaque byte keys naming a remote property

use std::fmt;

/// C2Attribute.CurrentScene (401), SET form; bytes 5..7 carry the scene id
pub const ATTRIBUTE_SCENE: [u8; 9] = [0x91, 0x01, 0x00, 0x01, 0x04, 0xFF, 0xFF, 0x00, 0x00];

/// C2Attribute.CurrentScene (401), GET form
pub const ATTRIBUTE_CURRENT_SCENE: [u8; 4] = [0x91, 0x01, 0x00, 0x01];

/// C2Attribute.OperationState (104); the last byte carries the state tag
pub const ATTRIBUTE_OPERATION_STATE: [u8; 6] = [0x68, 0x00, 0x00, 0x01, 0x01, 0xFF];

/// Operation state tag that puts the device back on its schedule
pub const OPERATION_STATE_SCHEDULE: u8 = 0x03;

/// Scene id of the built-in "feed" scene
pub const FEED_SCENE_ID: u16 = 1;

const SCENE_ID_OFFSET: usize = 5;

/// Data offset of the scene id in a GET reply that carries no selector echo
const FALLBACK_SCENE_OFFSET: usize = 6;

/// An attribute selector as sent in the data segment of a request.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AttributeSelector {
    bytes: Vec<u8>,
}

impl AttributeSelector {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Selector for querying the running scene
    pub fn current_scene() -> Self {
        Self::new(ATTRIBUTE_CURRENT_SCENE)
    }

    /// Selector for switching to `scene_id` (little-endian patch at bytes 5..7)
    pub fn scene(scene_id: u16) -> Self {
        let mut bytes = ATTRIBUTE_SCENE.to_vec();
        bytes[SCENE_ID_OFFSET..SCENE_ID_OFFSET + 2].copy_from_slice(&scene_id.to_le_bytes());
        Self { bytes }
    }

    /// Selector for setting the operation state to `state`
    pub fn operation_state(state: u8) -> Self {
        let mut bytes = ATTRIBUTE_OPERATION_STATE.to_vec();
        if let Some(last) = bytes.last_mut() {
            *last = state;
        }
        Self { bytes }
    }

    pub fn schedule() -> Self {
        Self::operation_state(OPERATION_STATE_SCHEDULE)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl AsRef<[u8]> for AttributeSelector {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for AttributeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttributeSelector({})", hex::encode(&self.bytes))
    }
}

/// Extract the scene id from the data segment of a current-scene GET reply.
///
/// The device echoes the selector followed by a one-byte type tag, then the
/// scene id as a little-endian word. Replies without the echo fall back to
/// the fixed data offsets 6..8.
pub fn decode_scene_id(data: &[u8]) -> Option<u16> {
    let echo = data
        .windows(ATTRIBUTE_CURRENT_SCENE.len())
        .position(|w| w == ATTRIBUTE_CURRENT_SCENE);

    let offset = match echo {
        Some(pos) => pos + ATTRIBUTE_CURRENT_SCENE.len() + 1,
        None => FALLBACK_SCENE_OFFSET,
    };

    let word = data.get(offset..offset + 2)?;
    Some(u16::from_le_bytes([word[0], word[1]]))
}
