// Frame codec — request encoding, response decoding and SET confirmation checks

use super::checksum::{covered_range, stored_checksum, Checksum, MobiusCrc};
use super::types::{
    ChecksumPolicy, OpCode, RequestFrame, CHECKSUM_SIZE, FRAME_OVERHEAD, HEADER_SIZE,
    MAX_DATA_LENGTH, OFFSET_DATA_LENGTH, OFFSET_MESSAGE_ID, OFFSET_OP_CODE, OFFSET_OP_GROUP,
    OP_GROUP_CONFIRM, OP_GROUP_REQUEST, START_BYTE, SUCCESS_PAYLOAD,
};
use crate::MobiusError;

/// Encodes request frames and interprets confirmations.
#[derive(Debug, Clone)]
pub struct FrameCodec<C = MobiusCrc> {
    checksum: C,
    policy: ChecksumPolicy,
}

impl FrameCodec<MobiusCrc> {
    pub fn new(policy: ChecksumPolicy) -> Self {
        Self {
            checksum: MobiusCrc,
            policy,
        }
    }
}

impl Default for FrameCodec<MobiusCrc> {
    fn default() -> Self {
        Self::new(ChecksumPolicy::default())
    }
}

impl<C: Checksum> FrameCodec<C> {
    /// Create a codec with a caller-supplied checksum function
    pub fn with_checksum(checksum: C, policy: ChecksumPolicy) -> Self {
        Self { checksum, policy }
    }

    pub fn policy(&self) -> ChecksumPolicy {
        self.policy
    }

    /// Build a request frame around `selector`.
    ///
    /// The output is fully determined by the inputs. Total length is
    /// `11 + selector.len()`.
    pub fn encode(
        &self,
        selector: &[u8],
        op_code: OpCode,
        reserved: u16,
        message_id: u16,
    ) -> Result<RequestFrame, MobiusError> {
        if selector.len() > MAX_DATA_LENGTH {
            return Err(MobiusError::SelectorTooLong(selector.len()));
        }

        let total = FRAME_OVERHEAD + selector.len();
        let mut bytes = Vec::with_capacity(total);
        bytes.push(START_BYTE);
        bytes.push(OP_GROUP_REQUEST);
        bytes.push(op_code.as_u8());
        bytes.extend_from_slice(&message_id.to_le_bytes());
        bytes.extend_from_slice(&reserved.to_be_bytes());
        bytes.extend_from_slice(&(selector.len() as u16).to_le_bytes());
        bytes.extend_from_slice(selector);

        let crc = self.checksum.checksum(&bytes[1..]);
        bytes.extend_from_slice(&crc.to_le_bytes());

        debug_assert_eq!(bytes.len(), total);
        Ok(RequestFrame::from_bytes(bytes))
    }

    /// Data segment of a structurally valid confirmation.
    ///
    /// Valid means longer than the bare frame overhead, starting with the
    /// start byte and the confirm group, with a data length that fits the
    /// received bytes. The checksum is consulted only under
    /// [`ChecksumPolicy::Validate`].
    pub fn response_data(&self, response: &[u8]) -> Result<Vec<u8>, MobiusError> {
        if response.len() <= FRAME_OVERHEAD
            || response[0] != START_BYTE
            || response[OFFSET_OP_GROUP] != OP_GROUP_CONFIRM
        {
            return Err(MobiusError::MalformedResponse);
        }

        let data_len = data_length(response);
        if HEADER_SIZE + data_len + CHECKSUM_SIZE > response.len() {
            return Err(MobiusError::MalformedResponse);
        }

        if self.policy == ChecksumPolicy::Validate {
            self.check_checksum(response)?;
        }
        Ok(response[HEADER_SIZE..HEADER_SIZE + data_len].to_vec())
    }

    /// Data segment of a response, or `None` when it is not structurally valid.
    ///
    /// Malformed input never panics; it simply yields no data.
    pub fn decode_data(&self, response: &[u8]) -> Option<Vec<u8>> {
        self.response_data(response).ok()
    }

    /// True iff `response` confirms the SET carried by `request`.
    ///
    /// Both frames must exceed the frame overhead, the start bytes must
    /// match, the response must be a confirmation mirroring the request's op
    /// code and message id, and its data must be exactly the success payload.
    pub fn verify_set_success(&self, request: &[u8], response: &[u8]) -> bool {
        if request.len() <= FRAME_OVERHEAD || response.len() <= FRAME_OVERHEAD {
            return false;
        }

        let ids_match = request[0] == response[0]
            && response[OFFSET_OP_GROUP] == OP_GROUP_CONFIRM
            && request[OFFSET_OP_CODE] == response[OFFSET_OP_CODE]
            && request[OFFSET_MESSAGE_ID] == response[OFFSET_MESSAGE_ID]
            && request[OFFSET_MESSAGE_ID + 1] == response[OFFSET_MESSAGE_ID + 1];

        let data_len = data_length(response);
        let data_success = data_len == SUCCESS_PAYLOAD.len()
            && response.get(HEADER_SIZE..HEADER_SIZE + data_len) == Some(&SUCCESS_PAYLOAD[..]);

        let checksum_ok =
            self.policy == ChecksumPolicy::Ignore || self.check_checksum(response).is_ok();

        ids_match && data_success && checksum_ok
    }

    fn check_checksum(&self, frame: &[u8]) -> Result<(), MobiusError> {
        let (covered, actual) = match (covered_range(frame), stored_checksum(frame)) {
            (Some(covered), Some(actual)) => (covered, actual),
            _ => return Err(MobiusError::MalformedResponse),
        };
        let expected = self.checksum.checksum(covered);
        if expected != actual {
            return Err(MobiusError::ChecksumMismatch { expected, actual });
        }
        Ok(())
    }
}

fn data_length(frame: &[u8]) -> usize {
    u16::from_le_bytes([frame[OFFSET_DATA_LENGTH], frame[OFFSET_DATA_LENGTH + 1]]) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::attribute::AttributeSelector;
    use crate::message::checksum::crc16;
    use proptest::prelude::*;

    fn codec() -> FrameCodec {
        FrameCodec::new(ChecksumPolicy::Ignore)
    }

    /// Build a confirmation mirroring `request` with the given data segment
    fn confirm_for(request: &[u8], data: &[u8]) -> Vec<u8> {
        let mut frame = vec![
            START_BYTE,
            OP_GROUP_CONFIRM,
            request[2],
            request[3],
            request[4],
            0x00,
            0x00,
        ];
        frame.extend_from_slice(&(data.len() as u16).to_le_bytes());
        frame.extend_from_slice(data);
        let crc = crc16(&frame[1..]);
        frame.extend_from_slice(&crc.to_le_bytes());
        frame
    }

    #[test]
    fn test_encode_get_layout() {
        let codec = codec();
        let frame = codec
            .encode(&[0x91, 0x01, 0x00, 0x01], OpCode::Get, 0x0000, 2)
            .expect("encode");
        let bytes = frame.as_bytes();

        assert_eq!(bytes.len(), 15);
        assert_eq!(&bytes[..9], &[0x02, 0xDE, 0x17, 0x02, 0x00, 0x00, 0x00, 0x04, 0x00]);
        assert_eq!(&bytes[9..13], &[0x91, 0x01, 0x00, 0x01]);
        assert_eq!(frame.checksum(), crc16(&bytes[1..13]));
    }

    #[test]
    fn test_encode_set_reserved_is_big_endian() {
        let codec = codec();
        let frame = codec
            .encode(&[0x68], OpCode::Set, OpCode::Set.reserved_word(), 0x1234)
            .expect("encode");

        assert_eq!(&frame.as_bytes()[3..7], &[0x34, 0x12, 0x08, 0x00]);
        assert_eq!(frame.reserved(), 0x0800);
        assert_eq!(frame.message_id(), 0x1234);
        assert_eq!(frame.op_code(), Some(OpCode::Set));
    }

    #[test]
    fn test_encode_scene_300() {
        let codec = codec();
        let selector = AttributeSelector::scene(300);
        let frame = codec
            .encode(selector.as_bytes(), OpCode::Set, 0x0800, 2)
            .expect("encode");

        assert_eq!(frame.data()[5], 0x2C);
        assert_eq!(frame.data()[6], 0x01);
    }

    #[test]
    fn test_encode_is_deterministic() {
        let codec = codec();
        let a = codec.encode(&[1, 2, 3], OpCode::Get, 0, 9).expect("encode");
        let b = codec.encode(&[1, 2, 3], OpCode::Get, 0, 9).expect("encode");
        assert_eq!(a, b);
    }

    #[test]
    fn test_encode_rejects_oversized_selector() {
        let codec = codec();
        let selector = vec![0u8; MAX_DATA_LENGTH + 1];
        let result = codec.encode(&selector, OpCode::Get, 0, 2);
        assert_eq!(result, Err(MobiusError::SelectorTooLong(MAX_DATA_LENGTH + 1)));
    }

    #[test]
    fn test_decode_data_from_confirmation() {
        let codec = codec();
        let request = codec.encode(&[0x91, 0x01, 0x00, 0x01], OpCode::Get, 0, 2).expect("encode");
        let data = [0x91, 0x01, 0x00, 0x01, 0x04, 0x02, 0x00];
        let response = confirm_for(request.as_bytes(), &data);

        assert_eq!(codec.decode_data(&response), Some(data.to_vec()));
    }

    #[test]
    fn test_decode_data_rejects_short_and_foreign_frames() {
        let codec = codec();
        assert_eq!(codec.decode_data(&[]), None);
        assert_eq!(codec.decode_data(&[0x02, 0xDF, 0x17, 0, 0, 0, 0, 0, 0, 0, 0]), None);

        // Request group instead of confirm group
        let request = codec.encode(&[1, 2, 3], OpCode::Get, 0, 2).expect("encode");
        assert_eq!(codec.decode_data(request.as_bytes()), None);

        // Wrong start byte
        let mut response = confirm_for(request.as_bytes(), &[1, 2, 3]);
        response[0] = 0x03;
        assert_eq!(codec.decode_data(&response), None);
    }

    #[test]
    fn test_decode_data_rejects_overlong_length_field() {
        let codec = codec();
        let request = codec.encode(&[1, 2, 3], OpCode::Get, 0, 2).expect("encode");
        let mut response = confirm_for(request.as_bytes(), &[1, 2, 3]);
        response[7] = 0xFF;
        assert_eq!(codec.decode_data(&response), None);
    }

    #[test]
    fn test_checksum_ignored_by_default() {
        let codec = codec();
        let request = codec.encode(&[1, 2, 3], OpCode::Get, 0, 2).expect("encode");
        let mut response = confirm_for(request.as_bytes(), &[9, 9]);
        let last = response.len() - 1;
        response[last] ^= 0xFF;

        assert_eq!(codec.decode_data(&response), Some(vec![9, 9]));
    }

    #[test]
    fn test_checksum_validated_when_requested() {
        let codec = FrameCodec::new(ChecksumPolicy::Validate);
        let request = codec.encode(&[1, 2, 3], OpCode::Get, 0, 2).expect("encode");
        let mut response = confirm_for(request.as_bytes(), &[9, 9]);
        assert_eq!(codec.decode_data(&response), Some(vec![9, 9]));

        let last = response.len() - 1;
        response[last] ^= 0xFF;
        assert!(matches!(
            codec.response_data(&response),
            Err(MobiusError::ChecksumMismatch { .. })
        ));
        assert_eq!(codec.decode_data(&response), None);
    }

    #[test]
    fn test_verify_set_success_accepts_confirmation() {
        let codec = codec();
        let request = codec
            .encode(AttributeSelector::scene(5).as_bytes(), OpCode::Set, 0x0800, 7)
            .expect("encode");
        let response = confirm_for(request.as_bytes(), &SUCCESS_PAYLOAD);

        assert!(codec.verify_set_success(request.as_bytes(), &response));
    }

    #[test]
    fn test_verify_set_success_short_response() {
        let codec = codec();
        let request = codec.encode(&[1], OpCode::Set, 0x0800, 2).expect("encode");
        let mut response = confirm_for(request.as_bytes(), &SUCCESS_PAYLOAD);
        response.truncate(FRAME_OVERHEAD);

        assert!(!codec.verify_set_success(request.as_bytes(), &response));
        assert!(!codec.verify_set_success(request.as_bytes(), &[]));
    }

    #[test]
    fn test_verify_set_success_each_marker_byte_matters() {
        let codec = codec();
        let request = codec.encode(&[1, 2], OpCode::Set, 0x0800, 2).expect("encode");
        let response = confirm_for(request.as_bytes(), &SUCCESS_PAYLOAD);

        for offset in HEADER_SIZE..HEADER_SIZE + SUCCESS_PAYLOAD.len() {
            let mut perturbed = response.clone();
            perturbed[offset] ^= 0x01;
            assert!(
                !codec.verify_set_success(request.as_bytes(), &perturbed),
                "perturbing byte {} should fail verification",
                offset
            );
        }
    }

    #[test]
    fn test_verify_set_success_requires_correlation() {
        let codec = codec();
        let request = codec.encode(&[1, 2], OpCode::Set, 0x0800, 0x0102).expect("encode");
        let response = confirm_for(request.as_bytes(), &SUCCESS_PAYLOAD);

        for offset in [0usize, 1, 2, 3, 4] {
            let mut perturbed = response.clone();
            perturbed[offset] ^= 0x40;
            assert!(!codec.verify_set_success(request.as_bytes(), &perturbed));
        }
    }

    #[test]
    fn test_verify_set_success_rejects_extra_data() {
        let codec = codec();
        let request = codec.encode(&[1, 2], OpCode::Set, 0x0800, 2).expect("encode");
        let response = confirm_for(request.as_bytes(), &[0x00, 0xFF, 0xFF, 0x00]);

        assert!(!codec.verify_set_success(request.as_bytes(), &response));
    }

    proptest! {
        #[test]
        fn prop_data_segment_survives_encode(
            selector in proptest::collection::vec(any::<u8>(), 1..64),
            message_id in any::<u16>(),
            reserved in any::<u16>(),
            is_set in any::<bool>(),
        ) {
            let codec = codec();
            let op = if is_set { OpCode::Set } else { OpCode::Get };
            let frame = codec.encode(&selector, op, reserved, message_id).expect("encode");
            prop_assert_eq!(frame.len(), FRAME_OVERHEAD + selector.len());

            // Present the frame as the device's echo
            let mut echoed = frame.into_bytes();
            echoed[OFFSET_OP_GROUP] = OP_GROUP_CONFIRM;
            prop_assert_eq!(codec.decode_data(&echoed), Some(selector));
        }
    }
}
