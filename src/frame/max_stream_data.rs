use super::ack_elicitation::{AckElicitable, AckElicitation};
use crate::codec::Encoder;
use crate::stream::id::StreamId;
use crate::varint::VarInt;

const TAG: u8 = 0x11;

/// Informs the peer of an increased receive-side flow-control limit for a
/// single stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaxStreamData {
    pub stream_id: StreamId,
    pub maximum_stream_data: VarInt,
}

impl MaxStreamData {
    pub fn tag(&self) -> u8 {
        TAG
    }

    pub fn encoding_size(&self) -> usize {
        1 + self.stream_id.as_varint().encoding_size() + self.maximum_stream_data.encoding_size()
    }

    pub fn encode<E: Encoder>(&self, buffer: &mut E) {
        buffer.encode_u8(TAG);
        buffer.encode_varint(self.stream_id.as_varint());
        buffer.encode_varint(self.maximum_stream_data);
    }
}

impl AckElicitable for MaxStreamData {
    fn ack_elicitation(&self) -> AckElicitation {
        AckElicitation::Eliciting
    }
}
