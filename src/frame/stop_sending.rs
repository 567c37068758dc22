use super::ack_elicitation::{AckElicitable, AckElicitation};
use crate::codec::Encoder;
use crate::stream::id::StreamId;

const TAG: u8 = 0x0c;

/// Requests that the peer stop sending data on a stream we are reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StopSending {
    pub stream_id: StreamId,
    pub error_code: u16,
}

impl StopSending {
    pub fn tag(&self) -> u8 {
        TAG
    }

    pub fn encoding_size(&self) -> usize {
        1 + self.stream_id.as_varint().encoding_size() + 2
    }

    pub fn encode<E: Encoder>(&self, buffer: &mut E) {
        buffer.encode_u8(TAG);
        buffer.encode_varint(self.stream_id.as_varint());
        buffer.encode_u16(self.error_code);
    }
}

impl AckElicitable for StopSending {
    fn ack_elicitation(&self) -> AckElicitation {
        AckElicitation::Eliciting
    }
}
