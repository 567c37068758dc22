use super::ack_elicitation::{AckElicitable, AckElicitation};
use crate::codec::Encoder;
use crate::transport::error::TransportError;
use crate::varint::VarInt;

const TAG: u8 = 0x1c;

/// Carries a fatal `TransportError` to the peer, closing the connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionClose {
    pub error_code: VarInt,
    pub frame_type: VarInt,
    pub reason: String,
}

impl ConnectionClose {
    pub fn from_transport_error(error: TransportError) -> Self {
        Self {
            error_code: error.code,
            frame_type: error.frame_type.unwrap_or(VarInt::ZERO),
            reason: error.reason.to_string(),
        }
    }

    pub fn tag(&self) -> u8 {
        TAG
    }

    pub fn encoding_size(&self) -> usize {
        1 + self.error_code.encoding_size()
            + self.frame_type.encoding_size()
            + VarInt::new(self.reason.len() as u64)
                .map(|v| v.encoding_size())
                .unwrap_or(2)
            + self.reason.len()
    }

    pub fn encode<E: Encoder>(&self, buffer: &mut E) {
        buffer.encode_u8(TAG);
        buffer.encode_varint(self.error_code);
        buffer.encode_varint(self.frame_type);
        let len =
            VarInt::new(self.reason.len() as u64).expect("connection close reason too long");
        buffer.encode_varint(len);
        buffer.encode_bytes(self.reason.as_bytes());
    }
}

impl AckElicitable for ConnectionClose {
    fn ack_elicitation(&self) -> AckElicitation {
        AckElicitation::Eliciting
    }
}
