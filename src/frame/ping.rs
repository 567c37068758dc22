use super::ack_elicitation::{AckElicitable, AckElicitation};
use crate::codec::Encoder;

const TAG: u8 = 0x01;

/// A keepalive/probe frame carrying no payload. Ack-eliciting, unlike a
/// bare ACK frame, so it can force a peer response.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Ping;

impl Ping {
    pub fn tag(&self) -> u8 {
        TAG
    }

    pub fn encoding_size(&self) -> usize {
        1
    }

    pub fn encode<E: Encoder>(&self, buffer: &mut E) {
        buffer.encode_u8(TAG);
    }
}

impl AckElicitable for Ping {
    fn ack_elicitation(&self) -> AckElicitation {
        AckElicitation::Eliciting
    }
}
