//! Frame types originated by the send path. Each variant owns its payload
//! (this core never parses attacker-controlled bytes except for ACK, see
//! `codec`); dispatch across frame kinds is a `match`, not a vtable, per
//! the "tagged variant, not polymorphic hierarchy" design note.

pub mod ack;
pub mod ack_elicitation;
pub mod connection_close;
pub mod crypto;
pub mod max_data;
pub mod max_stream_data;
pub mod ping;
pub mod stop_sending;
pub mod stream;

pub use ack::{Ack, AckRange};
pub use ack_elicitation::{AckElicitable, AckElicitation};
pub use connection_close::ConnectionClose;
pub use crypto::Crypto;
pub use max_data::MaxData;
pub use max_stream_data::MaxStreamData;
pub use ping::Ping;
pub use stop_sending::StopSending;
pub use stream::Stream;

use crate::codec::Encoder;

/// Any frame this core can place in an outgoing packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Frame {
    Crypto(Crypto),
    Stream(Stream),
    Ack(Ack),
    MaxData(MaxData),
    MaxStreamData(MaxStreamData),
    StopSending(StopSending),
    Ping(Ping),
    ConnectionClose(ConnectionClose),
}

impl Frame {
    pub fn encode<E: Encoder>(&self, buffer: &mut E) {
        match self {
            Frame::Crypto(frame) => frame.encode(buffer),
            Frame::Stream(frame) => frame.encode(buffer),
            Frame::Ack(frame) => frame.encode(buffer),
            Frame::MaxData(frame) => frame.encode(buffer),
            Frame::MaxStreamData(frame) => frame.encode(buffer),
            Frame::StopSending(frame) => frame.encode(buffer),
            Frame::Ping(frame) => frame.encode(buffer),
            Frame::ConnectionClose(frame) => frame.encode(buffer),
        }
    }

    pub fn encoding_size(&self) -> usize {
        match self {
            Frame::Crypto(frame) => frame.encoding_size(),
            Frame::Stream(frame) => frame.encoding_size(),
            Frame::Ack(frame) => {
                let mut buffer = bytes::BytesMut::new();
                frame.encode(&mut buffer);
                buffer.len()
            }
            Frame::MaxData(frame) => frame.encoding_size(),
            Frame::MaxStreamData(frame) => frame.encoding_size(),
            Frame::StopSending(frame) => frame.encoding_size(),
            Frame::Ping(frame) => frame.encoding_size(),
            Frame::ConnectionClose(frame) => frame.encoding_size(),
        }
    }

    pub const fn is_crypto(&self) -> bool {
        matches!(self, Frame::Crypto(_))
    }
}

impl AckElicitable for Frame {
    fn ack_elicitation(&self) -> AckElicitation {
        match self {
            Frame::Crypto(frame) => frame.ack_elicitation(),
            Frame::Stream(frame) => frame.ack_elicitation(),
            Frame::Ack(frame) => frame.ack_elicitation(),
            Frame::MaxData(frame) => frame.ack_elicitation(),
            Frame::MaxStreamData(frame) => frame.ack_elicitation(),
            Frame::StopSending(frame) => frame.ack_elicitation(),
            Frame::Ping(frame) => frame.ack_elicitation(),
            Frame::ConnectionClose(frame) => frame.ack_elicitation(),
        }
    }
}

impl From<Crypto> for Frame {
    fn from(frame: Crypto) -> Self {
        Frame::Crypto(frame)
    }
}

impl From<Stream> for Frame {
    fn from(frame: Stream) -> Self {
        Frame::Stream(frame)
    }
}

impl From<Ack> for Frame {
    fn from(frame: Ack) -> Self {
        Frame::Ack(frame)
    }
}

impl From<MaxData> for Frame {
    fn from(frame: MaxData) -> Self {
        Frame::MaxData(frame)
    }
}

impl From<MaxStreamData> for Frame {
    fn from(frame: MaxStreamData) -> Self {
        Frame::MaxStreamData(frame)
    }
}

impl From<StopSending> for Frame {
    fn from(frame: StopSending) -> Self {
        Frame::StopSending(frame)
    }
}

impl From<Ping> for Frame {
    fn from(frame: Ping) -> Self {
        Frame::Ping(frame)
    }
}

impl From<ConnectionClose> for Frame {
    fn from(frame: ConnectionClose) -> Self {
        Frame::ConnectionClose(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::varint::VarInt;

    #[test]
    fn crypto_frames_are_reported_as_crypto() {
        let frame: Frame = Crypto {
            offset: VarInt::ZERO,
            data: vec![1],
        }
        .into();
        assert!(frame.is_crypto());
        assert_eq!(frame.ack_elicitation(), AckElicitation::Eliciting);
    }

    #[test]
    fn ack_frames_are_not_crypto_and_not_eliciting() {
        let frame: Frame = Ack {
            ack_delay: VarInt::ZERO,
            ranges: vec![AckRange { start: 0, end: 0 }],
        }
        .into();
        assert!(!frame.is_crypto());
        assert_eq!(frame.ack_elicitation(), AckElicitation::NonEliciting);
    }
}
