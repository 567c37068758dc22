//! The in-memory representation of a QUIC packet assembled by the send
//! loop, plus the on-wire header framing around it.

pub mod number;

use crate::frame::{AckElicitable, AckElicitation, Frame};
use number::{EncryptionLevel, PacketNumber};
use smallvec::SmallVec;

/// Frames destined for the same packet rarely exceed a handful; inline
/// storage for four avoids a heap allocation on the common path.
pub type FrameList = SmallVec<[Frame; 4]>;

/// A packet assembled by the send loop, prior to (and after) protection.
/// `number` is `None` until the send loop allocates one as part of
/// emitting it; retransmissions clear it again so a fresh number is
/// assigned when the copy is re-dequeued.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuicPacket {
    pub level: EncryptionLevel,
    pub number: Option<PacketNumber>,
    pub frames: FrameList,
}

impl QuicPacket {
    pub fn new(level: EncryptionLevel, frames: FrameList) -> Self {
        Self {
            level,
            number: None,
            frames,
        }
    }

    /// A deep copy suitable for retransmission: same frames, same level,
    /// but no packet number assigned yet so the send loop allocates a
    /// fresh one on re-emission (packet numbers are never reused).
    pub fn retransmission_copy(&self) -> Self {
        Self {
            level: self.level,
            number: None,
            frames: self.frames.clone(),
        }
    }

    pub fn is_crypto(&self) -> bool {
        self.frames.iter().any(Frame::is_crypto)
    }

    pub fn is_ack_eliciting(&self) -> bool {
        self.frames
            .iter()
            .fold(AckElicitation::NonEliciting, |acc, frame| {
                acc | frame.ack_elicitation()
            })
            == AckElicitation::Eliciting
    }

    /// Sum of each frame's wire length. Does not include the packet header
    /// (long/short header, packet number encoding, AEAD tag), which the
    /// send loop accounts for separately when budgeting a packet.
    pub fn payload_size(&self) -> usize {
        self.frames.iter().map(Frame::encoding_size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Ack, AckRange, Crypto, Ping};
    use crate::varint::VarInt;

    #[test]
    fn ack_only_packet_is_not_ack_eliciting() {
        let mut frames = FrameList::new();
        frames.push(Frame::Ack(Ack {
            ack_delay: VarInt::ZERO,
            ranges: vec![AckRange { start: 0, end: 0 }],
        }));
        let packet = QuicPacket::new(EncryptionLevel::Initial, frames);
        assert!(!packet.is_ack_eliciting());
        assert!(!packet.is_crypto());
    }

    #[test]
    fn mixed_packet_is_crypto_and_eliciting() {
        let mut frames = FrameList::new();
        frames.push(Frame::Ack(Ack {
            ack_delay: VarInt::ZERO,
            ranges: vec![AckRange { start: 0, end: 0 }],
        }));
        frames.push(Frame::Crypto(Crypto {
            offset: VarInt::ZERO,
            data: vec![1, 2, 3],
        }));
        let packet = QuicPacket::new(EncryptionLevel::Handshake, frames);
        assert!(packet.is_crypto());
        assert!(packet.is_ack_eliciting());
    }

    #[test]
    fn retransmission_copy_clears_packet_number() {
        let mut frames = FrameList::new();
        frames.push(Frame::Ping(Ping));
        let mut packet = QuicPacket::new(EncryptionLevel::Application, frames);
        packet.number = Some(PacketNumber::new(4));
        let copy = packet.retransmission_copy();
        assert!(copy.number.is_none());
        assert_eq!(copy.frames, packet.frames);
    }
}
