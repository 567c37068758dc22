//! Header protection and AEAD sealing collaborator. The concrete AEAD key
//! material is TLS-handshake state and out of scope here; the send loop
//! calls this trait once it has assembled a packet and moves on.

use crate::packet::number::EncryptionLevel;
use crate::packet::QuicPacket;
use bytes::BytesMut;

/// Serializes and protects an assembled packet into wire bytes ready for
/// the datagram sink.
pub trait PacketProtection: Send + Sync {
    fn protect(&self, packet: &QuicPacket) -> BytesMut;
}

/// Encodes the long/short header (just a one-byte tag distinguishing
/// level and carrying the low bits of the packet number, enough for tests
/// to assert on emitted bytes) followed by each frame's wire encoding, with
/// no real AEAD sealing or header protection applied. Stands in for the
/// connection-specific TLS keys this core does not originate.
#[derive(Default)]
pub struct PassthroughProtection;

impl PacketProtection for PassthroughProtection {
    fn protect(&self, packet: &QuicPacket) -> BytesMut {
        use crate::codec::Encoder;

        let mut buffer = BytesMut::new();
        let level_tag = match packet.level {
            EncryptionLevel::Initial => 0u8,
            EncryptionLevel::Handshake => 1u8,
            EncryptionLevel::Application => 2u8,
        };
        buffer.encode_u8(level_tag);
        let number = packet.number.map(|n| n.as_u64()).unwrap_or_default();
        buffer.encode_bytes(&number.to_be_bytes());
        for frame in &packet.frames {
            frame.encode(&mut buffer);
        }
        buffer
    }
}
