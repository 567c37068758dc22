//! Client-side QUIC send path: packet-number allocation, RTT estimation,
//! a congestion-controller contract, in-flight packet tracking, ACK
//! processing, retransmission scheduling, the send loop itself, and
//! per-stream output/input framing.

pub mod codec;
pub mod config;
pub mod frame;
pub mod packet;
pub mod recovery;
pub mod send;
pub mod stream;
pub mod time;
pub mod transport;
pub mod varint;

pub use config::Configuration;
pub use packet::number::{EncryptionLevel, PacketIdentifier, PacketNumber, PacketNumberAllocator};
pub use packet::QuicPacket;
pub use send::SendLoop;
pub use varint::VarInt;
