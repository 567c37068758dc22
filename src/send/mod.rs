//! The send path: the outbound request queue, the datagram sink
//! collaborator, packet protection, and the send loop that ties them
//! together.

#[path = "loop_.rs"]
mod send_loop;
pub mod protection;
pub mod queue;
pub mod sink;

pub use protection::{PacketProtection, PassthroughProtection};
pub use queue::{outbound_channel, FrameRequest, OutboundQueue, OutboundRequest};
pub use send_loop::SendLoop;
pub use sink::DatagramSink;
