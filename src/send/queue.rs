//! The outbound queue feeding the send loop. A `tokio::sync::mpsc` channel
//! rather than a blocking queue plus a dedicated OS thread: a long-lived
//! task `.await`s the channel instead of blocking a thread.

use crate::frame::Frame;
use crate::packet::number::EncryptionLevel;
use crate::packet::QuicPacket;
use tokio::sync::mpsc;

/// Produces one frame given the remaining byte budget in the packet being
/// assembled, or `None` if the request was withdrawn before it could be
/// materialized.
pub type FrameProducer = Box<dyn FnMut(usize) -> Option<Frame> + Send>;

/// Invoked by the loss path (congestion-controller loss signal or crypto
/// retransmission) with the frame that was lost, so the originating buffer
/// can decide how to re-send it. Stored alongside the frame rather than as
/// a weak callback, so it stays alive exactly as long as the record does.
pub type LostFrameCallback = std::sync::Arc<dyn Fn(Frame) + Send + Sync>;

/// A pending request to produce one frame for a given encryption level.
pub struct FrameRequest {
    pub producer: FrameProducer,
    pub min_frame_size: usize,
    pub level: EncryptionLevel,
    pub lost_callback: Option<LostFrameCallback>,
}

/// Either a frame-producer request or an already-assembled packet (used
/// for crypto retransmission copies).
pub enum OutboundRequest {
    Frame(FrameRequest),
    PrebuiltPacket(QuicPacket),
}

impl std::fmt::Debug for OutboundRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            OutboundRequest::Frame(request) => f
                .debug_struct("Frame")
                .field("level", &request.level)
                .field("min_frame_size", &request.min_frame_size)
                .finish(),
            OutboundRequest::PrebuiltPacket(packet) => {
                f.debug_tuple("PrebuiltPacket").field(packet).finish()
            }
        }
    }
}

/// A cloneable handle producers use to enqueue work for the send loop.
#[derive(Clone)]
pub struct OutboundQueue {
    sender: mpsc::UnboundedSender<OutboundRequest>,
}

impl OutboundQueue {
    pub fn send(&self, request: OutboundRequest) {
        // The only receiver is the send loop; once it has shut down,
        // further sends are silently dropped (queued requests fail with
        // `ConnectionClosed` at a higher layer, not here).
        let _ = self.sender.send(request);
    }
}

/// Builds a connected `(OutboundQueue, Receiver)` pair. The receiver is
/// owned by the send loop.
pub fn outbound_channel() -> (OutboundQueue, mpsc::UnboundedReceiver<OutboundRequest>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (OutboundQueue { sender }, receiver)
}

/// Wraps an already-built `Frame` as a one-shot producer request: handed
/// to the send loop once, yields `frame` the first time it is invoked and
/// `None` thereafter. Used by the stream buffers for flow-control updates
/// and lost-frame resends, where the frame's bytes are already fixed and
/// there is nothing left to assemble against the packet budget.
pub fn single_frame_request(
    level: EncryptionLevel,
    frame: Frame,
    lost_callback: Option<LostFrameCallback>,
) -> OutboundRequest {
    let min_frame_size = frame.encoding_size();
    let mut once = Some(frame);
    OutboundRequest::Frame(FrameRequest {
        producer: Box::new(move |_budget| once.take()),
        min_frame_size,
        level,
        lost_callback,
    })
}
