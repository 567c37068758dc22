//! Per-stream send-side buffer: queues written bytes, tracks the send
//! cursor and end-of-stream marker, and arms a producer request with the
//! send loop whenever there is something new to emit.

use crate::frame::{Frame, Stream};
use crate::packet::number::EncryptionLevel;
use crate::send::queue::{single_frame_request, FrameRequest, LostFrameCallback, OutboundQueue, OutboundRequest};
use crate::stream::id::StreamId;
use crate::transport::error::StreamError;
use crate::varint::VarInt;
use std::sync::{Arc, Mutex};

struct Inner {
    buffer: Vec<u8>,
    offset: u64,
    closed: bool,
    fin_sent: bool,
    pending: bool,
}

/// Ordered byte queue for one stream's send side. Writers append through
/// `write`; the send loop pulls fully-formed STREAM frames through the
/// producer requests this buffer enqueues on its own.
pub struct StreamOutputBuffer {
    stream_id: StreamId,
    level: EncryptionLevel,
    outbound: OutboundQueue,
    state: Arc<Mutex<Inner>>,
}

impl StreamOutputBuffer {
    pub fn new(stream_id: StreamId, level: EncryptionLevel, outbound: OutboundQueue) -> Self {
        Self {
            stream_id,
            level,
            outbound,
            state: Arc::new(Mutex::new(Inner {
                buffer: Vec::new(),
                offset: 0,
                closed: false,
                fin_sent: false,
                pending: false,
            })),
        }
    }

    /// Appends `data` to the send queue. Fails with `StreamClosed` once
    /// the stream has been closed.
    pub fn write(&self, data: &[u8]) -> Result<(), StreamError> {
        let mut guard = self.state.lock().unwrap();
        if guard.closed {
            return Err(StreamError::StreamClosed);
        }
        guard.buffer.extend_from_slice(data);
        self.arm(&mut guard);
        Ok(())
    }

    /// Marks the end of the stream's send side. Idempotent; arms a final
    /// request if none is pending so a FIN-only frame still goes out even
    /// when no further data was written.
    pub fn close(&self) {
        let mut guard = self.state.lock().unwrap();
        if guard.closed {
            return;
        }
        guard.closed = true;
        self.arm(&mut guard);
    }

    /// No-op: writes are always queued for immediate dispatch.
    pub fn flush(&self) {}

    fn arm(&self, guard: &mut Inner) {
        if guard.pending {
            return;
        }
        guard.pending = true;
        enqueue_request(self.state.clone(), self.outbound.clone(), self.level, self.stream_id);
    }
}

/// Builds and sends one producer request for `stream_id`. Invoked both by
/// `arm` and recursively by the producer itself when more data remains
/// after packing a frame.
fn enqueue_request(
    state: Arc<Mutex<Inner>>,
    outbound: OutboundQueue,
    level: EncryptionLevel,
    stream_id: StreamId,
) {
    let producer_state = state.clone();
    let producer_outbound = outbound.clone();

    let producer: crate::send::queue::FrameProducer = Box::new(move |budget| {
        let mut guard = producer_state.lock().unwrap();

        if guard.buffer.is_empty() && (!guard.closed || guard.fin_sent) {
            guard.pending = false;
            return None;
        }

        let offset = VarInt::new(guard.offset).expect("stream offset exceeds varint range");
        let source_is_final = guard.closed;
        let frame = Stream::try_fit(stream_id, offset, budget, &mut guard.buffer, source_is_final)?;
        guard.offset += frame.data.len() as u64;
        if frame.is_fin {
            guard.fin_sent = true;
        }

        let more_pending = !guard.buffer.is_empty() || (guard.closed && !guard.fin_sent);
        if more_pending {
            drop(guard);
            enqueue_request(producer_state.clone(), producer_outbound.clone(), level, stream_id);
        } else {
            guard.pending = false;
        }

        Some(Frame::Stream(frame))
    });

    let lost_callback: LostFrameCallback = resend_callback(outbound.clone(), level);

    outbound.send(OutboundRequest::Frame(FrameRequest {
        producer,
        min_frame_size: 1,
        level,
        lost_callback: Some(lost_callback),
    }));
}

/// The lost-frame callback re-enqueues the exact same frame (same offset
/// and data) as a fresh, ack-eliciting one-shot request, independent of
/// the stream's current send cursor.
fn resend_callback(outbound: OutboundQueue, level: EncryptionLevel) -> LostFrameCallback {
    Arc::new(move |frame| {
        let resend = resend_callback(outbound.clone(), level);
        outbound.send(single_frame_request(level, frame, Some(resend)));
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::id::{Directionality, Initiator};

    fn setup() -> (
        StreamOutputBuffer,
        tokio::sync::mpsc::UnboundedReceiver<OutboundRequest>,
    ) {
        let (outbound, receiver) = crate::send::queue::outbound_channel();
        let stream_id = StreamId::initial(Initiator::Local, Directionality::Bidirectional);
        let buffer = StreamOutputBuffer::new(stream_id, EncryptionLevel::Application, outbound);
        (buffer, receiver)
    }

    fn produce_next(receiver: &mut tokio::sync::mpsc::UnboundedReceiver<OutboundRequest>) -> Option<Frame> {
        match receiver.try_recv().ok()? {
            OutboundRequest::Frame(mut request) => (request.producer)(1200),
            OutboundRequest::PrebuiltPacket(_) => panic!("unexpected prebuilt packet"),
        }
    }

    #[test]
    fn write_then_close_emits_single_fin_frame() {
        let (buffer, mut receiver) = setup();
        buffer.write(b"0123456789").unwrap();
        buffer.close();

        let frame = produce_next(&mut receiver).expect("a frame was queued");
        match frame {
            Frame::Stream(stream) => {
                assert_eq!(stream.offset, VarInt::ZERO);
                assert_eq!(stream.data, b"0123456789");
                assert!(stream.is_fin);
            }
            other => panic!("expected a Stream frame, got {other:?}"),
        }
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn write_after_close_is_rejected() {
        let (buffer, _receiver) = setup();
        buffer.close();
        let err = buffer.write(b"late").unwrap_err();
        assert_eq!(err, StreamError::StreamClosed);
    }

    #[test]
    fn budget_limited_write_rearms_for_remaining_bytes() {
        let (buffer, mut receiver) = setup();
        buffer.write(&vec![7u8; 100]).unwrap();

        let first = match receiver.try_recv().unwrap() {
            OutboundRequest::Frame(mut request) => (request.producer)(20),
            _ => panic!("expected frame request"),
        };
        let first = match first.expect("first chunk produced") {
            Frame::Stream(stream) => stream,
            other => panic!("expected stream frame, got {other:?}"),
        };
        assert!(!first.is_fin);
        assert!(first.data.len() < 100);

        // The producer re-armed itself for the remaining bytes.
        let second = produce_next(&mut receiver).expect("a follow-up request was queued");
        match second {
            Frame::Stream(stream) => {
                assert_eq!(stream.offset.as_u64(), first.data.len() as u64);
            }
            other => panic!("expected stream frame, got {other:?}"),
        }
    }

    #[test]
    fn lost_frame_is_resent_verbatim() {
        let (outbound, mut receiver) = crate::send::queue::outbound_channel();
        let lost = Frame::Stream(Stream {
            stream_id: StreamId::initial(Initiator::Local, Directionality::Bidirectional),
            offset: VarInt::ZERO,
            is_fin: true,
            data: b"gone".to_vec(),
        });
        let callback = resend_callback(outbound, EncryptionLevel::Application);
        callback(lost.clone());

        let resent = produce_next(&mut receiver).expect("resend was enqueued");
        assert_eq!(resent, lost);
    }
}
