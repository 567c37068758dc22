//! The send loop: a dedicated task that dequeues pending work, assembles
//! packets, enforces congestion admission, protects and emits datagrams,
//! and records what it sent.

use crate::config::Configuration;
use crate::packet::number::{EncryptionLevel, PacketIdentifier, PacketNumberAllocator};
use crate::packet::{FrameList, QuicPacket};
use crate::recovery::ack_processor::AckProcessor;
use crate::recovery::congestion::CongestionController;
use crate::recovery::registry::InFlightRegistry;
use crate::recovery::retransmission::RetransmissionScheduler;
use crate::send::protection::PacketProtection;
use crate::send::queue::{FrameRequest, OutboundRequest};
use crate::send::sink::DatagramSink;
use crate::time::Clock;
use crate::transport::error::SendLoopError;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, warn};

/// Conservative estimate of long/short header bytes (version, connection
/// IDs, packet number encoding) reserved out of every packet's budget,
/// separate from the AEAD expansion. The real values are TLS/connection
/// state this core does not originate.
const HEADER_OVERHEAD_ESTIMATE: usize = 32;
/// AES-GCM/ChaCha20-Poly1305 authentication tag size reserved out of
/// every packet's budget.
const AEAD_TAG_SIZE: usize = 16;

pub struct SendLoop {
    receiver: mpsc::UnboundedReceiver<OutboundRequest>,
    pending: VecDeque<OutboundRequest>,
    allocator: Arc<PacketNumberAllocator>,
    congestion: Arc<dyn CongestionController>,
    registry: Arc<InFlightRegistry>,
    ack_processor: Arc<AckProcessor>,
    retransmission: Arc<RetransmissionScheduler>,
    protection: Arc<dyn PacketProtection>,
    sink: Arc<dyn DatagramSink>,
    clock: Arc<dyn Clock>,
    config: Configuration,
    shutdown: Arc<Notify>,
}

#[allow(clippy::too_many_arguments)]
impl SendLoop {
    pub fn new(
        receiver: mpsc::UnboundedReceiver<OutboundRequest>,
        allocator: Arc<PacketNumberAllocator>,
        congestion: Arc<dyn CongestionController>,
        registry: Arc<InFlightRegistry>,
        ack_processor: Arc<AckProcessor>,
        retransmission: Arc<RetransmissionScheduler>,
        protection: Arc<dyn PacketProtection>,
        sink: Arc<dyn DatagramSink>,
        clock: Arc<dyn Clock>,
        config: Configuration,
        shutdown: Arc<Notify>,
    ) -> Self {
        Self {
            receiver,
            pending: VecDeque::new(),
            allocator,
            congestion,
            registry,
            ack_processor,
            retransmission,
            protection,
            sink,
            clock,
            config,
            shutdown,
        }
    }

    fn frame_budget(&self) -> usize {
        (self.config.max_packet_size as usize)
            .saturating_sub(HEADER_OVERHEAD_ESTIMATE)
            .saturating_sub(AEAD_TAG_SIZE)
    }

    /// Runs the send loop until the outbound queue closes, a shutdown is
    /// signalled, or a fatal datagram-sink error occurs.
    pub async fn run(&mut self) -> Result<(), SendLoopError> {
        loop {
            let request = tokio::select! {
                biased;
                _ = self.shutdown.notified() => return Ok(()),
                request = self.next_request() => match request {
                    Some(request) => request,
                    None => return Ok(()),
                },
            };

            let Some(packet) = self.materialize(request).await else {
                continue;
            };
            if packet.frames.is_empty() {
                continue;
            }

            self.send_one(packet).await?;
        }
    }

    /// Pulls from the leftover buffer first, then the channel.
    async fn next_request(&mut self) -> Option<OutboundRequest> {
        if let Some(request) = self.pending.pop_front() {
            return Some(request);
        }
        self.receiver.recv().await
    }

    /// Turns one dequeued request into a fully assembled packet, pulling
    /// further same-level requests off the queue to fill the budget.
    async fn materialize(&mut self, request: OutboundRequest) -> Option<QuicPacket> {
        match request {
            OutboundRequest::PrebuiltPacket(packet) => Some(packet),
            OutboundRequest::Frame(first) => {
                let budget = self.frame_budget();
                let level = first.level;
                let mut frames = FrameList::new();
                let mut remaining = budget;

                if let Some(frame) = Self::produce(first, remaining) {
                    remaining = remaining.saturating_sub(frame.encoding_size());
                    frames.push(frame);
                }

                // Drain any further ready requests at the same level,
                // non-blocking, to pack more frames into this packet.
                // Requests for a different level are stashed back for the
                // next packet rather than dropped.
                loop {
                    let next = match self.receiver.try_recv() {
                        Ok(request) => request,
                        Err(_) => break,
                    };
                    match next {
                        OutboundRequest::PrebuiltPacket(_) => {
                            self.pending.push_back(next);
                            break;
                        }
                        OutboundRequest::Frame(request) if request.level == level => {
                            if request.min_frame_size > remaining {
                                self.pending.push_back(OutboundRequest::Frame(request));
                                break;
                            }
                            if let Some(frame) = Self::produce(request, remaining) {
                                remaining = remaining.saturating_sub(frame.encoding_size());
                                frames.push(frame);
                            }
                        }
                        OutboundRequest::Frame(request) => {
                            self.pending.push_back(OutboundRequest::Frame(request));
                        }
                    }
                }

                if frames.is_empty() {
                    None
                } else {
                    Some(QuicPacket::new(level, frames))
                }
            }
        }
    }

    fn produce(mut request: FrameRequest, budget: usize) -> Option<crate::frame::Frame> {
        (request.producer)(budget)
    }

    async fn send_one(&mut self, mut packet: QuicPacket) -> Result<(), SendLoopError> {
        let size = packet.payload_size() + HEADER_OVERHEAD_ESTIMATE + AEAD_TAG_SIZE;

        while !self.congestion.can_send(size) {
            tokio::select! {
                biased;
                _ = self.shutdown.notified() => return Ok(()),
                _ = self.congestion.wait_for_update(self.config.admission_wait_timeout) => {}
            }
        }

        let level = packet.level;
        let number = self.allocator.next(level);
        packet.number = Some(number);
        let id = PacketIdentifier::new(level, number);

        let bytes = self.protection.protect(&packet);
        if let Err(error) = self.sink.send(&bytes).await {
            warn!(%error, "datagram sink failed, terminating send loop");
            return Err(SendLoopError::DatagramSinkFailure(error));
        }

        let is_crypto = packet.is_crypto();
        let time_sent = self.clock.now();
        debug!(packet_id = %id, size, frames = packet.frames.len(), "packet sent");

        self.congestion.register_in_flight(size);
        self.registry
            .record(id, packet, size, time_sent)
            .expect("packet numbers are allocated monotonically and never reused");

        if is_crypto {
            self.ack_processor.set_handshake_in_flight();
            self.retransmission.schedule(id);
        }

        Ok(())
    }
}
