//! Per-sent-packet timer that fires if a crypto packet goes unacknowledged.
//! Application-packet loss is delegated to the congestion controller's
//! loss callback and driven by the lost-frame callbacks registered with
//! each outbound request, not by a timer here.
//!
//! One spawned `tokio::time::sleep` task per scheduled crypto packet,
//! since this core runs on a multi-threaded async runtime. Cancellation is
//! by flagging the target record, not by removing the timer entry: a
//! fired timer always re-checks the registry before acting.

use crate::packet::number::{EncryptionLevel, PacketIdentifier};
use crate::recovery::ack_processor::AckProcessor;
use crate::recovery::registry::InFlightRegistry;
use crate::send::queue::{OutboundQueue, OutboundRequest};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub struct RetransmissionScheduler {
    registry: Arc<InFlightRegistry>,
    ack_processor: Arc<AckProcessor>,
    outbound: OutboundQueue,
    crypto_retry_base: u32,
}

impl RetransmissionScheduler {
    pub fn new(
        registry: Arc<InFlightRegistry>,
        ack_processor: Arc<AckProcessor>,
        outbound: OutboundQueue,
        crypto_retry_base: u32,
    ) -> Self {
        Self {
            registry,
            ack_processor,
            outbound,
            crypto_retry_base,
        }
    }

    /// Schedules the crypto retransmission timer for a just-sent packet.
    /// No-op if `id`'s packet does not carry a CRYPTO frame. Spawns a
    /// detached task; the task checks the record's state when it wakes, so
    /// dropping the scheduler does not need to cancel anything explicitly
    /// (an acked/resent record makes the fire a no-op).
    pub fn schedule(&self, id: PacketIdentifier) {
        let Some(record) = self.registry.get(id) else {
            return;
        };
        if !record.packet.is_crypto() {
            return;
        }

        let registry = self.registry.clone();
        let ack_processor = self.ack_processor.clone();
        let outbound = self.outbound.clone();
        let crypto_retry_base = self.crypto_retry_base;

        tokio::spawn(async move {
            loop {
                let srtt = ack_processor.smoothed_rtt();
                let retries = ack_processor.failed_crypto_retries();
                let backoff = 1u32.checked_shl(retries).unwrap_or(u32::MAX);
                let timeout = srtt * crypto_retry_base * backoff;
                tokio::time::sleep(timeout).await;

                let Some(record) = registry.get(id) else {
                    return;
                };
                if !ack_processor.handshake_in_flight() {
                    return;
                }
                if !record.is_pending() {
                    return;
                }
                if !record.packet.is_crypto() {
                    return;
                }

                ack_processor.increment_failed_crypto_retries();
                if registry.mark_resent(id).is_err() {
                    return;
                }

                debug!(packet_id = %id, "retransmit");
                let copy = record.packet.retransmission_copy();
                outbound.send(OutboundRequest::PrebuiltPacket(copy));
                return;
            }
        });
    }
}
