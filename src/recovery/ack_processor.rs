//! Consumes ACK frames, updates RTT, drives registry transitions, notifies
//! the congestion controller, and resolves the handshake-in-flight flag.

use crate::frame::Ack;
use crate::packet::number::{EncryptionLevel, PacketIdentifier, PacketNumber};
use crate::recovery::congestion::CongestionController;
use crate::recovery::registry::InFlightRegistry;
use crate::recovery::rtt::RttEstimator;
use crate::time::Timestamp;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Ack-delay scaling applied to the varint on the wire; the decoded value
/// is already in the unscaled domain expected by the RTT estimator at the
/// boundary where ACK frames are parsed (out of scope here) so this
/// processor treats `ack.ack_delay` as already microseconds.
fn ack_delay_as_duration(ack: &Ack) -> Duration {
    Duration::from_micros(ack.ack_delay.as_u64())
}

/// Shared, cross-component state the ACK processor updates: RTT, and the
/// failed-crypto-retry counter shared with the retransmission scheduler.
pub struct AckProcessor {
    rtt: Mutex<RttEstimator>,
    congestion: std::sync::Arc<dyn CongestionController>,
    registry: std::sync::Arc<InFlightRegistry>,
    handshake_in_flight: AtomicBool,
    failed_crypto_retries: AtomicU32,
}

impl AckProcessor {
    pub fn new(
        congestion: std::sync::Arc<dyn CongestionController>,
        registry: std::sync::Arc<InFlightRegistry>,
    ) -> Self {
        Self {
            rtt: Mutex::new(RttEstimator::new()),
            congestion,
            registry,
            handshake_in_flight: AtomicBool::new(false),
            failed_crypto_retries: AtomicU32::new(0),
        }
    }

    pub fn smoothed_rtt(&self) -> Duration {
        self.rtt.lock().unwrap().smoothed_rtt()
    }

    pub fn handshake_in_flight(&self) -> bool {
        self.handshake_in_flight.load(Ordering::Acquire)
    }

    pub fn failed_crypto_retries(&self) -> u32 {
        self.failed_crypto_retries.load(Ordering::Acquire)
    }

    pub fn increment_failed_crypto_retries(&self) -> u32 {
        self.failed_crypto_retries.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Processes one received ACK frame at `level`: feeds an RTT sample,
    /// marks newly-acked packet numbers, notifies the congestion
    /// controller, and recomputes the handshake-in-flight flag.
    pub fn process(&self, ack: &Ack, level: EncryptionLevel, time_received: Timestamp) {
        let Some(largest) = ack.largest_acknowledged() else {
            return;
        };

        // Step 1: RTT sample from the record backing the largest acked pn.
        // A resent (not merely acked) record's RTT is ambiguous — which
        // transmission did the ACK cover? — so it is skipped here.
        let largest_id = PacketIdentifier::new(level, PacketNumber::new(largest));
        if let Some(record) = self.registry.get(largest_id) {
            if !record.resent {
                self.rtt.lock().unwrap().add_sample(
                    time_received,
                    record.time_sent,
                    ack_delay_as_duration(ack),
                );
            }
        }

        // Step 2: mark every newly-acked packet number, notify congestion.
        for pn in ack.packet_numbers() {
            let id = PacketIdentifier::new(level, PacketNumber::new(pn));
            let previous = self.registry.get(id);
            let already_acked = previous.as_ref().map(|r| r.acked).unwrap_or(true);
            if already_acked {
                continue;
            }
            if let Some(record) = self.registry.mark_acked(id) {
                self.congestion.register_acked(record.size);
            }
        }

        // Step 3: recompute handshake-in-flight. The flag is global (set by
        // `set_handshake_in_flight` for a crypto packet at any level), so it
        // must be cleared only once every level's crypto packets have
        // drained, not just the level this ACK happened to cover.
        let still_pending = EncryptionLevel::all()
            .iter()
            .any(|&l| self.registry.pending_crypto(l));
        let was_in_flight = self.handshake_in_flight.swap(still_pending, Ordering::AcqRel);
        if was_in_flight && !still_pending {
            self.failed_crypto_retries.store(0, Ordering::Release);
        }
    }

    /// Marks the handshake-in-flight flag directly; called by the send
    /// loop when it emits a crypto-bearing packet.
    pub fn set_handshake_in_flight(&self) {
        self.handshake_in_flight.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::AckRange;
    use crate::packet::FrameList;
    use crate::packet::QuicPacket;
    use crate::recovery::congestion::UnlimitedController;
    use crate::varint::VarInt;
    use std::sync::Arc;
    use std::time::Instant;

    fn ts(base: Instant, millis: u64) -> Timestamp {
        Timestamp::from_instant(base + Duration::from_millis(millis))
    }

    fn record_packet(
        registry: &InFlightRegistry,
        level: EncryptionLevel,
        number: u64,
        time_sent: Timestamp,
        size: usize,
    ) -> PacketIdentifier {
        let id = PacketIdentifier::new(level, PacketNumber::new(number));
        let mut packet = QuicPacket::new(level, FrameList::new());
        packet.number = Some(id.number);
        registry.record(id, packet, size, time_sent).unwrap();
        id
    }

    #[test]
    fn acking_a_known_packet_notifies_congestion_and_feeds_rtt() {
        let base = Instant::now();
        let registry = Arc::new(InFlightRegistry::new());
        let congestion = UnlimitedController::new();
        let processor = AckProcessor::new(congestion.clone(), registry.clone());
        record_packet(
            &registry,
            EncryptionLevel::Application,
            0,
            ts(base, 10),
            1200,
        );
        congestion.register_in_flight(1200);

        let ack = Ack {
            ack_delay: VarInt::ZERO,
            ranges: vec![AckRange { start: 0, end: 0 }],
        };
        processor.process(&ack, EncryptionLevel::Application, ts(base, 60));

        assert_eq!(congestion.bytes_in_flight(), 0);
        assert!(processor.smoothed_rtt() > Duration::ZERO);
    }

    #[test]
    fn unknown_packet_number_is_ignored() {
        let base = Instant::now();
        let registry = Arc::new(InFlightRegistry::new());
        let congestion = UnlimitedController::new();
        let processor = AckProcessor::new(congestion, registry);
        let ack = Ack {
            ack_delay: VarInt::ZERO,
            ranges: vec![AckRange { start: 99, end: 99 }],
        };
        // Must not panic even though nothing was ever recorded.
        processor.process(&ack, EncryptionLevel::Application, ts(base, 1));
    }

    #[test]
    fn applying_same_ack_twice_is_idempotent() {
        let base = Instant::now();
        let registry = Arc::new(InFlightRegistry::new());
        let congestion = UnlimitedController::new();
        let processor = AckProcessor::new(congestion.clone(), registry.clone());
        record_packet(
            &registry,
            EncryptionLevel::Application,
            0,
            ts(base, 10),
            1200,
        );
        congestion.register_in_flight(1200);
        let ack = Ack {
            ack_delay: VarInt::ZERO,
            ranges: vec![AckRange { start: 0, end: 0 }],
        };
        processor.process(&ack, EncryptionLevel::Application, ts(base, 60));
        let after_first = congestion.bytes_in_flight();
        processor.process(&ack, EncryptionLevel::Application, ts(base, 70));
        assert_eq!(congestion.bytes_in_flight(), after_first);
    }

    #[test]
    fn handshake_in_flight_clears_and_resets_retry_counter_on_full_ack() {
        let base = Instant::now();
        let registry = Arc::new(InFlightRegistry::new());
        let congestion = UnlimitedController::new();
        let processor = AckProcessor::new(congestion, registry.clone());

        use crate::frame::{Crypto, Frame};
        let crypto_id = PacketIdentifier::new(EncryptionLevel::Handshake, PacketNumber::new(1));
        let mut frames = FrameList::new();
        frames.push(Frame::Crypto(Crypto {
            offset: VarInt::ZERO,
            data: vec![9],
        }));
        let mut packet = QuicPacket::new(EncryptionLevel::Handshake, frames);
        packet.number = Some(crypto_id.number);
        registry
            .record(crypto_id, packet, 40, ts(base, 0))
            .unwrap();
        processor.set_handshake_in_flight();
        processor.increment_failed_crypto_retries();
        assert!(processor.handshake_in_flight());

        let ack = Ack {
            ack_delay: VarInt::ZERO,
            ranges: vec![AckRange { start: 1, end: 1 }],
        };
        processor.process(&ack, EncryptionLevel::Handshake, ts(base, 5));
        assert!(!processor.handshake_in_flight());
        assert_eq!(processor.failed_crypto_retries(), 0);
    }

    #[test]
    fn handshake_in_flight_stays_set_while_another_level_still_has_crypto_pending() {
        let base = Instant::now();
        let registry = Arc::new(InFlightRegistry::new());
        let congestion = UnlimitedController::new();
        let processor = AckProcessor::new(congestion, registry.clone());

        use crate::frame::{Crypto, Frame};
        let make_crypto_packet = |level| {
            let mut frames = FrameList::new();
            frames.push(Frame::Crypto(Crypto {
                offset: VarInt::ZERO,
                data: vec![9],
            }));
            QuicPacket::new(level, frames)
        };

        let initial_id = PacketIdentifier::new(EncryptionLevel::Initial, PacketNumber::new(0));
        let mut initial_packet = make_crypto_packet(EncryptionLevel::Initial);
        initial_packet.number = Some(initial_id.number);
        registry
            .record(initial_id, initial_packet, 40, ts(base, 0))
            .unwrap();

        let handshake_id = PacketIdentifier::new(EncryptionLevel::Handshake, PacketNumber::new(0));
        let mut handshake_packet = make_crypto_packet(EncryptionLevel::Handshake);
        handshake_packet.number = Some(handshake_id.number);
        registry
            .record(handshake_id, handshake_packet, 40, ts(base, 0))
            .unwrap();

        processor.set_handshake_in_flight();
        assert!(processor.handshake_in_flight());

        // Acking the Handshake crypto must not clear the flag while the
        // Initial crypto packet is still unacked and unresent.
        let ack = Ack {
            ack_delay: VarInt::ZERO,
            ranges: vec![AckRange { start: 0, end: 0 }],
        };
        processor.process(&ack, EncryptionLevel::Handshake, ts(base, 5));
        assert!(processor.handshake_in_flight());

        // Now ack the Initial crypto too; the flag should finally clear.
        processor.process(&ack, EncryptionLevel::Initial, ts(base, 6));
        assert!(!processor.handshake_in_flight());
    }
}
