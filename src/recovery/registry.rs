//! Per-(level, packet-number) record of sent packets, sharded by
//! encryption level. Records are value types updated only through
//! registry operations, never handed out as shared mutable references.

use crate::packet::number::{EncryptionLevel, PacketIdentifier, PacketNumber};
use crate::packet::QuicPacket;
use crate::transport::error::RegistryError;
use std::collections::BTreeMap;
use std::sync::Mutex;
use crate::time::Timestamp;

/// A sent packet's fate, tracked until pruned. The "never both acked
/// and resent" invariant is enforced by `mark_acked`/`mark_resent`.
#[derive(Clone, Debug)]
pub struct InFlightRecord {
    pub time_sent: Timestamp,
    pub packet: QuicPacket,
    pub size: usize,
    pub acked: bool,
    pub resent: bool,
}

impl InFlightRecord {
    pub fn is_pending(&self) -> bool {
        !self.acked && !self.resent
    }
}

#[derive(Default)]
struct Shard {
    records: BTreeMap<PacketNumber, InFlightRecord>,
}

/// One shard per `EncryptionLevel`, each behind its own mutex so ACK
/// processing at one level never blocks send-loop recording at another.
pub struct InFlightRegistry {
    initial: Mutex<Shard>,
    handshake: Mutex<Shard>,
    application: Mutex<Shard>,
}

impl Default for InFlightRegistry {
    fn default() -> Self {
        Self {
            initial: Mutex::new(Shard::default()),
            handshake: Mutex::new(Shard::default()),
            application: Mutex::new(Shard::default()),
        }
    }
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn shard(&self, level: EncryptionLevel) -> &Mutex<Shard> {
        match level {
            EncryptionLevel::Initial => &self.initial,
            EncryptionLevel::Handshake => &self.handshake,
            EncryptionLevel::Application => &self.application,
        }
    }

    /// Inserts a freshly sent packet. `packet.number` must already be set
    /// to the identifier's number.
    pub fn record(
        &self,
        id: PacketIdentifier,
        packet: QuicPacket,
        size: usize,
        time_sent: Timestamp,
    ) -> Result<(), RegistryError> {
        debug_assert_eq!(packet.number, Some(id.number));
        let mut shard = self.shard(id.level).lock().unwrap();
        if shard.records.contains_key(&id.number) {
            return Err(RegistryError::DuplicatePacketId);
        }
        shard.records.insert(
            id.number,
            InFlightRecord {
                time_sent,
                packet,
                size,
                acked: false,
                resent: false,
            },
        );
        Ok(())
    }

    /// Marks a record acked, returning a clone of its pre-update state (the
    /// caller needs `time_sent`/`size` for the RTT sample and congestion
    /// notification). Unknown packet numbers are a silent no-op
    /// (spurious or already-forgotten ACK content).
    pub fn mark_acked(&self, id: PacketIdentifier) -> Option<InFlightRecord> {
        let mut shard = self.shard(id.level).lock().unwrap();
        let record = shard.records.get_mut(&id.number)?;
        if record.acked {
            return Some(record.clone());
        }
        record.acked = true;
        Some(record.clone())
    }

    pub fn mark_resent(&self, id: PacketIdentifier) -> Result<InFlightRecord, RegistryError> {
        let mut shard = self.shard(id.level).lock().unwrap();
        let record = shard
            .records
            .get_mut(&id.number)
            .ok_or(RegistryError::InvalidTransition)?;
        if record.acked || record.resent {
            return Err(RegistryError::InvalidTransition);
        }
        record.resent = true;
        Ok(record.clone())
    }

    pub fn get(&self, id: PacketIdentifier) -> Option<InFlightRecord> {
        let shard = self.shard(id.level).lock().unwrap();
        shard.records.get(&id.number).cloned()
    }

    /// `true` iff any crypto-bearing packet at `level` is still pending.
    /// Handshake-in-flight itself is a single flag spanning all levels
    /// (`AckProcessor` ORs this across `EncryptionLevel::all()`), since a
    /// client's Initial and Handshake crypto can be in flight at once.
    pub fn pending_crypto(&self, level: EncryptionLevel) -> bool {
        let shard = self.shard(level).lock().unwrap();
        shard
            .records
            .values()
            .any(|record| record.packet.is_crypto() && record.is_pending())
    }

    /// Ordered snapshot across all levels for diagnostics; ordering is
    /// lexicographic on `(level, number)`.
    pub fn snapshot_sorted(&self) -> Vec<(PacketIdentifier, InFlightRecord)> {
        let mut out = Vec::new();
        for level in EncryptionLevel::all() {
            let shard = self.shard(level).lock().unwrap();
            for (number, record) in shard.records.iter() {
                out.push((PacketIdentifier::new(level, *number), record.clone()));
            }
        }
        out.sort_by_key(|(id, _)| *id);
        out
    }

    /// Drops records in terminal state (acked or resent) at `level`,
    /// bounding memory growth.
    pub fn prune_terminal(&self, level: EncryptionLevel) {
        let mut shard = self.shard(level).lock().unwrap();
        shard.records.retain(|_, record| record.is_pending());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::number::PacketNumber;
    use crate::packet::FrameList;

    fn now() -> Timestamp {
        Timestamp::from_instant(std::time::Instant::now())
    }

    fn packet(level: EncryptionLevel, number: u64) -> (PacketIdentifier, QuicPacket) {
        let id = PacketIdentifier::new(level, PacketNumber::new(number));
        let mut p = QuicPacket::new(level, FrameList::new());
        p.number = Some(id.number);
        (id, p)
    }

    #[test]
    fn duplicate_record_is_rejected() {
        let registry = InFlightRegistry::new();
        let (id, packet) = packet(EncryptionLevel::Application, 0);
        registry.record(id, packet.clone(), 100, now()).unwrap();
        let err = registry.record(id, packet, 100, now()).unwrap_err();
        assert_eq!(err, RegistryError::DuplicatePacketId);
    }

    #[test]
    fn unknown_packet_number_ack_is_noop() {
        let registry = InFlightRegistry::new();
        let id = PacketIdentifier::new(EncryptionLevel::Application, PacketNumber::new(5));
        assert!(registry.mark_acked(id).is_none());
    }

    #[test]
    fn resent_after_acked_is_rejected() {
        let registry = InFlightRegistry::new();
        let (id, packet) = packet(EncryptionLevel::Initial, 0);
        registry.record(id, packet, 10, now()).unwrap();
        registry.mark_acked(id).unwrap();
        let err = registry.mark_resent(id).unwrap_err();
        assert_eq!(err, RegistryError::InvalidTransition);
    }

    #[test]
    fn pending_crypto_tracks_unresolved_crypto_packets() {
        use crate::frame::{Crypto, Frame};
        use crate::varint::VarInt;

        let registry = InFlightRegistry::new();
        let id = PacketIdentifier::new(EncryptionLevel::Handshake, PacketNumber::new(0));
        let mut frames = FrameList::new();
        frames.push(Frame::Crypto(Crypto {
            offset: VarInt::ZERO,
            data: vec![1],
        }));
        let mut p = QuicPacket::new(EncryptionLevel::Handshake, frames);
        p.number = Some(id.number);
        registry.record(id, p, 20, now()).unwrap();
        assert!(registry.pending_crypto(EncryptionLevel::Handshake));
        registry.mark_acked(id).unwrap();
        assert!(!registry.pending_crypto(EncryptionLevel::Handshake));
    }
}
