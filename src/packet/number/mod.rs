mod space;

pub use space::EncryptionLevel;

use std::sync::atomic::{AtomicU64, Ordering};

/// Unique within an `EncryptionLevel`, monotonically increasing, never
/// reused: a retransmitted packet's payload is resent under a fresh number.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PacketNumber(u64);

impl PacketNumber {
    pub const fn new(value: u64) -> Self {
        PacketNumber(value)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for PacketNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies a sent packet uniquely across all encryption levels. Ordering
/// is lexicographic on (level, number) and is used only for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PacketIdentifier {
    pub level: EncryptionLevel,
    pub number: PacketNumber,
}

impl PacketIdentifier {
    pub const fn new(level: EncryptionLevel, number: PacketNumber) -> Self {
        Self { level, number }
    }
}

impl std::fmt::Display for PacketIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}:{}", self.level, self.number)
    }
}

/// Hands out gap-free, increasing packet numbers independently per
/// encryption level. One atomic counter per level avoids a lock on the
/// send loop's hottest path.
#[derive(Debug, Default)]
pub struct PacketNumberAllocator {
    initial: AtomicU64,
    handshake: AtomicU64,
    application: AtomicU64,
}

impl PacketNumberAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&self, level: EncryptionLevel) -> &AtomicU64 {
        match level {
            EncryptionLevel::Initial => &self.initial,
            EncryptionLevel::Handshake => &self.handshake,
            EncryptionLevel::Application => &self.application,
        }
    }

    /// Returns the next packet number for `level` and advances the counter.
    pub fn next(&self, level: EncryptionLevel) -> PacketNumber {
        let value = self.counter(level).fetch_add(1, Ordering::Relaxed);
        PacketNumber::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_gap_free_increasing_numbers_per_level() {
        let allocator = PacketNumberAllocator::new();
        assert_eq!(allocator.next(EncryptionLevel::Initial).as_u64(), 0);
        assert_eq!(allocator.next(EncryptionLevel::Initial).as_u64(), 1);
        assert_eq!(allocator.next(EncryptionLevel::Application).as_u64(), 0);
        assert_eq!(allocator.next(EncryptionLevel::Initial).as_u64(), 2);
    }
}
