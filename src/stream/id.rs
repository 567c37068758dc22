//! Stream identifiers encode initiator and directionality in their two
//! low bits (RFC 9000 §2.1).

use crate::varint::VarInt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Initiator {
    Local,
    Remote,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Directionality {
    Bidirectional,
    Unidirectional,
}

/// A 62-bit stream identifier. Bit 0 selects the initiator (0 = client,
/// 1 = server); bit 1 selects directionality (0 = bidi, 1 = uni).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamId(VarInt);

impl StreamId {
    const TYPE_BITS: u64 = 0x3;

    pub const fn as_varint(self) -> VarInt {
        self.0
    }

    pub const fn from_varint(value: VarInt) -> Self {
        StreamId(value)
    }

    /// The first stream identifier of the given initiator/directionality,
    /// i.e. `nth(initiator, directionality, 0)`.
    pub fn initial(initiator: Initiator, directionality: Directionality) -> Self {
        Self::nth(initiator, directionality, 0).expect("stream id 0 always fits")
    }

    /// The `n`th stream identifier of the given initiator/directionality
    /// (0-indexed): ids of one initiator/directionality class are spaced
    /// four apart.
    pub fn nth(initiator: Initiator, directionality: Directionality, n: u64) -> Option<Self> {
        let type_bits = Self::type_bits(initiator, directionality);
        let value = n.checked_mul(4)?.checked_add(type_bits)?;
        VarInt::new(value).ok().map(StreamId)
    }

    fn type_bits(initiator: Initiator, directionality: Directionality) -> u64 {
        let initiator_bit = match initiator {
            Initiator::Local => 0,
            Initiator::Remote => 1,
        };
        let directionality_bit = match directionality {
            Directionality::Bidirectional => 0,
            Directionality::Unidirectional => 2,
        };
        initiator_bit | directionality_bit
    }

    /// The next stream identifier of this stream's own class.
    pub fn next_of_type(self) -> Option<Self> {
        VarInt::new(self.0.as_u64() + 4).ok().map(StreamId)
    }

    pub fn initiator(self) -> Initiator {
        if self.0.as_u64() & 0x1 == 0 {
            Initiator::Local
        } else {
            Initiator::Remote
        }
    }

    pub fn directionality(self) -> Directionality {
        if self.0.as_u64() & 0x2 == 0 {
            Directionality::Bidirectional
        } else {
            Directionality::Unidirectional
        }
    }
}

impl std::fmt::Display for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_stream_ids_match_class() {
        let client_bidi = StreamId::initial(Initiator::Local, Directionality::Bidirectional);
        let server_bidi = StreamId::initial(Initiator::Remote, Directionality::Bidirectional);
        let client_uni = StreamId::initial(Initiator::Local, Directionality::Unidirectional);
        let server_uni = StreamId::initial(Initiator::Remote, Directionality::Unidirectional);
        assert_eq!(client_bidi.as_varint().as_u64(), 0);
        assert_eq!(server_bidi.as_varint().as_u64(), 1);
        assert_eq!(client_uni.as_varint().as_u64(), 2);
        assert_eq!(server_uni.as_varint().as_u64(), 3);
    }

    #[test]
    fn nth_stream_id_steps_by_four() {
        let id = StreamId::nth(Initiator::Local, Directionality::Bidirectional, 3).unwrap();
        assert_eq!(id.as_varint().as_u64(), 12);
    }

    #[test]
    fn next_of_type_steps_by_four() {
        let id = StreamId::initial(Initiator::Local, Directionality::Bidirectional);
        let next = id.next_of_type().unwrap();
        assert_eq!(next.as_varint().as_u64(), 4);
        assert_eq!(next.initiator(), Initiator::Local);
        assert_eq!(next.directionality(), Directionality::Bidirectional);
    }

    #[test]
    fn initiator_and_directionality_decode_from_low_bits() {
        let id = StreamId::initial(Initiator::Remote, Directionality::Unidirectional);
        assert_eq!(id.initiator(), Initiator::Remote);
        assert_eq!(id.directionality(), Directionality::Unidirectional);
    }
}
