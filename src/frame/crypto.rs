use super::ack_elicitation::{AckElicitable, AckElicitation};
use crate::codec::Encoder;
use crate::varint::VarInt;

const TAG: u8 = 0x18;

/// Carries a slice of the TLS handshake byte stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Crypto {
    pub offset: VarInt,
    pub data: Vec<u8>,
}

impl Crypto {
    pub fn tag(&self) -> u8 {
        TAG
    }

    pub fn encoding_size(&self) -> usize {
        1 + self.offset.encoding_size()
            + VarInt::new(self.data.len() as u64)
                .map(|v| v.encoding_size())
                .unwrap_or(8)
            + self.data.len()
    }

    pub fn encode<E: Encoder>(&self, buffer: &mut E) {
        buffer.encode_u8(TAG);
        buffer.encode_varint(self.offset);
        let len = VarInt::new(self.data.len() as u64).expect("crypto frame data too large");
        buffer.encode_varint(len);
        buffer.encode_bytes(&self.data);
    }

    /// Builds the largest Crypto frame that fits within `capacity` bytes of
    /// on-wire budget, draining from `source` starting at `offset`. Reserves
    /// room for a worst-case 2-byte length varint (datagrams never carry
    /// enough payload to need a longer one), then trims if the final length
    /// value happened to need fewer bytes than reserved.
    pub fn try_fit(offset: VarInt, capacity: usize, source: &mut Vec<u8>) -> Option<Self> {
        let header_size = 1 + offset.encoding_size() + 2;
        if capacity <= header_size {
            return None;
        }
        let available = capacity - header_size;
        let take = available.min(source.len());
        if take == 0 {
            return None;
        }
        let data: Vec<u8> = source.drain(..take).collect();
        Some(Crypto { offset, data })
    }
}

impl AckElicitable for Crypto {
    fn ack_elicitation(&self) -> AckElicitation {
        AckElicitation::Eliciting
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn encoding_size_matches_actual_encoded_length() {
        let frame = Crypto {
            offset: VarInt::from_u8(0),
            data: vec![1, 2, 3, 4],
        };
        let mut buffer = BytesMut::new();
        frame.encode(&mut buffer);
        assert_eq!(buffer.len(), frame.encoding_size());
    }
}
