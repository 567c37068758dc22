use super::ack_elicitation::{AckElicitable, AckElicitation};
use crate::codec::Encoder;
use crate::stream::id::StreamId;
use crate::varint::VarInt;

const STREAM_TAG: u8 = 0x08;
const OFF_BIT: u8 = 0x04;
const LEN_BIT: u8 = 0x02;
const FIN_BIT: u8 = 0x01;

/// Application data addressed to a stream at a byte offset, optionally
/// marking the end of that stream's send side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stream {
    pub stream_id: StreamId,
    pub offset: VarInt,
    pub is_fin: bool,
    pub data: Vec<u8>,
}

impl Stream {
    pub fn tag(&self) -> u8 {
        let mut tag = STREAM_TAG | LEN_BIT;
        if self.offset.as_u64() != 0 {
            tag |= OFF_BIT;
        }
        if self.is_fin {
            tag |= FIN_BIT;
        }
        tag
    }

    pub fn encoding_size(&self) -> usize {
        let mut size = 1 + self.stream_id.as_varint().encoding_size();
        if self.offset.as_u64() != 0 {
            size += self.offset.encoding_size();
        }
        size += VarInt::new(self.data.len() as u64)
            .map(|v| v.encoding_size())
            .unwrap_or(2);
        size + self.data.len()
    }

    pub fn encode<E: Encoder>(&self, buffer: &mut E) {
        buffer.encode_u8(self.tag());
        buffer.encode_varint(self.stream_id.as_varint());
        if self.offset.as_u64() != 0 {
            buffer.encode_varint(self.offset);
        }
        let len = VarInt::new(self.data.len() as u64).expect("stream frame data too large");
        buffer.encode_varint(len);
        buffer.encode_bytes(&self.data);
    }

    /// Builds the largest Stream frame fitting within `capacity` bytes,
    /// draining bytes from `source`. Marks `is_fin` when `source_is_final`
    /// and the whole remaining buffer was consumed.
    pub fn try_fit(
        stream_id: StreamId,
        offset: VarInt,
        capacity: usize,
        source: &mut Vec<u8>,
        source_is_final: bool,
    ) -> Option<Self> {
        let mut header_size = 1 + stream_id.as_varint().encoding_size() + 2;
        if offset.as_u64() != 0 {
            header_size += offset.encoding_size();
        }
        if capacity <= header_size {
            return None;
        }
        let available = capacity - header_size;
        let take = available.min(source.len());
        if take == 0 && !(source_is_final && source.is_empty()) {
            return None;
        }
        let data: Vec<u8> = source.drain(..take).collect();
        let is_fin = source_is_final && source.is_empty();
        Some(Stream {
            stream_id,
            offset,
            is_fin,
            data,
        })
    }
}

impl AckElicitable for Stream {
    fn ack_elicitation(&self) -> AckElicitation {
        AckElicitation::Eliciting
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::id::{Directionality, Initiator};
    use bytes::BytesMut;

    #[test]
    fn marks_fin_when_source_drained_to_empty() {
        let stream_id = StreamId::initial(Initiator::Local, Directionality::Bidirectional);
        let mut source = b"hello".to_vec();
        let frame = Stream::try_fit(stream_id, VarInt::ZERO, 100, &mut source, true).unwrap();
        assert!(frame.is_fin);
        assert_eq!(frame.data, b"hello");
        assert!(source.is_empty());
    }

    #[test]
    fn respects_budget() {
        let stream_id = StreamId::initial(Initiator::Local, Directionality::Bidirectional);
        let mut source = vec![0u8; 1000];
        let header_budget = 1 + stream_id.as_varint().encoding_size() + 2;
        let frame = Stream::try_fit(
            stream_id,
            VarInt::ZERO,
            header_budget + 10,
            &mut source,
            false,
        )
        .unwrap();
        assert_eq!(frame.data.len(), 10);
        assert!(!frame.is_fin);
        assert_eq!(source.len(), 990);
    }

    #[test]
    fn encoding_size_matches_actual_encoded_length() {
        let stream_id = StreamId::initial(Initiator::Local, Directionality::Bidirectional);
        let frame = Stream {
            stream_id,
            offset: VarInt::from_u8(5),
            is_fin: true,
            data: vec![9, 9, 9],
        };
        let mut buffer = BytesMut::new();
        frame.encode(&mut buffer);
        assert_eq!(buffer.len(), frame.encoding_size());
    }
}
