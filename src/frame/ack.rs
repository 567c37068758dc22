use super::ack_elicitation::{AckElicitable, AckElicitation};
use crate::codec::{Decoder, DecoderError, Encoder};
use crate::varint::VarInt;

const ACK_TAG: u8 = 0x02;

/// An inclusive range of acknowledged packet numbers, `start..=end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AckRange {
    pub start: u64,
    pub end: u64,
}

/// Acknowledges one or more packet-number ranges within a single
/// encryption level's packet-number space. Ranges are stored largest-first,
/// matching their order on the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ack {
    pub ack_delay: VarInt,
    pub ranges: Vec<AckRange>,
}

impl Ack {
    pub fn tag(&self) -> u8 {
        ACK_TAG
    }

    pub fn largest_acknowledged(&self) -> Option<u64> {
        self.ranges.first().map(|r| r.end)
    }

    /// Iterates every packet number covered by this ACK's ranges, largest
    /// first.
    pub fn packet_numbers(&self) -> impl Iterator<Item = u64> + '_ {
        self.ranges.iter().flat_map(|r| (r.start..=r.end).rev())
    }

    pub fn encode<E: Encoder>(&self, buffer: &mut E) {
        buffer.encode_u8(ACK_TAG);
        let largest = self.largest_acknowledged().unwrap_or(0);
        buffer.encode_varint(VarInt::new(largest).unwrap_or(VarInt::ZERO));
        buffer.encode_varint(self.ack_delay);
        let range_count = self.ranges.len().saturating_sub(1) as u64;
        buffer.encode_varint(VarInt::new(range_count).unwrap_or(VarInt::ZERO));
        if let Some(first) = self.ranges.first() {
            let first_len = first.end - first.start;
            buffer.encode_varint(VarInt::new(first_len).unwrap_or(VarInt::ZERO));
            let mut previous_start = first.start;
            for range in &self.ranges[1..] {
                let gap = previous_start - range.end - 2;
                let len = range.end - range.start;
                buffer.encode_varint(VarInt::new(gap).unwrap_or(VarInt::ZERO));
                buffer.encode_varint(VarInt::new(len).unwrap_or(VarInt::ZERO));
                previous_start = range.start;
            }
        } else {
            buffer.encode_varint(VarInt::ZERO);
        }
    }

    pub fn decode(decoder: &mut Decoder) -> Result<Self, DecoderError> {
        let largest = decoder.decode_varint()?.as_u64();
        let ack_delay = decoder.decode_varint()?;
        let range_count = decoder.decode_varint()?.as_u64();
        let first_range_len = decoder.decode_varint()?.as_u64();
        let mut ranges = Vec::with_capacity(range_count as usize + 1);
        let first_start = largest
            .checked_sub(first_range_len)
            .ok_or(DecoderError::InvariantViolation("ack range underflows packet number"))?;
        ranges.push(AckRange {
            start: first_start,
            end: largest,
        });
        let mut previous_smallest = first_start;
        for _ in 0..range_count {
            let gap = decoder.decode_varint()?.as_u64();
            let len = decoder.decode_varint()?.as_u64();
            let end = previous_smallest
                .checked_sub(gap + 2)
                .ok_or(DecoderError::InvariantViolation("ack gap underflows packet number"))?;
            let start = end
                .checked_sub(len)
                .ok_or(DecoderError::InvariantViolation("ack range underflows packet number"))?;
            ranges.push(AckRange { start, end });
            previous_smallest = start;
        }
        Ok(Ack { ack_delay, ranges })
    }
}

impl AckElicitable for Ack {
    fn ack_elicitation(&self) -> AckElicitation {
        AckElicitation::NonEliciting
    }
}
