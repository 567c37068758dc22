//! Whether a frame obligates the peer to send an ACK in response. A packet
//! is ack-eliciting iff any of its frames are; used to decide whether a
//! lost packet is worth retransmitting (ACK/PADDING-only packets are not).

use core::ops::{BitOr, BitOrAssign};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AckElicitation {
    NonEliciting,
    Eliciting,
}

impl BitOr for AckElicitation {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        if self == AckElicitation::Eliciting || rhs == AckElicitation::Eliciting {
            AckElicitation::Eliciting
        } else {
            AckElicitation::NonEliciting
        }
    }
}

impl BitOrAssign for AckElicitation {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = *self | rhs;
    }
}

pub trait AckElicitable {
    fn ack_elicitation(&self) -> AckElicitation;
}
