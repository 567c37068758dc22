//! Connection-fatal errors signalled to the peer in a CONNECTION_CLOSE
//! frame. Plain struct-plus-`Display` rather than a derive-macro error
//! crate.

use crate::codec::DecoderError;
use crate::varint::{VarInt, VarIntError};
use core::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct TransportError {
    pub code: VarInt,
    pub frame_type: Option<VarInt>,
    pub reason: &'static str,
}

impl TransportError {
    pub const fn new(code: VarInt, reason: &'static str, frame_type: Option<VarInt>) -> Self {
        Self {
            code,
            reason,
            frame_type,
        }
    }

    pub const fn with_frame_type(mut self, frame_type: VarInt) -> Self {
        self.frame_type = Some(frame_type);
        self
    }

    pub const fn with_reason(mut self, reason: &'static str) -> Self {
        self.reason = reason;
        self
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.reason.is_empty() {
            write!(f, "TransportError({})", self.code.as_u64())
        } else {
            f.write_str(self.reason)
        }
    }
}

impl std::error::Error for TransportError {}

macro_rules! def_error {
    ($doc:expr, $name:ident, $code:expr) => {
        impl TransportError {
            #[doc = $doc]
            pub const $name: VarInt = VarInt::from_u32($code);
        }
    };
}

def_error!(
    "The connection is being closed abruptly in the absence of any error.",
    NO_ERROR,
    0x0
);
def_error!(
    "An internal error was encountered and the connection cannot continue.",
    INTERNAL_ERROR,
    0x1
);
def_error!(
    "An endpoint received more data than it permitted in its advertised data limits.",
    FLOW_CONTROL_ERROR,
    0x3
);
def_error!(
    "An endpoint received a frame for a stream that was not in a state that permitted that frame.",
    STREAM_STATE_ERROR,
    0x5
);
def_error!(
    "An endpoint received a frame that was badly formatted.",
    FRAME_ENCODING_ERROR,
    0x7
);
def_error!(
    "An error with protocol compliance was detected that was not covered by a more specific error code.",
    PROTOCOL_VIOLATION,
    0xA
);

impl From<DecoderError> for TransportError {
    fn from(error: DecoderError) -> Self {
        match error {
            DecoderError::InvariantViolation(reason) => {
                Self::new(Self::PROTOCOL_VIOLATION, reason, None)
            }
            DecoderError::UnexpectedEof => {
                Self::new(Self::FRAME_ENCODING_ERROR, "unexpected end of buffer", None)
            }
        }
    }
}

impl From<VarIntError> for TransportError {
    fn from(_: VarIntError) -> Self {
        Self::new(Self::INTERNAL_ERROR, "varint encoding limit exceeded", None)
    }
}

/// Errors raised by the in-flight registry. These indicate a programming
/// invariant was violated, never something a peer caused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegistryError {
    DuplicatePacketId,
    InvalidTransition,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RegistryError::DuplicatePacketId => write!(f, "packet identifier already recorded"),
            RegistryError::InvalidTransition => {
                write!(f, "invalid in-flight record state transition")
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// Errors surfaced to stream readers/writers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamError {
    /// A write was attempted after the stream's send side was closed.
    StreamClosed,
    /// A read was attempted on a stream that was reset by the peer.
    StreamAborted,
    /// A blocking read exceeded its configured timeout.
    ReadTimeout,
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StreamError::StreamClosed => write!(f, "stream is closed for writing"),
            StreamError::StreamAborted => write!(f, "stream was aborted"),
            StreamError::ReadTimeout => write!(f, "read timed out"),
        }
    }
}

impl std::error::Error for StreamError {}

/// Fatal errors terminating the send loop.
#[derive(Debug)]
pub enum SendLoopError {
    DatagramSinkFailure(std::io::Error),
    ConnectionClosed,
}

impl fmt::Display for SendLoopError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SendLoopError::DatagramSinkFailure(err) => write!(f, "datagram sink failed: {err}"),
            SendLoopError::ConnectionClosed => write!(f, "connection is closed"),
        }
    }
}

impl std::error::Error for SendLoopError {}
