//! Per-stream send and receive buffers built on top of `StreamId`.

pub mod id;
pub mod input;
pub mod output;

pub use id::{Directionality, Initiator, StreamId};
pub use input::{ConnectionFlowControl, ReadOutcome, StreamInputBuffer};
pub use output::StreamOutputBuffer;
