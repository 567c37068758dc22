//! Loss recovery: RTT estimation, the congestion controller contract, the
//! in-flight packet registry, ACK processing, and crypto retransmission.

pub mod ack_processor;
pub mod congestion;
pub mod registry;
pub mod retransmission;
pub mod rtt;

pub use ack_processor::AckProcessor;
pub use congestion::{CongestionController, FixedWindowController, UnlimitedController};
pub use registry::{InFlightRecord, InFlightRegistry};
pub use retransmission::RetransmissionScheduler;
pub use rtt::RttEstimator;
