//! Connection-wide tunables gathered in one place, per the "no global
//! statics for tuning knobs" design note: every component that needs a
//! tunable receives a `&Configuration` at construction rather than reaching
//! for a static.

use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Configuration {
    /// Maximum size of a single emitted datagram, in bytes.
    pub max_packet_size: u16,
    /// Initial receiver flow-control limit granted to each new stream.
    pub initial_max_stream_data: u64,
    /// How long a stream read blocks waiting for data before failing with
    /// `StreamError::ReadTimeout`. `None` means unbounded.
    pub read_timeout: Option<Duration>,
    /// Multiplier applied to smoothed RTT when computing the crypto
    /// retransmission timer: `crypto_retry_base * srtt * 2^failed_retries`.
    pub crypto_retry_base: u32,
    /// Upper bound on how long the send loop waits for the congestion
    /// controller to admit a blocked packet before re-checking.
    pub admission_wait_timeout: Duration,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            max_packet_size: 1500,
            initial_max_stream_data: 1 << 20,
            read_timeout: None,
            crypto_retry_base: 2,
            admission_wait_timeout: Duration::from_secs(1),
        }
    }
}
