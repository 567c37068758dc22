//! Smoothed round-trip-time estimation from ACK samples. Deliberately a
//! simpler EWMA than the full RFC 9002 estimator: peer `max_ack_delay`/
//! handshake-confirmed adjustment is TLS-negotiated state this core
//! treats as an external collaborator.

use crate::time::Timestamp;
use std::time::Duration;

/// `srtt` before any sample has been observed.
const DEFAULT_SMOOTHED_RTT: Duration = Duration::from_millis(100);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RttEstimator {
    smoothed: Duration,
    rttvar: Duration,
    min_rtt: Duration,
    latest: Duration,
    max_observed: Duration,
    has_sample: bool,
}

impl Default for RttEstimator {
    fn default() -> Self {
        Self {
            smoothed: DEFAULT_SMOOTHED_RTT,
            rttvar: Duration::ZERO,
            min_rtt: DEFAULT_SMOOTHED_RTT,
            latest: DEFAULT_SMOOTHED_RTT,
            max_observed: DEFAULT_SMOOTHED_RTT,
            has_sample: false,
        }
    }
}

impl RttEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one ACK-derived RTT sample. `peer_ack_delay` is subtracted from
    /// the raw `now - time_sent` measurement when it does not exceed it;
    /// an oversized ack delay is clamped away rather than allowed to
    /// produce a negative latency.
    pub fn add_sample(&mut self, now: Timestamp, time_sent: Timestamp, peer_ack_delay: Duration) {
        let raw = now.saturating_duration_since(time_sent);
        let latest = if peer_ack_delay <= raw {
            raw - peer_ack_delay
        } else {
            raw
        };
        self.latest = latest;

        if !self.has_sample {
            self.smoothed = latest;
            self.rttvar = latest / 2;
            self.min_rtt = latest;
            self.max_observed = latest;
            self.has_sample = true;
            return;
        }

        self.min_rtt = self.min_rtt.min(latest);
        self.max_observed = self.max_observed.max(latest);

        let deviation = if self.smoothed >= latest {
            self.smoothed - latest
        } else {
            latest - self.smoothed
        };
        self.rttvar = (self.rttvar * 3 + deviation) / 4;
        self.smoothed = (self.smoothed * 7 + latest) / 8;

        // Smoothed RTT never drops below the lowest sample ever observed.
        self.smoothed = self.smoothed.max(self.min_rtt);
    }

    /// Smoothed RTT, millisecond precision.
    pub fn smoothed_rtt(&self) -> Duration {
        self.smoothed
    }

    pub fn min_rtt(&self) -> Duration {
        self.min_rtt
    }

    pub fn rttvar(&self) -> Duration {
        self.rttvar
    }

    pub fn latest_rtt(&self) -> Duration {
        self.latest
    }

    pub fn has_sample(&self) -> bool {
        self.has_sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn ts(millis_from: Instant, millis: u64) -> Timestamp {
        Timestamp::from_instant(millis_from + Duration::from_millis(millis))
    }

    #[test]
    fn defaults_to_100ms_before_any_sample() {
        let estimator = RttEstimator::new();
        assert_eq!(estimator.smoothed_rtt(), Duration::from_millis(100));
        assert!(!estimator.has_sample());
    }

    #[test]
    fn first_sample_sets_smoothed_and_halves_for_variance() {
        let base = Instant::now();
        let mut estimator = RttEstimator::new();
        estimator.add_sample(ts(base, 150), ts(base, 100), Duration::ZERO);
        assert_eq!(estimator.smoothed_rtt(), Duration::from_millis(50));
        assert_eq!(estimator.rttvar(), Duration::from_millis(25));
        assert_eq!(estimator.min_rtt(), Duration::from_millis(50));
    }

    #[test]
    fn ack_delay_larger_than_latency_is_clamped_not_subtracted() {
        let base = Instant::now();
        let mut estimator = RttEstimator::new();
        estimator.add_sample(ts(base, 150), ts(base, 100), Duration::from_secs(10));
        assert_eq!(estimator.latest_rtt(), Duration::from_millis(50));
    }

    #[test]
    fn smoothed_rtt_stays_within_min_and_max_observed() {
        let base = Instant::now();
        let mut estimator = RttEstimator::new();
        let samples = [(100u64, 0u64), (140, 90), (120, 80), (300, 260)];
        for (now, sent) in samples {
            estimator.add_sample(ts(base, now), ts(base, sent), Duration::ZERO);
            assert!(estimator.smoothed_rtt() >= estimator.min_rtt());
            assert!(estimator.smoothed_rtt() <= estimator.max_observed);
        }
    }
}
