//! The congestion controller contract the send loop consumes. Modeled as
//! a plain object-safe `dyn`-compatible trait rather than an
//! associated-type, event-publisher-threaded one: metrics/event
//! publication is a larger concern out of scope here.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Interface consumed by the send loop's admission check. Implementations
/// own their own synchronization; this core only ever holds an
/// `Arc<dyn CongestionController>`.
pub trait CongestionController: Send + Sync {
    /// `true` iff `bytes_in_flight + bytes <= congestion_window`.
    fn can_send(&self, bytes: usize) -> bool;

    /// Adds `packet_size` to bytes-in-flight. Called once per emitted
    /// packet, immediately after it is handed to the datagram sink.
    fn register_in_flight(&self, packet_size: usize);

    /// Subtracts `packet_size` from bytes-in-flight; may grow the window.
    fn register_acked(&self, packet_size: usize);

    /// Subtracts `packet_size` from bytes-in-flight; may shrink the window.
    fn register_lost(&self, packet_size: usize);

    /// Blocks the caller until `can_send` could plausibly return `true`
    /// (an ack/loss was processed) or `deadline` elapses. A controller
    /// that never releases admission must still honor this with a bounded
    /// wait so the send loop remains interruptible.
    fn wait_for_update<'a>(
        &'a self,
        deadline: Duration,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + 'a>>;

    fn bytes_in_flight(&self) -> usize;

    fn congestion_window(&self) -> usize;
}

struct FixedWindowState {
    congestion_window: usize,
    bytes_in_flight: usize,
}

/// A congestion controller with a fixed window that never grows or
/// shrinks on its own, used by the send-loop admission scenarios.
pub struct FixedWindowController {
    state: Mutex<FixedWindowState>,
    notify: Notify,
}

impl FixedWindowController {
    pub fn new(congestion_window: usize) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FixedWindowState {
                congestion_window,
                bytes_in_flight: 0,
            }),
            notify: Notify::new(),
        })
    }
}

impl CongestionController for FixedWindowController {
    fn can_send(&self, bytes: usize) -> bool {
        let state = self.state.lock().unwrap();
        state.bytes_in_flight + bytes <= state.congestion_window
    }

    fn register_in_flight(&self, packet_size: usize) {
        let mut state = self.state.lock().unwrap();
        state.bytes_in_flight += packet_size;
    }

    fn register_acked(&self, packet_size: usize) {
        let mut state = self.state.lock().unwrap();
        state.bytes_in_flight = state.bytes_in_flight.saturating_sub(packet_size);
        drop(state);
        self.notify.notify_waiters();
    }

    fn register_lost(&self, packet_size: usize) {
        let mut state = self.state.lock().unwrap();
        state.bytes_in_flight = state.bytes_in_flight.saturating_sub(packet_size);
        drop(state);
        self.notify.notify_waiters();
    }

    fn wait_for_update<'a>(
        &'a self,
        deadline: Duration,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            let _ = tokio::time::timeout(deadline, self.notify.notified()).await;
        })
    }

    fn bytes_in_flight(&self) -> usize {
        self.state.lock().unwrap().bytes_in_flight
    }

    fn congestion_window(&self) -> usize {
        self.state.lock().unwrap().congestion_window
    }
}

/// Always admits. Useful for tests and components exercising the send
/// path without a loss-recovery scenario.
pub struct UnlimitedController {
    bytes_in_flight: Mutex<usize>,
}

impl UnlimitedController {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            bytes_in_flight: Mutex::new(0),
        })
    }
}

impl Default for UnlimitedController {
    fn default() -> Self {
        Self {
            bytes_in_flight: Mutex::new(0),
        }
    }
}

impl CongestionController for UnlimitedController {
    fn can_send(&self, _bytes: usize) -> bool {
        true
    }

    fn register_in_flight(&self, packet_size: usize) {
        *self.bytes_in_flight.lock().unwrap() += packet_size;
    }

    fn register_acked(&self, packet_size: usize) {
        let mut guard = self.bytes_in_flight.lock().unwrap();
        *guard = guard.saturating_sub(packet_size);
    }

    fn register_lost(&self, packet_size: usize) {
        let mut guard = self.bytes_in_flight.lock().unwrap();
        *guard = guard.saturating_sub(packet_size);
    }

    fn wait_for_update<'a>(
        &'a self,
        _deadline: Duration,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {})
    }

    fn bytes_in_flight(&self) -> usize {
        *self.bytes_in_flight.lock().unwrap()
    }

    fn congestion_window(&self) -> usize {
        usize::MAX
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_window_admits_until_full() {
        let controller = FixedWindowController::new(1250);
        assert!(controller.can_send(1240));
        controller.register_in_flight(1240);
        assert!(!controller.can_send(1240));
        controller.register_acked(1240);
        assert!(controller.can_send(1240));
    }

    #[test]
    fn unlimited_always_admits() {
        let controller = UnlimitedController::default();
        assert!(controller.can_send(usize::MAX / 2));
    }
}
