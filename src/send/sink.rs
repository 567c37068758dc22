//! The datagram sink collaborator: an abstract stand-in for UDP socket I/O.
//! Modeled as a trait returning a boxed future, the same pattern used by
//! `CongestionController::wait_for_update`, so a real UDP socket can be
//! plugged in without blocking the runtime and without pulling in an
//! `async_trait` dependency.

use std::io;
use std::pin::Pin;
use std::sync::Mutex;

pub trait DatagramSink: Send + Sync {
    fn send<'a>(
        &'a self,
        datagram: &'a [u8],
    ) -> Pin<Box<dyn std::future::Future<Output = io::Result<()>> + Send + 'a>>;
}

/// Collects every emitted datagram in memory, for tests driving the send
/// loop end to end and asserting on emission counts and contents.
#[derive(Default)]
pub struct CollectingSink {
    datagrams: Mutex<Vec<Vec<u8>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn datagrams(&self) -> Vec<Vec<u8>> {
        self.datagrams.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.datagrams.lock().unwrap().len()
    }
}

impl DatagramSink for CollectingSink {
    fn send<'a>(
        &'a self,
        datagram: &'a [u8],
    ) -> Pin<Box<dyn std::future::Future<Output = io::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.datagrams.lock().unwrap().push(datagram.to_vec());
            Ok(())
        })
    }
}

/// A sink whose `send` always fails, for exercising the send loop's fatal
/// I/O-error path.
#[derive(Default)]
pub struct FailingSink;

impl DatagramSink for FailingSink {
    fn send<'a>(
        &'a self,
        _datagram: &'a [u8],
    ) -> Pin<Box<dyn std::future::Future<Output = io::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            Err(io::Error::new(
                io::ErrorKind::Other,
                "simulated datagram sink failure",
            ))
        })
    }
}
