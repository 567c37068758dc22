//! Per-stream receive-side reassembly: inserts received STREAM frames at
//! their offset, serves contiguous reads to the application, and advances
//! flow control — locally and connection-wide — as bytes are consumed.

use crate::frame::{Frame, MaxData, MaxStreamData, Stream};
use crate::packet::number::EncryptionLevel;
use crate::send::queue::{single_frame_request, OutboundQueue};
use crate::stream::id::StreamId;
use crate::transport::error::StreamError;
use crate::varint::VarInt;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Tracks a single limit that only ever advances as bytes are consumed,
/// re-advertising to the peer once the unadvertised delta exceeds 10% of
/// the initial limit. Shared by both the per-stream and the
/// connection-wide flow-control windows.
struct FlowControlWindow {
    initial_limit: u64,
    current_limit: u64,
    last_advertised: u64,
}

impl FlowControlWindow {
    fn new(initial_limit: u64) -> Self {
        Self {
            initial_limit,
            current_limit: initial_limit,
            last_advertised: initial_limit,
        }
    }

    /// Advances the window by `consumed` bytes, returning the new limit to
    /// advertise if the threshold was crossed.
    fn on_consumed(&mut self, consumed: u64) -> Option<u64> {
        self.current_limit += consumed;
        let threshold = self.initial_limit / 10;
        let delta = self.current_limit.saturating_sub(self.last_advertised);
        if delta > threshold {
            self.last_advertised = self.current_limit;
            Some(self.current_limit)
        } else {
            None
        }
    }
}

/// Connection-wide receive flow control, updated by every stream's reads
/// analogously to the per-stream window.
pub struct ConnectionFlowControl {
    window: Mutex<FlowControlWindow>,
    outbound: OutboundQueue,
    level: EncryptionLevel,
}

impl ConnectionFlowControl {
    pub fn new(initial_limit: u64, outbound: OutboundQueue, level: EncryptionLevel) -> Arc<Self> {
        Arc::new(Self {
            window: Mutex::new(FlowControlWindow::new(initial_limit)),
            outbound,
            level,
        })
    }

    fn on_consumed(&self, consumed: u64) {
        let update = self.window.lock().unwrap().on_consumed(consumed);
        if let Some(new_limit) = update {
            if let Ok(maximum_data) = VarInt::new(new_limit) {
                self.outbound.send(single_frame_request(
                    self.level,
                    Frame::MaxData(MaxData { maximum_data }),
                    None,
                ));
            }
        }
    }
}

/// One fragment of stream data pending reassembly, keyed in `Reassembly`
/// by its starting offset.
struct Reassembly {
    fragments: BTreeMap<u64, Vec<u8>>,
    read_cursor: u64,
    final_offset: Option<u64>,
    aborted: bool,
}

impl Reassembly {
    fn new() -> Self {
        Self {
            fragments: BTreeMap::new(),
            read_cursor: 0,
            final_offset: None,
            aborted: false,
        }
    }

    /// Inserts a received fragment, trimming any prefix already consumed.
    /// Fragments are assumed non-overlapping with each other once trimmed
    /// against the read cursor; a peer that violates stream-data framing
    /// is a protocol violation handled above this layer.
    fn insert(&mut self, mut offset: u64, mut data: Vec<u8>, is_fin: bool) {
        if is_fin {
            self.final_offset = Some(offset + data.len() as u64);
        }
        if data.is_empty() {
            return;
        }
        if offset < self.read_cursor {
            let skip = self.read_cursor - offset;
            if skip as usize >= data.len() {
                return;
            }
            data = data[skip as usize..].to_vec();
            offset = self.read_cursor;
        }
        self.fragments.insert(offset, data);
    }

    fn contiguous_available(&self) -> usize {
        self.fragments.get(&self.read_cursor).map_or(0, Vec::len)
    }

    fn take(&mut self, max_len: usize) -> Vec<u8> {
        let Some(mut data) = self.fragments.remove(&self.read_cursor) else {
            return Vec::new();
        };
        if data.len() > max_len {
            let remainder = data.split_off(max_len);
            self.fragments.insert(self.read_cursor + max_len as u64, remainder);
        }
        self.read_cursor += data.len() as u64;
        data
    }

    fn is_finished(&self) -> bool {
        self.final_offset == Some(self.read_cursor)
    }
}

/// Outcome of a successful `StreamInputBuffer::read`.
#[derive(Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    Data(Vec<u8>),
    EndOfStream,
}

/// Per-stream receive buffer: reassembles STREAM frames and serves reads
/// to the application, advancing flow control as data is consumed.
pub struct StreamInputBuffer {
    stream_id: StreamId,
    level: EncryptionLevel,
    state: Mutex<Reassembly>,
    notify: Notify,
    flow_control: Mutex<FlowControlWindow>,
    connection_flow_control: Arc<ConnectionFlowControl>,
    outbound: OutboundQueue,
    read_timeout: Option<Duration>,
}

impl StreamInputBuffer {
    pub fn new(
        stream_id: StreamId,
        level: EncryptionLevel,
        initial_max_stream_data: u64,
        connection_flow_control: Arc<ConnectionFlowControl>,
        outbound: OutboundQueue,
        read_timeout: Option<Duration>,
    ) -> Self {
        Self {
            stream_id,
            level,
            state: Mutex::new(Reassembly::new()),
            notify: Notify::new(),
            flow_control: Mutex::new(FlowControlWindow::new(initial_max_stream_data)),
            connection_flow_control,
            outbound,
            read_timeout,
        }
    }

    /// Inserts a received STREAM frame into the reassembly buffer and
    /// wakes any blocked reader.
    pub fn on_frame(&self, frame: &Stream) {
        let mut guard = self.state.lock().unwrap();
        guard.insert(frame.offset.as_u64(), frame.data.clone(), frame.is_fin);
        drop(guard);
        self.notify.notify_waiters();
    }

    /// Marks the stream aborted, waking any blocked reader with
    /// `StreamAborted`.
    pub fn on_abort(&self) {
        self.state.lock().unwrap().aborted = true;
        self.notify.notify_waiters();
    }

    /// Blocks until contiguous bytes are available at the read cursor, the
    /// stream's end is reached, or the stream is aborted; bounded by
    /// `read_timeout` when configured.
    pub async fn read(&self, max_len: usize) -> Result<ReadOutcome, StreamError> {
        loop {
            {
                let mut guard = self.state.lock().unwrap();
                if guard.aborted {
                    return Err(StreamError::StreamAborted);
                }
                if guard.is_finished() {
                    return Ok(ReadOutcome::EndOfStream);
                }
                if guard.contiguous_available() > 0 {
                    let data = guard.take(max_len);
                    drop(guard);
                    self.advance_flow_control(data.len() as u64);
                    return Ok(ReadOutcome::Data(data));
                }
            }

            let notified = self.notify.notified();
            match self.read_timeout {
                Some(timeout) => {
                    if tokio::time::timeout(timeout, notified).await.is_err() {
                        return Err(StreamError::ReadTimeout);
                    }
                }
                None => notified.await,
            }
        }
    }

    fn advance_flow_control(&self, consumed: u64) {
        if consumed == 0 {
            return;
        }
        let update = self.flow_control.lock().unwrap().on_consumed(consumed);
        if let Some(new_limit) = update {
            if let Ok(maximum_stream_data) = VarInt::new(new_limit) {
                self.outbound.send(single_frame_request(
                    self.level,
                    Frame::MaxStreamData(MaxStreamData {
                        stream_id: self.stream_id,
                        maximum_stream_data,
                    }),
                    None,
                ));
            }
        }
        self.connection_flow_control.on_consumed(consumed);
    }
}
