//! Recording doubles for the pull client and the HLS sink

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;

use crate::client::{ClientError, FrameCallback, OpenParams, PullClient, PullClientFactory};
use crate::media::Frame;
use crate::sink::{HlsSink, HlsSinkFactory, OutputLayout, SinkParams, VideoUnitKind};

/// One observed sink call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Configure(OutputLayout),
    Video {
        kind: VideoUnitKind,
        len: usize,
        dts: u64,
        cts: u64,
        pts: u64,
    },
    Audio {
        len: usize,
        dts: u64,
        pts: u64,
    },
    Released,
}

/// Sink that records every call into a shared log
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    log: Arc<Mutex<Vec<SinkCall>>>,
}

impl RecordingSink {
    pub fn calls(&self) -> Vec<SinkCall> {
        self.log.lock().clone()
    }
}

impl HlsSink for RecordingSink {
    fn configure_output(&mut self, layout: &OutputLayout) {
        self.log.lock().push(SinkCall::Configure(layout.clone()));
    }

    fn push_video(&mut self, kind: VideoUnitKind, data: Bytes, dts: u64, cts: u64, pts: u64) {
        self.log.lock().push(SinkCall::Video {
            kind,
            len: data.len(),
            dts,
            cts,
            pts,
        });
    }

    fn push_audio(&mut self, data: Bytes, dts: u64, pts: u64) {
        self.log.lock().push(SinkCall::Audio {
            len: data.len(),
            dts,
            pts,
        });
    }

    fn release(self: Box<Self>) {
        self.log.lock().push(SinkCall::Released);
    }
}

/// Sink factory handing out recording sinks that share one log
#[derive(Debug, Default)]
pub struct MockSinkFactory {
    sink: RecordingSink,
    params: Mutex<Vec<SinkParams>>,
    fail: AtomicBool,
}

impl MockSinkFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make subsequent `create` calls fail (or succeed again)
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn created(&self) -> usize {
        self.params.lock().len()
    }

    pub fn params(&self) -> Vec<SinkParams> {
        self.params.lock().clone()
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.sink.calls()
    }

    pub fn released(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| **call == SinkCall::Released)
            .count()
    }
}

impl HlsSinkFactory for MockSinkFactory {
    fn create(&self, params: &SinkParams) -> Option<Box<dyn HlsSink>> {
        if self.fail.load(Ordering::SeqCst) {
            return None;
        }
        self.params.lock().push(*params);
        Some(Box::new(self.sink.clone()))
    }
}

/// Pull client factory that keeps the frame callback for manual delivery
#[derive(Default)]
pub struct MockClientFactory {
    opens: Mutex<Vec<OpenParams>>,
    callback: Mutex<Option<FrameCallback>>,
    fail: AtomicBool,
    closed: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

impl MockClientFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make subsequent `open` calls fail (or succeed again)
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn opened(&self) -> usize {
        self.opens.lock().len()
    }

    pub fn opens(&self) -> Vec<OpenParams> {
        self.opens.lock().clone()
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Deliver a frame through the most recently registered callback
    ///
    /// Returns `None` if no connection has been opened yet.
    pub fn deliver(&self, frame: Frame) -> Option<i32> {
        let callback = self.callback.lock().clone()?;
        Some(callback(frame))
    }
}

impl PullClientFactory for MockClientFactory {
    fn open(
        &self,
        params: OpenParams,
        callback: FrameCallback,
    ) -> Result<Box<dyn PullClient>, ClientError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ClientError::Open(format!("{} unreachable", params.url)));
        }

        self.opens.lock().push(params);
        *self.callback.lock() = Some(callback);

        Ok(Box::new(MockClient {
            closed: Arc::clone(&self.closed),
            released: Arc::clone(&self.released),
        }))
    }
}

struct MockClient {
    closed: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

impl PullClient for MockClient {
    fn close(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }

    fn release(self: Box<Self>) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}
