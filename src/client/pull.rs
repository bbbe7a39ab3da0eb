//! Pull client traits and connection parameters

use std::sync::Arc;
use std::time::Duration;

use crate::media::frame::{MEDIA_FLAG_AUDIO, MEDIA_FLAG_VIDEO};
use crate::media::Frame;

/// Callback invoked by the client for every received frame
///
/// Returns a status code: 0 when the frame was handled, negative otherwise.
/// May be called from any thread, but never concurrently for the same
/// connection.
pub type FrameCallback = Arc<dyn Fn(Frame) -> i32 + Send + Sync>;

/// RTP transport mode requested from the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    /// RTP interleaved over the RTSP TCP connection
    #[default]
    Tcp,
    /// RTP over UDP
    Udp,
}

/// Media types to request from the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaMask {
    pub video: bool,
    pub audio: bool,
}

impl MediaMask {
    /// Request both audio and video
    pub fn audio_video() -> Self {
        Self {
            video: true,
            audio: true,
        }
    }

    /// Media flag bitmask in the client's encoding
    pub fn flags(&self) -> u32 {
        let mut flags = 0;
        if self.video {
            flags |= MEDIA_FLAG_VIDEO;
        }
        if self.audio {
            flags |= MEDIA_FLAG_AUDIO;
        }
        flags
    }
}

impl Default for MediaMask {
    fn default() -> Self {
        Self::audio_video()
    }
}

/// Parameters for opening a pull connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenParams {
    /// Source locator (e.g. `rtsp://camera/stream`)
    pub url: String,
    /// Transport mode
    pub transport: Transport,
    /// Requested media
    pub media: MediaMask,
    /// Connection timeout
    pub timeout: Duration,
}

impl OpenParams {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            transport: Transport::Tcp,
            media: MediaMask::audio_video(),
            timeout: Duration::from_millis(1000),
        }
    }

    pub fn transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Error reported by a pull client implementation
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// The client object could not be created
    #[error("client init failed: {0}")]
    Init(String),
    /// The stream could not be opened
    #[error("open failed: {0}")]
    Open(String),
}

/// Creates pull connections
pub trait PullClientFactory: Send + Sync {
    /// Open a connection to `params.url`, delivering frames to `callback`
    fn open(
        &self,
        params: OpenParams,
        callback: FrameCallback,
    ) -> Result<Box<dyn PullClient>, ClientError>;
}

/// An open pull connection
pub trait PullClient: Send {
    /// Close the transport
    ///
    /// No new callbacks may start after this returns.
    ///
    /// # Re-entrancy
    ///
    /// The frame callback holds its session only for the duration of one
    /// call. If every other holder drops the session meanwhile, the session
    /// is destroyed inside that call, and `close` (followed by `release`)
    /// then runs on the client's own delivery thread, from within the
    /// callback. Implementations must not block waiting for in-flight
    /// callbacks to finish (such as joining the delivery thread) when
    /// invoked that way.
    fn close(&mut self);

    /// Tear down the client object
    ///
    /// Subject to the same re-entrancy rule as [`PullClient::close`].
    fn release(self: Box<Self>) {}
}
