//! HLS sink traits and output layout

use std::path::PathBuf;

use bytes::Bytes;

use crate::media::VideoFrameKind;
use crate::registry::SessionId;

/// Parameters for creating a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkParams {
    /// Number of segments kept in the playlist
    pub playlist_capacity: u32,
    /// Value of the playlist's cache flag
    pub allow_cache: bool,
    /// Playlist format version
    pub version: u32,
}

/// Where a sink writes its playlist and segments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    /// Local root directory
    pub root_dir: PathBuf,
    /// Sub directory below the root (with trailing `/`)
    pub sub_dir: String,
    /// Base name for the playlist and segments
    pub base_name: String,
    /// Target segment duration in seconds
    pub target_duration: u32,
}

impl OutputLayout {
    /// Layout for a session: `{root}/{id}/` with base name `{id}`
    pub fn for_session(root_dir: impl Into<PathBuf>, id: &SessionId, target_duration: u32) -> Self {
        Self {
            root_dir: root_dir.into(),
            sub_dir: format!("{}/", id),
            base_name: id.to_string(),
            target_duration,
        }
    }

    /// Directory the playlist is written to
    pub fn output_dir(&self) -> PathBuf {
        self.root_dir.join(&self.sub_dir)
    }
}

/// Frame type tag the muxer writes into video PES packets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoUnitKind {
    IFrame,
    PFrame,
}

impl From<VideoFrameKind> for VideoUnitKind {
    fn from(kind: VideoFrameKind) -> Self {
        match kind {
            VideoFrameKind::I => VideoUnitKind::IFrame,
            VideoFrameKind::P => VideoUnitKind::PFrame,
        }
    }
}

/// Creates HLS sinks
pub trait HlsSinkFactory: Send + Sync {
    /// Create a sink, or `None` if the muxer cannot provide one
    fn create(&self, params: &SinkParams) -> Option<Box<dyn HlsSink>>;
}

/// A live HLS muxer
///
/// Timestamps are in the 90 kHz clock.
pub trait HlsSink: Send {
    /// Set (or reset) the output location
    fn configure_output(&mut self, layout: &OutputLayout);

    /// Mux one video access unit
    fn push_video(&mut self, kind: VideoUnitKind, data: Bytes, dts: u64, cts: u64, pts: u64);

    /// Mux one AAC frame
    fn push_audio(&mut self, data: Bytes, dts: u64, pts: u64);

    /// Flush and tear down the sink
    fn release(self: Box<Self>) {}
}
