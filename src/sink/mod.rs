//! HLS muxer boundary
//!
//! The session feeds video and audio units into an [`HlsSink`] created by
//! an [`HlsSinkFactory`]. Segmenting, TS packetization and playlist writing
//! all happen behind this trait.

pub mod hls;

pub use hls::{HlsSink, HlsSinkFactory, OutputLayout, SinkParams, VideoUnitKind};
