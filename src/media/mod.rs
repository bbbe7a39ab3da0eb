//! Media units delivered by the pull client
//!
//! This module provides:
//! - Frame and frame-info types as reported by the pull client
//! - Video frame and audio codec classification
//! - Capture time to 90 kHz presentation timestamp conversion

pub mod frame;
pub mod timestamp;

pub use frame::{AudioCodec, Frame, FrameInfo, MediaType, VideoFrameKind};
pub use timestamp::CaptureTime;
