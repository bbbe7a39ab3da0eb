//! Frames delivered by the pull client
//!
//! A frame is one callback invocation from the pull client: a media type
//! flag, an optional payload and an optional frame info block. Event frames
//! (connection established, packet loss) carry no media and are told apart
//! by which of payload/info are present.
//!
//! Frame info layout reported by the client:
//! ```text
//! +--------+------------+--------+---------------+----------------+
//! | codec  | frame type | length | capture secs  | capture usecs  |
//! | (u32)  | (u8)       | (u32)  | (u32)         | (u32)          |
//! +--------+------------+--------+---------------+----------------+
//! ```

use bytes::Bytes;

use super::timestamp::CaptureTime;

/// Media type flag for video frames
pub const MEDIA_FLAG_VIDEO: u32 = 0x01;
/// Media type flag for audio frames
pub const MEDIA_FLAG_AUDIO: u32 = 0x02;
/// Media type flag for event/control frames
pub const MEDIA_FLAG_EVENT: u32 = 0x04;

/// Video frame type: intra-coded frame
pub const FRAME_TYPE_I: u8 = 0x01;
/// Video frame type: predicted frame
pub const FRAME_TYPE_P: u8 = 0x02;
/// Video frame type: bi-predicted frame
pub const FRAME_TYPE_B: u8 = 0x03;
/// Frame type reserved for packet-loss events
pub const FRAME_TYPE_PACKET_LOSS: u8 = 0xF1;

/// Audio codec id: AAC
pub const CODEC_AAC: u32 = 0x15002;
/// Audio codec id: G.711 mu-law
pub const CODEC_G711U: u32 = 0x10006;
/// Audio codec id: G.711 A-law
pub const CODEC_G711A: u32 = 0x10007;
/// Audio codec id: G.726
pub const CODEC_G726: u32 = 0x1100B;

/// Media type of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    /// Encoded video
    Video,
    /// Encoded audio
    Audio,
    /// Connection or transport event
    Event,
    /// Any other flag the client reports (SDP, RTP, media info, ...)
    Other(u32),
}

impl MediaType {
    pub fn from_flag(flag: u32) -> Self {
        match flag {
            MEDIA_FLAG_VIDEO => MediaType::Video,
            MEDIA_FLAG_AUDIO => MediaType::Audio,
            MEDIA_FLAG_EVENT => MediaType::Event,
            other => MediaType::Other(other),
        }
    }

    pub fn flag(&self) -> u32 {
        match self {
            MediaType::Video => MEDIA_FLAG_VIDEO,
            MediaType::Audio => MEDIA_FLAG_AUDIO,
            MediaType::Event => MEDIA_FLAG_EVENT,
            MediaType::Other(flag) => *flag,
        }
    }

    /// Whether frames of this type count toward session statistics
    pub fn is_media(&self) -> bool {
        matches!(self, MediaType::Video | MediaType::Audio)
    }
}

/// Video frame sub-type that the muxer can accept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoFrameKind {
    /// Intra-coded (key) frame
    I,
    /// Predicted frame
    P,
}

impl VideoFrameKind {
    /// Classify a raw frame type; `None` for anything the muxer cannot take
    pub fn from_frame_type(frame_type: u8) -> Option<Self> {
        match frame_type {
            FRAME_TYPE_I => Some(VideoFrameKind::I),
            FRAME_TYPE_P => Some(VideoFrameKind::P),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            VideoFrameKind::I => "I",
            VideoFrameKind::P => "P",
        }
    }
}

/// Audio codec reported in frame info
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCodec {
    Aac,
    G711U,
    G711A,
    G726,
    Other(u32),
}

impl AudioCodec {
    pub fn from_id(id: u32) -> Self {
        match id {
            CODEC_AAC => AudioCodec::Aac,
            CODEC_G711U => AudioCodec::G711U,
            CODEC_G711A => AudioCodec::G711A,
            CODEC_G726 => AudioCodec::G726,
            other => AudioCodec::Other(other),
        }
    }

    pub fn id(&self) -> u32 {
        match self {
            AudioCodec::Aac => CODEC_AAC,
            AudioCodec::G711U => CODEC_G711U,
            AudioCodec::G711A => CODEC_G711A,
            AudioCodec::G726 => CODEC_G726,
            AudioCodec::Other(id) => *id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AudioCodec::Aac => "AAC",
            AudioCodec::G711U => "G.711U",
            AudioCodec::G711A => "G.711A",
            AudioCodec::G726 => "G.726",
            AudioCodec::Other(_) => "unknown",
        }
    }
}

/// Per-frame metadata reported by the pull client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameInfo {
    /// Codec id (audio codecs use the `CODEC_*` values)
    pub codec: u32,
    /// Frame sub-type (`FRAME_TYPE_*`)
    pub frame_type: u8,
    /// Payload length as reported by the client
    pub length: u32,
    /// Wall-clock capture time
    pub capture: CaptureTime,
}

impl FrameInfo {
    /// Frame info for a video frame
    pub fn video(frame_type: u8, length: u32, capture: CaptureTime) -> Self {
        Self {
            codec: 0,
            frame_type,
            length,
            capture,
        }
    }

    /// Frame info for an audio frame
    pub fn audio(codec: AudioCodec, length: u32, capture: CaptureTime) -> Self {
        Self {
            codec: codec.id(),
            frame_type: 0,
            length,
            capture,
        }
    }

    pub fn audio_codec(&self) -> AudioCodec {
        AudioCodec::from_id(self.codec)
    }

    pub fn video_kind(&self) -> Option<VideoFrameKind> {
        VideoFrameKind::from_frame_type(self.frame_type)
    }

    /// Whether this info marks a packet-loss event
    pub fn is_packet_loss(&self) -> bool {
        self.frame_type == FRAME_TYPE_PACKET_LOSS
    }
}

/// One unit delivered by the pull client
#[derive(Debug, Clone)]
pub struct Frame {
    /// Client channel the frame arrived on
    pub channel_id: i32,
    /// Media type flag
    pub media_type: MediaType,
    /// Frame payload (zero-copy via reference counting)
    pub payload: Option<Bytes>,
    /// Frame metadata
    pub info: Option<FrameInfo>,
}

impl Frame {
    /// Create a video frame
    pub fn video(channel_id: i32, payload: Bytes, frame_type: u8, capture: CaptureTime) -> Self {
        let info = FrameInfo::video(frame_type, payload.len() as u32, capture);
        Self {
            channel_id,
            media_type: MediaType::Video,
            payload: Some(payload),
            info: Some(info),
        }
    }

    /// Create an audio frame
    pub fn audio(channel_id: i32, payload: Bytes, codec: AudioCodec, capture: CaptureTime) -> Self {
        let info = FrameInfo::audio(codec, payload.len() as u32, capture);
        Self {
            channel_id,
            media_type: MediaType::Audio,
            payload: Some(payload),
            info: Some(info),
        }
    }

    /// Create a connection-established event
    pub fn connected(channel_id: i32) -> Self {
        Self {
            channel_id,
            media_type: MediaType::Event,
            payload: None,
            info: None,
        }
    }

    /// Create a packet-loss event
    pub fn packet_loss(channel_id: i32) -> Self {
        Self {
            channel_id,
            media_type: MediaType::Event,
            payload: None,
            info: Some(FrameInfo {
                frame_type: FRAME_TYPE_PACKET_LOSS,
                ..Default::default()
            }),
        }
    }

    /// Payload bytes limited to the length reported in the frame info
    ///
    /// Returns `None` for frames without payload or info.
    pub fn media_data(&self) -> Option<Bytes> {
        let payload = self.payload.as_ref()?;
        let info = self.info.as_ref()?;
        let len = (info.length as usize).min(payload.len());
        Some(payload.slice(..len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_flags() {
        assert_eq!(MediaType::from_flag(MEDIA_FLAG_VIDEO), MediaType::Video);
        assert_eq!(MediaType::from_flag(MEDIA_FLAG_AUDIO), MediaType::Audio);
        assert_eq!(MediaType::from_flag(MEDIA_FLAG_EVENT), MediaType::Event);
        assert_eq!(MediaType::from_flag(0x10), MediaType::Other(0x10));
        assert_eq!(MediaType::Other(0x10).flag(), 0x10);
        assert!(MediaType::Video.is_media());
        assert!(!MediaType::Event.is_media());
    }

    #[test]
    fn test_video_frame_kind() {
        assert_eq!(VideoFrameKind::from_frame_type(FRAME_TYPE_I), Some(VideoFrameKind::I));
        assert_eq!(VideoFrameKind::from_frame_type(FRAME_TYPE_P), Some(VideoFrameKind::P));
        assert_eq!(VideoFrameKind::from_frame_type(FRAME_TYPE_B), None);
    }

    #[test]
    fn test_audio_codec() {
        assert_eq!(AudioCodec::from_id(CODEC_AAC), AudioCodec::Aac);
        assert_eq!(AudioCodec::from_id(CODEC_G711A), AudioCodec::G711A);
        assert_eq!(AudioCodec::from_id(7), AudioCodec::Other(7));
        assert_eq!(AudioCodec::Aac.id(), CODEC_AAC);
        assert_eq!(AudioCodec::G726.name(), "G.726");
    }

    #[test]
    fn test_event_frames() {
        let connected = Frame::connected(0);
        assert!(connected.payload.is_none() && connected.info.is_none());

        let loss = Frame::packet_loss(0);
        assert!(loss.info.unwrap().is_packet_loss());
        assert!(loss.media_data().is_none());
    }

    #[test]
    fn test_media_data_clamped_to_payload() {
        let mut frame = Frame::video(
            0,
            Bytes::from_static(&[1, 2, 3, 4]),
            FRAME_TYPE_I,
            CaptureTime::default(),
        );
        assert_eq!(frame.media_data().unwrap().len(), 4);

        frame.info.as_mut().unwrap().length = 2;
        assert_eq!(frame.media_data().unwrap(), Bytes::from_static(&[1, 2]));

        frame.info.as_mut().unwrap().length = 100;
        assert_eq!(frame.media_data().unwrap().len(), 4);
    }
}
