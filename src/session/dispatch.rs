//! Frame dispatch
//!
//! Classifies each frame delivered by the pull client, updates the
//! session's counters and forwards muxable units to the HLS sink.
//!
//! | Media type | Counted | Muxed                                   |
//! |------------|---------|-----------------------------------------|
//! | Video      | yes     | I and P frames; other sub-types dropped |
//! | Audio      | yes     | AAC only; other codecs dropped silently |
//! | Event      | no      | never (connect / packet-loss logged)    |
//! | Other      | no      | never                                   |
//!
//! Frames are forwarded in the order they are delivered; nothing is
//! buffered here.

use std::sync::{Arc, Weak};

use bytes::Bytes;

use crate::client::FrameCallback;
use crate::error::{status_of, Error, Result};
use crate::media::{AudioCodec, Frame, MediaType};
use crate::registry::SessionId;
use crate::sink::HlsSink;
use crate::stats::StreamCounters;

use super::record::RecordSession;

/// Build the callback handed to the pull client for `session`
///
/// The callback holds only a weak reference; each delivered frame upgrades
/// it for the duration of the call.
pub(crate) fn frame_callback(session: Weak<RecordSession>) -> FrameCallback {
    Arc::new(move |frame: Frame| match session.upgrade() {
        Some(session) => status_of(&session.process_data(frame)),
        None => Error::NotReady.status_code(),
    })
}

/// Dispatch one frame into `sink`
pub(crate) fn dispatch_frame(
    id: &SessionId,
    counters: &StreamCounters,
    sink: &mut dyn HlsSink,
    frame: Frame,
) -> Result<()> {
    if frame.media_type.is_media() {
        return dispatch_media(id, counters, sink, frame);
    }

    if frame.media_type == MediaType::Event {
        on_event(id, &frame);
    } else {
        tracing::trace!(session = %id, flag = frame.media_type.flag(), "Ignoring non-media frame");
    }

    Ok(())
}

fn dispatch_media(
    id: &SessionId,
    counters: &StreamCounters,
    sink: &mut dyn HlsSink,
    frame: Frame,
) -> Result<()> {
    let Some(info) = frame.info else {
        tracing::debug!(session = %id, channel = frame.channel_id, "Media frame without frame info");
        return Err(Error::InvalidState("media frame without frame info"));
    };

    let data = frame.media_data().unwrap_or_else(Bytes::new);
    counters.record(data.len() as u64);

    if frame.payload.is_none() {
        tracing::debug!(session = %id, channel = frame.channel_id, "Media frame without payload");
        return Err(Error::InvalidState("media frame without payload"));
    }

    let pts = info.capture.pts();

    if frame.media_type == MediaType::Video {
        let Some(kind) = info.video_kind() else {
            tracing::debug!(
                session = %id,
                frame_type = info.frame_type,
                len = data.len(),
                "Dropping video frame with unrecognized type"
            );
            return Err(Error::InvalidState("unrecognized video frame type"));
        };

        tracing::trace!(
            session = %id,
            kind = kind.name(),
            len = data.len(),
            capture = %info.capture,
            pts = pts,
            "Video frame"
        );

        sink.push_video(kind.into(), data, pts, pts, pts);
    } else {
        let codec = info.audio_codec();

        tracing::trace!(
            session = %id,
            codec = codec.name(),
            len = data.len(),
            capture = %info.capture,
            pts = pts,
            "Audio frame"
        );

        if codec == AudioCodec::Aac {
            sink.push_audio(data, pts, pts);
        }
    }

    Ok(())
}

fn on_event(id: &SessionId, frame: &Frame) {
    match (&frame.payload, &frame.info) {
        (None, None) => {
            tracing::debug!(session = %id, channel = frame.channel_id, "Source connecting");
        }
        (_, Some(info)) if info.is_packet_loss() => {
            tracing::warn!(session = %id, channel = frame.channel_id, "Source lost packets");
        }
        _ => {
            tracing::trace!(session = %id, channel = frame.channel_id, "Ignoring event frame");
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use tokio::time::Instant;

    use super::*;
    use crate::media::frame::{CODEC_G711A, FRAME_TYPE_B, FRAME_TYPE_I, FRAME_TYPE_P};
    use crate::media::{CaptureTime, FrameInfo};
    use crate::sink::VideoUnitKind;
    use crate::testing::{SinkCall, RecordingSink};

    fn setup() -> (SessionId, StreamCounters, RecordingSink) {
        (
            SessionId::from("cam01"),
            StreamCounters::new(Instant::now()),
            RecordingSink::default(),
        )
    }

    #[test]
    fn test_video_i_frame_muxed() {
        let (id, counters, mut sink) = setup();
        let frame = Frame::video(
            0,
            Bytes::from_static(&[0, 0, 0, 1, 0x65]),
            FRAME_TYPE_I,
            CaptureTime::new(5, 500_000),
        );

        dispatch_frame(&id, &counters, &mut sink, frame).unwrap();

        assert_eq!(counters.total_packets(), 1);
        assert_eq!(counters.total_bytes(), 5);
        assert_eq!(
            sink.calls(),
            vec![SinkCall::Video {
                kind: VideoUnitKind::IFrame,
                len: 5,
                dts: 495_000,
                cts: 495_000,
                pts: 495_000,
            }]
        );
    }

    #[test]
    fn test_video_p_frame_muxed() {
        let (id, counters, mut sink) = setup();
        let frame = Frame::video(0, Bytes::from_static(&[1; 8]), FRAME_TYPE_P, CaptureTime::new(1, 0));

        dispatch_frame(&id, &counters, &mut sink, frame).unwrap();

        assert!(matches!(
            sink.calls()[..],
            [SinkCall::Video { kind: VideoUnitKind::PFrame, len: 8, pts: 90_000, .. }]
        ));
    }

    #[test]
    fn test_unrecognized_video_type_dropped_but_counted() {
        let (id, counters, mut sink) = setup();
        let frame = Frame::video(0, Bytes::from_static(&[1; 10]), FRAME_TYPE_B, CaptureTime::default());

        let result = dispatch_frame(&id, &counters, &mut sink, frame);

        assert!(matches!(result, Err(Error::InvalidState(_))));
        assert!(sink.calls().is_empty());
        assert_eq!(counters.total_packets(), 1);
        assert_eq!(counters.total_bytes(), 10);
    }

    #[test]
    fn test_aac_audio_muxed() {
        let (id, counters, mut sink) = setup();
        let frame = Frame::audio(0, Bytes::from_static(&[2; 6]), AudioCodec::Aac, CaptureTime::new(0, 20_000));

        dispatch_frame(&id, &counters, &mut sink, frame).unwrap();

        assert_eq!(
            sink.calls(),
            vec![SinkCall::Audio {
                len: 6,
                dts: 1_800,
                pts: 1_800,
            }]
        );
    }

    #[test]
    fn test_non_aac_audio_counted_not_muxed() {
        let (id, counters, mut sink) = setup();
        let frame = Frame::audio(
            0,
            Bytes::from_static(&[3; 160]),
            AudioCodec::from_id(CODEC_G711A),
            CaptureTime::default(),
        );

        dispatch_frame(&id, &counters, &mut sink, frame).unwrap();

        assert!(sink.calls().is_empty());
        assert_eq!(counters.total_packets(), 1);
        assert_eq!(counters.total_bytes(), 160);
    }

    #[test]
    fn test_event_frames_not_counted() {
        let (id, counters, mut sink) = setup();

        dispatch_frame(&id, &counters, &mut sink, Frame::connected(0)).unwrap();
        dispatch_frame(&id, &counters, &mut sink, Frame::packet_loss(0)).unwrap();

        assert!(sink.calls().is_empty());
        assert_eq!(counters.total_packets(), 0);
    }

    #[test]
    fn test_other_media_type_ignored() {
        let (id, counters, mut sink) = setup();
        let frame = Frame {
            channel_id: 0,
            media_type: MediaType::from_flag(0x10),
            payload: Some(Bytes::from_static(b"v=0")),
            info: None,
        };

        dispatch_frame(&id, &counters, &mut sink, frame).unwrap();
        assert_eq!(counters.total_packets(), 0);
    }

    #[test]
    fn test_media_frame_without_info_rejected() {
        let (id, counters, mut sink) = setup();
        let frame = Frame {
            channel_id: 0,
            media_type: MediaType::Video,
            payload: Some(Bytes::from_static(&[1, 2, 3])),
            info: None,
        };

        let result = dispatch_frame(&id, &counters, &mut sink, frame);
        assert!(matches!(result, Err(Error::InvalidState(_))));
        assert_eq!(counters.total_packets(), 0);
    }

    #[test]
    fn test_reported_length_limits_muxed_bytes() {
        let (id, counters, mut sink) = setup();
        let frame = Frame {
            channel_id: 0,
            media_type: MediaType::Video,
            payload: Some(Bytes::from_static(&[9; 32])),
            info: Some(FrameInfo::video(FRAME_TYPE_I, 20, CaptureTime::default())),
        };

        dispatch_frame(&id, &counters, &mut sink, frame).unwrap();

        assert_eq!(counters.total_bytes(), 20);
        assert!(matches!(sink.calls()[..], [SinkCall::Video { len: 20, .. }]));
    }

    #[test]
    fn test_order_preserved() {
        let (id, counters, mut sink) = setup();
        for secs in [1, 2, 3] {
            let frame = Frame::video(0, Bytes::from_static(&[0; 4]), FRAME_TYPE_P, CaptureTime::new(secs, 0));
            dispatch_frame(&id, &counters, &mut sink, frame).unwrap();
        }

        let pts: Vec<u64> = sink
            .calls()
            .iter()
            .map(|call| match call {
                SinkCall::Video { pts, .. } => *pts,
                other => panic!("unexpected call {:?}", other),
            })
            .collect();
        assert_eq!(pts, vec![90_000, 180_000, 270_000]);
    }
}
