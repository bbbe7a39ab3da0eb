//! Record Session - Drives a recording session with a synthetic camera
//!
//! Run with: RUST_LOG=hls_record=debug cargo run --example record_session
//!
//! This example demonstrates:
//! - Implementing `PullClientFactory` / `PullClient` for a frame source
//! - Implementing `HlsSinkFactory` / `HlsSink` for a muxer
//! - Starting, monitoring and releasing sessions through `RecordManager`
//! - The inactivity timeout releasing a session on its own
//!
//! # Architecture
//!
//! ```text
//!   FakeCamera task ──Frame──► RecordSession ──► LoggingSink
//!    (25 fps video,               │
//!     ~43 fps AAC)                └── timeout task: stats every 2s,
//!                                     release after the deadline
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing_subscriber::EnvFilter;

use hls_record::client::{ClientError, FrameCallback, OpenParams, PullClient, PullClientFactory};
use hls_record::media::frame::{FRAME_TYPE_I, FRAME_TYPE_P};
use hls_record::media::{AudioCodec, CaptureTime, Frame};
use hls_record::sink::{HlsSink, HlsSinkFactory, OutputLayout, SinkParams, VideoUnitKind};
use hls_record::{RecordConfig, RecordManager};

// ============================================================================
// Synthetic pull client
// ============================================================================

/// Opens a tokio task per connection that emits frames at a fixed rate
struct FakeCameraFactory;

impl PullClientFactory for FakeCameraFactory {
    fn open(
        &self,
        params: OpenParams,
        callback: FrameCallback,
    ) -> Result<Box<dyn PullClient>, ClientError> {
        if !params.url.starts_with("rtsp://") {
            return Err(ClientError::Open(format!("unsupported scheme: {}", params.url)));
        }

        let running = Arc::new(AtomicBool::new(true));
        tokio::spawn(run_camera(params.url.clone(), callback, Arc::clone(&running)));

        tracing::info!(url = %params.url, transport = ?params.transport, "Camera connected");
        Ok(Box::new(FakeCamera { url: params.url, running }))
    }
}

struct FakeCamera {
    url: String,
    running: Arc<AtomicBool>,
}

impl PullClient for FakeCamera {
    fn close(&mut self) {
        self.running.store(false, Ordering::Release);
        tracing::info!(url = %self.url, "Camera closed");
    }
}

async fn run_camera(url: String, callback: FrameCallback, running: Arc<AtomicBool>) {
    let mut ticker = tokio::time::interval(Duration::from_millis(20));
    let mut elapsed_us: u64 = 0;
    let mut video_n: u64 = 0;
    let mut next_video_us: u64 = 0;
    let mut next_audio_us: u64 = 0;

    callback(Frame::connected(0));

    while running.load(Ordering::Acquire) {
        ticker.tick().await;
        elapsed_us += 20_000;

        let capture = CaptureTime::new((elapsed_us / 1_000_000) as u32, (elapsed_us % 1_000_000) as u32);

        while next_video_us <= elapsed_us {
            let (frame_type, size) = if video_n % 50 == 0 {
                (FRAME_TYPE_I, 24_000)
            } else {
                (FRAME_TYPE_P, 3_000)
            };
            let status = callback(Frame::video(0, Bytes::from(vec![0u8; size]), frame_type, capture));
            if status != 0 {
                tracing::debug!(url = %url, status = status, "Video frame rejected");
            }
            video_n += 1;
            next_video_us += 40_000;
        }

        while next_audio_us <= elapsed_us {
            callback(Frame::audio(1, Bytes::from(vec![0u8; 256]), AudioCodec::Aac, capture));
            next_audio_us += 23_220;
        }
    }
}

// ============================================================================
// Logging sink
// ============================================================================

#[derive(Default)]
struct LoggingSinkFactory {
    created: AtomicU64,
}

impl HlsSinkFactory for LoggingSinkFactory {
    fn create(&self, params: &SinkParams) -> Option<Box<dyn HlsSink>> {
        self.created.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            capacity = params.playlist_capacity,
            allow_cache = params.allow_cache,
            version = params.version,
            "Sink created"
        );
        Some(Box::new(LoggingSink::default()))
    }
}

#[derive(Default)]
struct LoggingSink {
    playlist: Option<String>,
    keyframes: u64,
    video_units: u64,
    audio_units: u64,
}

impl HlsSink for LoggingSink {
    fn configure_output(&mut self, layout: &OutputLayout) {
        let playlist = layout.output_dir().join(format!("{}.m3u8", layout.base_name));
        tracing::info!(playlist = %playlist.display(), "Sink output configured");
        self.playlist = Some(playlist.display().to_string());
    }

    fn push_video(&mut self, kind: VideoUnitKind, data: Bytes, _dts: u64, _cts: u64, pts: u64) {
        self.video_units += 1;
        if kind == VideoUnitKind::IFrame {
            self.keyframes += 1;
            tracing::debug!(pts = pts, len = data.len(), "Keyframe, segment boundary");
        }
    }

    fn push_audio(&mut self, _data: Bytes, _dts: u64, _pts: u64) {
        self.audio_units += 1;
    }

    fn release(self: Box<Self>) {
        tracing::info!(
            playlist = ?self.playlist,
            keyframes = self.keyframes,
            video = self.video_units,
            audio = self.audio_units,
            "Sink released"
        );
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("hls_record=info".parse()?),
        )
        .init();

    let config = RecordConfig::from_prefs([
        ("HTTP_ROOT_DIR", "http://localhost:8080/hls/"),
        ("TARGET_DURATION", "2"),
    ]);
    let manager = RecordManager::new(
        config,
        Arc::new(FakeCameraFactory),
        Arc::new(LoggingSinkFactory::default()),
    );

    // A source the client refuses
    if let Err(e) = manager.start_recording("bad", "http://not-rtsp", 10) {
        println!("start failed as expected: {} (code {})", e, e.status_code());
    }

    let front = manager.start_recording("front", "rtsp://camera/front", 30)?;
    manager.start_recording("back", "rtsp://camera/back", 3)?;
    println!("front playlist: {:?}", front.output_url());

    for _ in 0..3 {
        tokio::time::sleep(Duration::from_secs(2)).await;
        for stats in manager.sessions() {
            println!(
                "{:<6} {:<10} packets={:<6} bytes={:<9} rate={} kbit/s",
                stats.id.to_string(),
                stats.phase.to_string(),
                stats.total_packets,
                stats.total_bytes,
                stats.bits_per_second() / 1000,
            );
        }
    }

    // "back" has passed its 3s deadline and released itself
    manager.release_session(front).await;
    manager.shutdown().await;
    println!("sessions left: {}", manager.session_count());

    Ok(())
}
