//! # hls-record
//!
//! Live-to-HLS recording sessions for streaming media servers.
//!
//! A recording session pulls a live stream (RTSP or similar) through a
//! pluggable pull client and feeds every video and audio unit into an HLS
//! segmenter, which writes a sliding-window `.m3u8` playlist plus segments
//! under `{output_dir}/{id}/`.
//!
//! ```text
//!  pull client ──frame callback──► RecordSession ──push_video/push_audio──► HLS sink
//!                                     │   ▲
//!                        counters ◄───┘   │ release on expiry
//!                                         │
//!                                   timeout task (tokio)
//! ```
//!
//! Sessions are registered by identifier in a [`registry::SessionRegistry`]
//! and created, started and released through a [`RecordManager`]. The pull
//! client and the HLS segmenter are supplied by the embedding server via
//! [`client::PullClientFactory`] and [`sink::HlsSinkFactory`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use hls_record::{RecordConfig, RecordManager};
//! # fn factories() -> (Arc<dyn hls_record::client::PullClientFactory>, Arc<dyn hls_record::sink::HlsSinkFactory>) { unimplemented!() }
//!
//! # async fn run() -> hls_record::Result<()> {
//! let (clients, sinks) = factories();
//! let manager = RecordManager::new(RecordConfig::default(), clients, sinks);
//!
//! let session = manager.start_recording("cam01", "rtsp://camera/stream", 60)?;
//! println!("playlist at {:?}", session.output_url());
//!
//! manager.release_session(session).await;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod media;
pub mod registry;
pub mod server;
pub mod session;
pub mod sink;
pub mod stats;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result};
pub use registry::SessionId;
pub use server::{RecordConfig, RecordManager};
pub use session::{RecordSession, SessionPhase};
pub use stats::SessionStats;
