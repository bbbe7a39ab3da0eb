//! Statistics snapshots for recording sessions

use std::time::Duration;

use crate::registry::SessionId;
use crate::session::SessionPhase;

/// Point-in-time view of one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStats {
    /// Session identifier
    pub id: SessionId,
    /// Lifecycle phase
    pub phase: SessionPhase,
    /// Source locator (while the pull client is open)
    pub source_url: Option<String>,
    /// Playlist locator (while the sink is open)
    pub output_url: Option<String>,
    /// Media units received
    pub total_packets: u64,
    /// Media bytes received
    pub total_bytes: u64,
    /// Bytes per second over the last sampled interval
    pub bitrate: u64,
    /// Packets per second over the last sampled interval
    pub packet_rate: u64,
    /// Time since the session was created
    pub age: Duration,
    /// Time since the pull client was opened
    pub active_for: Option<Duration>,
}

impl SessionStats {
    /// Bitrate in bits per second
    pub fn bits_per_second(&self) -> u64 {
        self.bitrate * 8
    }

    /// Average media unit size in bytes
    pub fn average_packet_size(&self) -> u64 {
        if self.total_packets > 0 {
            self.total_bytes / self.total_packets
        } else {
            0
        }
    }
}
