//! Rolling packet/byte counters
//!
//! Totals are plain atomics written by the frame callback thread. The
//! sample baseline sits behind its own lock and is only advanced by the
//! timeout task (or reset when a pull connection is opened), so a computed
//! rate always covers exactly one tick regardless of how many frames
//! arrived in between. Totals and baseline are not read as one atomic
//! snapshot, so the rate is approximate under concurrent delivery.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::time::Instant;

/// Result of the most recent sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    /// When the sample was taken
    pub at: Instant,
    /// Total packets at sample time
    pub packets: u64,
    /// Total bytes at sample time
    pub bytes: u64,
    /// Bytes per second over the last sampled interval
    pub bitrate: u64,
    /// Packets per second over the last sampled interval
    pub packet_rate: u64,
}

/// Cumulative counters plus the last-sample baseline
#[derive(Debug)]
pub struct StreamCounters {
    total_packets: AtomicU64,
    total_bytes: AtomicU64,
    last: Mutex<Sample>,
}

impl StreamCounters {
    /// Create zeroed counters with the baseline at `now`
    pub fn new(now: Instant) -> Self {
        Self {
            total_packets: AtomicU64::new(0),
            total_bytes: AtomicU64::new(0),
            last: Mutex::new(Sample {
                at: now,
                packets: 0,
                bytes: 0,
                bitrate: 0,
                packet_rate: 0,
            }),
        }
    }

    /// Count one received media unit of `bytes` length
    pub fn record(&self, bytes: u64) {
        self.total_packets.fetch_add(1, Ordering::Relaxed);
        self.total_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Total media units received
    pub fn total_packets(&self) -> u64 {
        self.total_packets.load(Ordering::Relaxed)
    }

    /// Total media bytes received
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes.load(Ordering::Relaxed)
    }

    /// Move the baseline to the current totals at `now`
    ///
    /// Totals are left untouched; the next sample measures from here.
    pub fn reset_baseline(&self, now: Instant) {
        let mut last = self.last.lock();
        last.at = now;
        last.packets = self.total_packets();
        last.bytes = self.total_bytes();
    }

    /// Sample the counters at `now` and return the byte rate
    ///
    /// With zero elapsed time the previous rates are kept. The baseline is
    /// advanced in either case.
    pub fn sample(&self, now: Instant) -> u64 {
        let packets = self.total_packets();
        let bytes = self.total_bytes();

        let mut last = self.last.lock();
        let elapsed_ms = now.saturating_duration_since(last.at).as_millis() as u64;

        if elapsed_ms > 0 {
            last.bitrate = bytes.saturating_sub(last.bytes) * 1000 / elapsed_ms;
            last.packet_rate = packets.saturating_sub(last.packets) * 1000 / elapsed_ms;
        }

        last.at = now;
        last.packets = packets;
        last.bytes = bytes;
        last.bitrate
    }

    /// Byte rate computed by the last sample
    pub fn bitrate(&self) -> u64 {
        self.last.lock().bitrate
    }

    /// The last sample
    pub fn last_sample(&self) -> Sample {
        *self.last.lock()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_record_accumulates() {
        let counters = StreamCounters::new(Instant::now());
        counters.record(100);
        counters.record(250);

        assert_eq!(counters.total_packets(), 2);
        assert_eq!(counters.total_bytes(), 350);
        assert_eq!(counters.bitrate(), 0);
    }

    #[test]
    fn test_sample_bitrate() {
        let start = Instant::now();
        let counters = StreamCounters::new(start);
        counters.record(2000);

        let bitrate = counters.sample(start + Duration::from_millis(1000));
        assert_eq!(bitrate, 2000);
        assert_eq!(counters.last_sample().packet_rate, 1);
    }

    #[test]
    fn test_sample_zero_elapsed_keeps_previous() {
        let start = Instant::now();
        let counters = StreamCounters::new(start);
        counters.record(4000);

        let t1 = start + Duration::from_millis(2000);
        assert_eq!(counters.sample(t1), 2000);

        // No time and no bytes: no division, previous rate stays
        assert_eq!(counters.sample(t1), 2000);

        // Bytes but no time: still no division, baseline moves on
        counters.record(500);
        assert_eq!(counters.sample(t1), 2000);
        assert_eq!(counters.last_sample().bytes, 4500);
    }

    #[test]
    fn test_sample_covers_one_tick_only() {
        let start = Instant::now();
        let counters = StreamCounters::new(start);

        counters.record(10_000);
        counters.sample(start + Duration::from_millis(1000));

        counters.record(1_000);
        counters.record(1_000);
        let bitrate = counters.sample(start + Duration::from_millis(3000));
        assert_eq!(bitrate, 1_000);
        assert_eq!(counters.total_bytes(), 12_000);
    }

    #[test]
    fn test_reset_baseline_keeps_totals() {
        let start = Instant::now();
        let counters = StreamCounters::new(start);
        counters.record(800);

        let restart = start + Duration::from_secs(10);
        counters.reset_baseline(restart);
        assert_eq!(counters.total_bytes(), 800);

        counters.record(400);
        assert_eq!(counters.sample(restart + Duration::from_millis(2000)), 200);
    }
}
