//! Capture timestamps and presentation timestamps
//!
//! The pull client stamps every frame with the wall-clock capture time as a
//! (seconds, microseconds) pair. The muxer expects timestamps in the
//! 90 kHz MPEG clock. Seconds are reduced modulo 1 000 000 before scaling so
//! the millisecond value stays well inside 33-bit PTS range arithmetic.

/// MPEG system clock ticks per millisecond
pub const PTS_TICKS_PER_MS: u64 = 90;

/// Capture seconds are folded into this range before scaling
const CAPTURE_SECS_MODULUS: u64 = 1_000_000;

/// Wall-clock capture time of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureTime {
    /// Whole seconds
    pub secs: u32,
    /// Microseconds within the second
    pub usecs: u32,
}

impl CaptureTime {
    /// Create a capture time
    pub fn new(secs: u32, usecs: u32) -> Self {
        Self { secs, usecs }
    }

    /// Capture time in milliseconds, seconds folded modulo 1 000 000
    pub fn millis(&self) -> u64 {
        (self.secs as u64 % CAPTURE_SECS_MODULUS) * 1000 + self.usecs as u64 / 1000
    }

    /// Presentation timestamp in the 90 kHz clock
    pub fn pts(&self) -> u64 {
        self.millis() * PTS_TICKS_PER_MS
    }
}

impl std::fmt::Display for CaptureTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:06}", self.secs, self.usecs)
    }
}
