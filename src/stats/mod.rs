//! Statistics for recording sessions
//!
//! Frame callbacks bump the cumulative counters; the session's timeout task
//! samples them once per tick to derive the byte rate over that tick.

pub mod counters;
pub mod metrics;

pub use counters::{Sample, StreamCounters};
pub use metrics::SessionStats;
