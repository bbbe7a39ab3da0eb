//! Server-facing surface: configuration and the recording manager

pub mod config;
pub mod manager;

pub use config::RecordConfig;
pub use manager::RecordManager;
