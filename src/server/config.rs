//! Recorder configuration
//!
//! Built once at process start and shared read-only (`Arc<RecordConfig>`)
//! by the manager and every session.

use std::path::PathBuf;
use std::time::Duration;

use crate::registry::SessionId;
use crate::sink::{OutputLayout, SinkParams};

/// Pref key for the output-root URL prefix
pub const PREF_HTTP_ROOT_DIR: &str = "HTTP_ROOT_DIR";
/// Pref key for the playlist format version
pub const PREF_M3U8_VERSION: &str = "M3U8_VERSION";
/// Pref key for the playlist cache flag
pub const PREF_ALLOW_CACHE: &str = "ALLOW_CACHE";
/// Pref key for the target segment duration (seconds)
pub const PREF_TARGET_DURATION: &str = "TARGET_DURATION";
/// Pref key for the playlist capacity (segments)
pub const PREF_PLAYLIST_CAPACITY: &str = "PLAYLIST_CAPACITY";
/// Pref key for the local segment root directory
pub const PREF_OUTPUT_DIR: &str = "OUTPUT_DIR";

/// Recorder configuration options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordConfig {
    /// URL prefix playlists are served under
    pub http_root: String,

    /// Playlist format version
    pub playlist_version: u32,

    /// Playlist cache flag
    pub allow_cache: bool,

    /// Target segment duration in seconds
    pub target_duration: u32,

    /// Number of segments kept in the playlist
    pub playlist_capacity: u32,

    /// Local directory the muxer writes under
    pub output_dir: PathBuf,

    /// Statistics refresh interval of the timeout task
    pub stats_interval: Duration,

    /// Inactivity deadline armed when a session is created
    pub default_timeout: Duration,

    /// Connection timeout handed to the pull client
    pub connect_timeout: Duration,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            http_root: "http://www.easydarwin.org/".to_string(),
            playlist_version: 3,
            allow_cache: false,
            target_duration: 4,
            playlist_capacity: 4,
            output_dir: PathBuf::from("./Movies/"),
            stats_interval: Duration::from_millis(2000),
            default_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_millis(1000),
        }
    }
}

impl RecordConfig {
    /// Build a config from preference key/value pairs
    ///
    /// Unknown keys are ignored. Values that fail to parse keep the default
    /// and log a warning.
    pub fn from_prefs<I, K, V>(prefs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();

        for (key, value) in prefs {
            let key = key.as_ref();
            let value = value.as_ref().trim();

            match key {
                PREF_HTTP_ROOT_DIR => config.http_root = value.to_string(),
                PREF_OUTPUT_DIR => config.output_dir = PathBuf::from(value),
                PREF_M3U8_VERSION => {
                    parse_pref(key, value, &mut config.playlist_version, |v| v.parse().ok())
                }
                PREF_TARGET_DURATION => {
                    parse_pref(key, value, &mut config.target_duration, |v| v.parse().ok())
                }
                PREF_PLAYLIST_CAPACITY => {
                    parse_pref(key, value, &mut config.playlist_capacity, |v| v.parse().ok())
                }
                PREF_ALLOW_CACHE => parse_pref(key, value, &mut config.allow_cache, parse_bool),
                _ => {
                    tracing::trace!(key = key, "Ignoring unknown pref");
                }
            }
        }

        config
    }

    /// Set the output-root URL prefix
    pub fn http_root(mut self, root: impl Into<String>) -> Self {
        self.http_root = root.into();
        self
    }

    /// Set the playlist format version
    pub fn playlist_version(mut self, version: u32) -> Self {
        self.playlist_version = version;
        self
    }

    /// Set the playlist cache flag
    pub fn allow_cache(mut self, allow: bool) -> Self {
        self.allow_cache = allow;
        self
    }

    /// Set the target segment duration in seconds
    pub fn target_duration(mut self, secs: u32) -> Self {
        self.target_duration = secs;
        self
    }

    /// Set the playlist capacity
    pub fn playlist_capacity(mut self, segments: u32) -> Self {
        self.playlist_capacity = segments;
        self
    }

    /// Set the local output directory
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the statistics refresh interval
    pub fn stats_interval(mut self, interval: Duration) -> Self {
        self.stats_interval = interval;
        self
    }

    /// Set the inactivity deadline armed at session creation
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Set the pull client connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Parameters for creating a session's sink
    pub fn sink_params(&self) -> SinkParams {
        SinkParams {
            playlist_capacity: self.playlist_capacity,
            allow_cache: self.allow_cache,
            version: self.playlist_version,
        }
    }

    /// Output layout for session `id`
    pub fn output_layout(&self, id: &SessionId) -> OutputLayout {
        OutputLayout::for_session(self.output_dir.clone(), id, self.target_duration)
    }

    /// Public playlist URL for session `id`
    pub fn output_url(&self, id: &SessionId) -> String {
        format!("{}{}/{}.m3u8", self.http_root, id, id)
    }
}

fn parse_pref<T: std::fmt::Debug>(
    key: &str,
    value: &str,
    slot: &mut T,
    parse: impl Fn(&str) -> Option<T>,
) {
    match parse(value) {
        Some(parsed) => *slot = parsed,
        None => {
            tracing::warn!(
                key = key,
                value = value,
                default = ?slot,
                "Invalid pref value, keeping default"
            );
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RecordConfig::default();

        assert_eq!(config.http_root, "http://www.easydarwin.org/");
        assert_eq!(config.playlist_version, 3);
        assert!(!config.allow_cache);
        assert_eq!(config.target_duration, 4);
        assert_eq!(config.playlist_capacity, 4);
        assert_eq!(config.stats_interval, Duration::from_millis(2000));
        assert_eq!(config.default_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_from_prefs() {
        let config = RecordConfig::from_prefs([
            (PREF_HTTP_ROOT_DIR, "http://media.local/hls/"),
            (PREF_M3U8_VERSION, "4"),
            (PREF_ALLOW_CACHE, "Yes"),
            (PREF_TARGET_DURATION, " 6 "),
            (PREF_PLAYLIST_CAPACITY, "10"),
            (PREF_OUTPUT_DIR, "/var/hls"),
            ("SOMETHING_ELSE", "ignored"),
        ]);

        assert_eq!(config.http_root, "http://media.local/hls/");
        assert_eq!(config.playlist_version, 4);
        assert!(config.allow_cache);
        assert_eq!(config.target_duration, 6);
        assert_eq!(config.playlist_capacity, 10);
        assert_eq!(config.output_dir, PathBuf::from("/var/hls"));
    }

    #[test]
    fn test_from_prefs_invalid_values_keep_defaults() {
        let config = RecordConfig::from_prefs(vec![
            ("M3U8_VERSION".to_string(), "three".to_string()),
            ("ALLOW_CACHE".to_string(), "maybe".to_string()),
            ("TARGET_DURATION".to_string(), "-1".to_string()),
        ]);

        assert_eq!(config, RecordConfig::default());
    }

    #[test]
    fn test_builder_chaining() {
        let config = RecordConfig::default()
            .http_root("http://cdn/")
            .playlist_version(6)
            .allow_cache(true)
            .target_duration(2)
            .playlist_capacity(8)
            .output_dir("/tmp/out")
            .stats_interval(Duration::from_millis(500))
            .default_timeout(Duration::from_secs(5))
            .connect_timeout(Duration::from_secs(2));

        assert_eq!(
            config.sink_params(),
            SinkParams {
                playlist_capacity: 8,
                allow_cache: true,
                version: 6,
            }
        );
        assert_eq!(config.stats_interval, Duration::from_millis(500));
        assert_eq!(config.default_timeout, Duration::from_secs(5));
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_output_url_and_layout() {
        let config = RecordConfig::default().http_root("http://host/live/");
        let id = SessionId::from("cam01");

        assert_eq!(config.output_url(&id), "http://host/live/cam01/cam01.m3u8");

        let layout = config.output_layout(&id);
        assert_eq!(layout.root_dir, PathBuf::from("./Movies/"));
        assert_eq!(layout.sub_dir, "cam01/");
        assert_eq!(layout.base_name, "cam01");
        assert_eq!(layout.target_duration, 4);
    }
}
