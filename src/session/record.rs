//! Recording session
//!
//! A `RecordSession` owns one pull client connection and one HLS sink and
//! moves frames from the first to the second. It is always handled through
//! an `Arc`; the registry only indexes it.
//!
//! Locking: `control` guards the pull client and serializes start/release;
//! `media` guards the sink and serializes frame delivery. The lock order is
//! `control` then `media`. Frame callbacks only ever take `media`, so the
//! pull client can be opened or closed while callbacks are in flight.

use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::client::{OpenParams, PullClient, PullClientFactory};
use crate::error::{Error, Result};
use crate::media::Frame;
use crate::registry::{RegistrationHandle, SessionId, SessionRegistry};
use crate::server::config::RecordConfig;
use crate::sink::{HlsSink, HlsSinkFactory};
use crate::stats::{SessionStats, StreamCounters};

use super::dispatch;
use super::state::SessionPhase;
use super::timeout::{self, TimeoutHandle};

/// Registry type holding recording sessions
pub type RecordRegistry = SessionRegistry<RecordSession>;

/// Pull-side state, guarded by the control lock
struct ControlState {
    phase: SessionPhase,
    client: Option<Box<dyn PullClient>>,
    source_url: Option<String>,
    started_at: Option<Instant>,
}

/// Sink-side state, guarded by the media lock
struct MediaState {
    sink: Option<Box<dyn HlsSink>>,
    output_url: Option<String>,
}

/// External collaborators a session is built from
#[derive(Clone)]
pub struct SessionDeps {
    pub config: Arc<RecordConfig>,
    pub registry: Arc<RecordRegistry>,
    pub clients: Arc<dyn PullClientFactory>,
    pub sinks: Arc<dyn HlsSinkFactory>,
}

/// One live-to-HLS recording pipeline
pub struct RecordSession {
    id: SessionId,
    this: Weak<RecordSession>,
    deps: SessionDeps,
    registration: OnceLock<RegistrationHandle>,
    created_at: Instant,
    control: Mutex<ControlState>,
    media: Mutex<MediaState>,
    counters: StreamCounters,
    timer: TimeoutHandle,
}

impl RecordSession {
    /// Create a session, register it and schedule its timeout task
    ///
    /// Must be called from within a tokio runtime. Fails with
    /// `DuplicateIdentifier` if a live session already uses `id`.
    pub fn create(id: SessionId, deps: SessionDeps) -> Result<Arc<Self>> {
        let now = Instant::now();
        let (timer, signals) = TimeoutHandle::new(now + deps.config.default_timeout);
        let interval = deps.config.stats_interval;

        let session = Arc::new_cyclic(|this| Self {
            id,
            this: this.clone(),
            deps,
            registration: OnceLock::new(),
            created_at: now,
            control: Mutex::new(ControlState {
                phase: SessionPhase::Created,
                client: None,
                source_url: None,
                started_at: None,
            }),
            media: Mutex::new(MediaState {
                sink: None,
                output_url: None,
            }),
            counters: StreamCounters::new(now),
            timer,
        });

        let handle = session.deps.registry.register(&session.id, &session)?;
        // Freshly constructed, so the cell is empty
        let _ = session.registration.set(handle);

        let join = timeout::spawn(Arc::clone(&session), signals, interval);
        session.timer.attach(join);

        tracing::info!(session = %session.id, "Session created");

        Ok(session)
    }

    /// Session identifier
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Open the pull client and the sink, whichever is not open yet
    ///
    /// Handles that already exist are kept as they are, so calling this on
    /// a started session only re-arms the inactivity deadline. A session
    /// whose timeout task has ended gets a new one. On failure nothing
    /// already acquired is rolled back and the call can be retried; if the
    /// client cannot be opened the phase is left unchanged.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, source_url: &str, timeout_secs: u32) -> Result<()> {
        let was_active = self.phase().is_active();
        let result = self.try_start(source_url, timeout_secs);

        match &result {
            Ok(()) if was_active => {
                tracing::debug!(
                    session = %self.id,
                    timeout_secs = timeout_secs,
                    "Session deadline re-armed"
                );
            }
            Ok(()) => {
                tracing::info!(
                    session = %self.id,
                    url = source_url,
                    timeout_secs = timeout_secs,
                    "Session started"
                );
            }
            Err(e) => {
                tracing::warn!(
                    session = %self.id,
                    url = source_url,
                    code = e.status_code(),
                    error = %e,
                    "Session start failed"
                );
            }
        }

        result
    }

    fn try_start(&self, source_url: &str, timeout_secs: u32) -> Result<()> {
        let mut control = self.control.lock();

        if control.client.is_none() {
            let params = OpenParams::new(source_url).timeout(self.deps.config.connect_timeout);
            let callback = dispatch::frame_callback(self.this.clone());

            let client = self
                .deps
                .clients
                .open(params, callback)
                .map_err(|e| Error::RequestFailed {
                    source_url: source_url.to_string(),
                    reason: e.to_string(),
                })?;

            let now = Instant::now();
            control.client = Some(client);
            control.source_url = Some(source_url.to_string());
            control.started_at = Some(now);
            self.counters.reset_baseline(now);
        }
        control.phase = SessionPhase::Starting;

        {
            let mut media = self.media.lock();
            if media.sink.is_none() {
                let mut sink = self
                    .deps
                    .sinks
                    .create(&self.deps.config.sink_params())
                    .ok_or(Error::Unimplemented)?;

                let layout = self.deps.config.output_layout(&self.id);
                sink.configure_output(&layout);

                tracing::info!(
                    session = %self.id,
                    root_dir = %layout.root_dir.display(),
                    sub_dir = %layout.sub_dir,
                    "Sink output configured"
                );

                media.sink = Some(sink);
                media.output_url = Some(self.deps.config.output_url(&self.id));
            }
        }

        self.arm_timer(Duration::from_secs(timeout_secs as u64));
        control.phase = SessionPhase::Active;

        Ok(())
    }

    /// Handle one frame from the pull client
    ///
    /// Fails with `NotReady` until the sink exists.
    pub fn process_data(&self, frame: Frame) -> Result<()> {
        let mut media = self.media.lock();
        let sink = media.sink.as_deref_mut().ok_or(Error::NotReady)?;
        dispatch::dispatch_frame(&self.id, &self.counters, sink, frame)
    }

    /// Close the pull client and the sink
    ///
    /// Safe to call repeatedly and with either handle already gone.
    pub fn release(&self) {
        let mut control = self.control.lock();

        let had_client = control.client.is_some();
        if let Some(mut client) = control.client.take() {
            client.close();
            client.release();
        }
        control.source_url = None;

        let sink = {
            let mut media = self.media.lock();
            media.output_url = None;
            media.sink.take()
        };
        let had_sink = sink.is_some();
        if let Some(sink) = sink {
            sink.release();
        }

        control.phase = SessionPhase::Releasing;
        drop(control);

        if had_client || had_sink {
            tracing::info!(
                session = %self.id,
                had_client = had_client,
                had_sink = had_sink,
                "Session released"
            );
        }
    }

    /// Re-arm the inactivity deadline
    ///
    /// Spawns a new timeout task if the previous one expired or was killed.
    pub fn set_timeout(&self, timeout: Duration) {
        self.arm_timer(timeout);
    }

    fn arm_timer(&self, timeout: Duration) {
        let Some(signals) = self.timer.rearm(timeout) else {
            return;
        };
        // `None` only while the last reference is being dropped
        let Some(session) = self.this.upgrade() else {
            return;
        };

        let join = timeout::spawn(session, signals, self.deps.config.stats_interval);
        self.timer.attach(join);
        tracing::debug!(session = %self.id, "Timeout task respawned");
    }

    /// Stop the timeout task without releasing anything
    pub fn kill(&self) {
        self.timer.kill();
    }

    /// Control over this session's timeout task
    pub fn timer(&self) -> &TimeoutHandle {
        &self.timer
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> SessionPhase {
        self.control.lock().phase
    }

    /// Source locator of the open pull client
    pub fn source_url(&self) -> Option<String> {
        self.control.lock().source_url.clone()
    }

    /// Public playlist locator of the open sink
    pub fn output_url(&self) -> Option<String> {
        self.media.lock().output_url.clone()
    }

    pub fn has_client(&self) -> bool {
        self.control.lock().client.is_some()
    }

    pub fn has_sink(&self) -> bool {
        self.media.lock().sink.is_some()
    }

    /// Packet and byte counters
    pub fn counters(&self) -> &StreamCounters {
        &self.counters
    }

    /// Registration handle, if registration succeeded
    pub fn registration(&self) -> Option<&RegistrationHandle> {
        self.registration.get()
    }

    /// Snapshot of the session's state and statistics
    pub fn stats(&self) -> SessionStats {
        let (phase, source_url, started_at) = {
            let control = self.control.lock();
            (control.phase, control.source_url.clone(), control.started_at)
        };
        let sample = self.counters.last_sample();

        SessionStats {
            id: self.id.clone(),
            phase,
            source_url,
            output_url: self.output_url(),
            total_packets: self.counters.total_packets(),
            total_bytes: self.counters.total_bytes(),
            bitrate: sample.bitrate,
            packet_rate: sample.packet_rate,
            age: self.created_at.elapsed(),
            active_for: started_at.map(|t| t.elapsed()),
        }
    }
}

impl Drop for RecordSession {
    fn drop(&mut self) {
        self.release();
        self.timer.kill();
        self.control.get_mut().phase = SessionPhase::Destroyed;

        if let Some(handle) = self.registration.get() {
            self.deps.registry.unregister(handle);
            tracing::info!(session = %self.id, "Session destroyed");
        }
    }
}

impl std::fmt::Debug for RecordSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordSession")
            .field("id", &self.id)
            .field("phase", &self.phase())
            .field("total_packets", &self.counters.total_packets())
            .field("total_bytes", &self.counters.total_bytes())
            .finish()
    }
}
