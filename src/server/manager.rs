//! Recording control plane
//!
//! `RecordManager` is the entry point the rest of the server talks to. It
//! owns the registry and the collaborator factories and hands out
//! `Arc<RecordSession>` handles.

use std::sync::Arc;

use crate::client::PullClientFactory;
use crate::error::{Error, Result};
use crate::registry::SessionId;
use crate::session::{RecordRegistry, RecordSession, SessionDeps};
use crate::sink::HlsSinkFactory;
use crate::stats::SessionStats;

use super::config::RecordConfig;

/// Creates, starts and releases recording sessions
pub struct RecordManager {
    deps: SessionDeps,
}

impl RecordManager {
    /// Create a manager with its own empty registry
    pub fn new(
        config: RecordConfig,
        clients: Arc<dyn PullClientFactory>,
        sinks: Arc<dyn HlsSinkFactory>,
    ) -> Self {
        Self {
            deps: SessionDeps {
                config: Arc::new(config),
                registry: Arc::new(RecordRegistry::new()),
                clients,
                sinks,
            },
        }
    }

    /// Shared configuration
    pub fn config(&self) -> &Arc<RecordConfig> {
        &self.deps.config
    }

    /// The session registry
    pub fn registry(&self) -> &Arc<RecordRegistry> {
        &self.deps.registry
    }

    /// Create and register a session
    ///
    /// Must be called from within a tokio runtime.
    pub fn create_session(&self, id: impl Into<SessionId>) -> Result<Arc<RecordSession>> {
        let id = id.into();
        RecordSession::create(id.clone(), self.deps.clone()).inspect_err(|e| {
            tracing::warn!(session = %id, error = %e, "Session creation failed");
        })
    }

    /// Start (or re-arm) a session
    pub fn start_session(
        &self,
        session: &RecordSession,
        source_url: &str,
        timeout_secs: u32,
    ) -> Result<()> {
        session.start(source_url, timeout_secs)
    }

    /// Find the session for `id`, creating it if needed, and start it
    ///
    /// A creator that loses a concurrent registration race uses the winner's
    /// session.
    pub fn start_recording(
        &self,
        id: impl Into<SessionId>,
        source_url: &str,
        timeout_secs: u32,
    ) -> Result<Arc<RecordSession>> {
        let id = id.into();

        let session = match self.lookup(&id) {
            Some(session) => session,
            None => match self.create_session(id.clone()) {
                Ok(session) => session,
                Err(Error::DuplicateIdentifier(_)) => self
                    .lookup(&id)
                    .ok_or_else(|| Error::DuplicateIdentifier(id.clone()))?,
                Err(e) => return Err(e),
            },
        };

        session.start(source_url, timeout_secs)?;
        Ok(session)
    }

    /// Live session for `id`
    pub fn lookup(&self, id: &SessionId) -> Option<Arc<RecordSession>> {
        self.deps.registry.lookup(id)
    }

    /// Playlist locator of a session
    pub fn output_url(&self, session: &RecordSession) -> Option<String> {
        session.output_url()
    }

    /// Source locator of a session
    pub fn source_url(&self, session: &RecordSession) -> Option<String> {
        session.source_url()
    }

    /// Release a session and give up the caller's reference
    ///
    /// Closes both handles, stops the timeout task and waits for it to
    /// exit. Once every other holder has dropped its reference the session
    /// is destroyed and disappears from the registry.
    pub async fn release_session(&self, session: Arc<RecordSession>) {
        session.release();
        session.kill();

        let join = session.timer().take_join();
        let id = session.id().clone();
        drop(session);

        if let Some(join) = join {
            if let Err(e) = join.await {
                tracing::warn!(session = %id, error = %e, "Timeout task did not exit cleanly");
            }
        }
    }

    /// Release every live session
    pub async fn shutdown(&self) {
        let sessions = self.deps.registry.live_sessions();
        tracing::info!(sessions = sessions.len(), "Releasing all sessions");

        for session in sessions {
            self.release_session(session).await;
        }
    }

    /// Snapshots of all live sessions
    pub fn sessions(&self) -> Vec<SessionStats> {
        self.deps
            .registry
            .live_sessions()
            .iter()
            .map(|session| session.stats())
            .collect()
    }

    /// Number of live sessions
    pub fn session_count(&self) -> usize {
        self.deps.registry.live_sessions().len()
    }
}
