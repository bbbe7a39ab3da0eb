//! Session registry implementation
//!
//! The concurrent identifier-to-session index shared by the control plane,
//! the timeout tasks and the frame callbacks.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::entry::{RegistrationHandle, RegistryEntry};
use super::error::RegistryError;
use super::id::SessionId;

/// Central registry for all live sessions
///
/// All mutation of the backing map happens under one mutex. The lock is
/// never held while a session is dropped: callers receive upgraded `Arc`s
/// only after the guard has been released.
pub struct SessionRegistry<T> {
    /// Map of session id to entry
    sessions: Mutex<HashMap<SessionId, RegistryEntry<T>>>,

    /// Source of registration tokens
    next_token: AtomicU64,
}

impl<T> SessionRegistry<T> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            next_token: AtomicU64::new(1),
        }
    }

    /// Register a session under `id`
    ///
    /// Fails if a live session is already registered under the same id. An
    /// entry whose session has no holders left (its destructor is running)
    /// is replaced.
    pub fn register(
        &self,
        id: &SessionId,
        session: &Arc<T>,
    ) -> Result<RegistrationHandle, RegistryError> {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let mut sessions = self.sessions.lock();

        if let Some(existing) = sessions.get(id) {
            if existing.is_live() {
                tracing::debug!(
                    session = %id,
                    ref_count = existing.ref_count(),
                    "Duplicate session registration rejected"
                );
                return Err(RegistryError::DuplicateIdentifier(id.clone()));
            }
            tracing::debug!(session = %id, "Replacing stale registry entry");
        }

        sessions.insert(id.clone(), RegistryEntry::new(session, token));

        tracing::debug!(
            session = %id,
            sessions = sessions.len(),
            "Session registered"
        );

        Ok(RegistrationHandle {
            id: id.clone(),
            token,
        })
    }

    /// Look up the live session for `id`
    pub fn lookup(&self, id: &SessionId) -> Option<Arc<T>> {
        let sessions = self.sessions.lock();
        let found = sessions.get(id).and_then(|entry| entry.session.upgrade());
        drop(sessions);
        found
    }

    /// Whether a live session is registered under `id`
    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions
            .lock()
            .get(id)
            .is_some_and(RegistryEntry::is_live)
    }

    /// Reference count observed for the entry `handle` was issued for
    ///
    /// Returns 0 if the entry has been removed or replaced.
    pub fn ref_count(&self, handle: &RegistrationHandle) -> usize {
        self.sessions
            .lock()
            .get(&handle.id)
            .filter(|entry| entry.matches(handle))
            .map_or(0, RegistryEntry::ref_count)
    }

    /// Remove the entry `handle` was issued for
    ///
    /// This is a no-op while any holder still owns the session, or if the
    /// entry has already been removed or replaced. Returns whether an entry
    /// was removed.
    pub fn unregister(&self, handle: &RegistrationHandle) -> bool {
        let mut sessions = self.sessions.lock();

        let removable = match sessions.get(&handle.id) {
            Some(entry) if entry.matches(handle) => {
                let ref_count = entry.ref_count();
                if ref_count != 0 {
                    tracing::debug!(
                        session = %handle.id,
                        ref_count = ref_count,
                        "Session still referenced, unregister deferred"
                    );
                }
                ref_count == 0
            }
            _ => false,
        };

        if removable {
            if let Some(entry) = sessions.remove(&handle.id) {
                tracing::debug!(
                    session = %handle.id,
                    registered_secs = entry.registered_at.elapsed().as_secs(),
                    sessions = sessions.len(),
                    "Session unregistered"
                );
            }
        }

        removable
    }

    /// All live sessions
    pub fn live_sessions(&self) -> Vec<Arc<T>> {
        let sessions = self.sessions.lock();
        let live: Vec<Arc<T>> = sessions
            .values()
            .filter_map(|entry| entry.session.upgrade())
            .collect();
        drop(sessions);
        live
    }

    /// Number of entries in the registry
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Whether the registry has no entries
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}

impl<T> Default for SessionRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
