//! Registry entries
//!
//! An entry binds an identifier to a session without owning it. The
//! session's lifetime belongs to whoever holds an `Arc` to it; the entry's
//! reference count is the number of those holders.

use std::sync::{Arc, Weak};
use std::time::Instant;

use super::id::SessionId;

/// Proof of a successful registration
///
/// Carries a registration token so that a stale handle (from a session that
/// has been replaced under the same identifier) can never remove the newer
/// entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationHandle {
    pub(super) id: SessionId,
    pub(super) token: u64,
}

impl RegistrationHandle {
    /// Identifier this handle was registered under
    pub fn id(&self) -> &SessionId {
        &self.id
    }
}

/// Entry for a single session in the registry
pub(super) struct RegistryEntry<T> {
    /// Non-owning reference to the session
    pub session: Weak<T>,

    /// Token matching the `RegistrationHandle` issued for this entry
    pub token: u64,

    /// When the entry was registered
    pub registered_at: Instant,
}

impl<T> RegistryEntry<T> {
    pub(super) fn new(session: &Arc<T>, token: u64) -> Self {
        Self {
            session: Arc::downgrade(session),
            token,
            registered_at: Instant::now(),
        }
    }

    /// Number of live holders of the session
    pub fn ref_count(&self) -> usize {
        self.session.strong_count()
    }

    /// Whether any holder still owns the session
    pub fn is_live(&self) -> bool {
        self.ref_count() > 0
    }

    /// Whether `handle` was issued for this entry
    pub fn matches(&self, handle: &RegistrationHandle) -> bool {
        self.token == handle.token
    }
}
