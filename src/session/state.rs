//! Session state machine
//!
//! Tracks a recording session from registration to destruction.
//!
//! ```text
//! Created ──client open──► Starting ──sink open──► Active
//!    │                     │  ▲                     │
//!    │                     └──┘ start() retried     │
//!    └────────────release()───────────┬─────────────┘
//!                                     ▼
//!                                 Releasing ──last holder dropped──► Destroyed
//! ```
//!
//! A `start()` that cannot open the pull client leaves the phase as it
//! was. A released session may be started again; once its client is open
//! it moves back to `Starting`, with a new timeout task if the old one
//! has ended.

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Registered, timeout task scheduled, no external handles yet
    Created,
    /// Start requested, at least one handle still missing
    Starting,
    /// Pull client and sink both open, frames flowing
    Active,
    /// Handles released, waiting for the last holder to go away
    Releasing,
    /// Destructor has run
    Destroyed,
}

impl SessionPhase {
    pub fn name(&self) -> &'static str {
        match self {
            SessionPhase::Created => "created",
            SessionPhase::Starting => "starting",
            SessionPhase::Active => "active",
            SessionPhase::Releasing => "releasing",
            SessionPhase::Destroyed => "destroyed",
        }
    }

    /// Whether frames can currently be muxed
    pub fn is_active(&self) -> bool {
        *self == SessionPhase::Active
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
