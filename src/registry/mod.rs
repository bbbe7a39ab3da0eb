//! Session registry
//!
//! The registry indexes live recording sessions by identifier. It never
//! owns a session: each entry holds a `Weak` reference, and the number of
//! strong `Arc` holders (control plane, timeout task, in-flight frame
//! callbacks) is the entry's reference count.
//!
//! # Architecture
//!
//! ```text
//!                       Arc<SessionRegistry>
//!                  ┌──────────────────────────────┐
//!                  │ Mutex<HashMap<SessionId,     │
//!                  │   RegistryEntry {            │
//!                  │     session: Weak<Session>,  │
//!                  │     token,                   │
//!                  │   }                          │
//!                  │ >>                           │
//!                  └──────────────┬───────────────┘
//!                                 │ lookup() upgrades
//!         ┌───────────────────────┼───────────────────────┐
//!         ▼                       ▼                       ▼
//!   [Control plane]         [Timeout task]         [Frame callback]
//!   Arc<Session>            Arc<Session>           Arc<Session> (per frame)
//!         │                       │                       │
//!         └──── last Arc dropped ─┴──► Drop ──► unregister(handle)
//! ```
//!
//! Lookups upgrade the weak reference while the registry lock is held and
//! hand the resulting `Arc` out after the lock is released, so a session's
//! destructor never runs with the registry lock held.

pub mod entry;
pub mod error;
pub mod id;
pub mod store;

pub use entry::RegistrationHandle;
pub use error::RegistryError;
pub use id::SessionId;
pub use store::SessionRegistry;
