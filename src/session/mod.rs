//! Recording sessions
//!
//! A session pulls one live source and feeds it into one HLS sink:
//!
//! ```text
//!   pull client I/O thread                       tokio runtime
//!  ┌──────────────────────┐              ┌──────────────────────────┐
//!  │ FrameCallback(frame) │              │ timeout task             │
//!  └──────────┬───────────┘              │  tick ──► sample stats   │
//!             │ upgrade Weak             │  deadline ──► release    │
//!             ▼                          │  kill ──► stop           │
//!   RecordSession::process_data          └────────────┬─────────────┘
//!             │ media lock                            │ Arc<RecordSession>
//!             ▼                                       ▼
//!   dispatch_frame ──► counters ──► HlsSink     RecordSession
//! ```

pub mod dispatch;
pub mod record;
pub mod state;
pub mod timeout;

pub use record::{RecordRegistry, RecordSession, SessionDeps};
pub use state::SessionPhase;
pub use timeout::{TaskEvent, TaskOutcome, TaskState, TerminateReason, TimeoutHandle, TimeoutTask};
