//! Error types for recording sessions
//!
//! Every failure that crosses a public boundary is one of the variants
//! below. The frame callback handed to the pull client reports them as
//! integer status codes (see [`Error::status_code`]).

use crate::registry::{RegistryError, SessionId};

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Status code reported for a successfully handled frame
pub const STATUS_OK: i32 = 0;

/// Error type for session operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// A session with this identifier is already registered
    #[error("session already registered: {0}")]
    DuplicateIdentifier(SessionId),

    /// The pull-protocol client could not be created or opened
    #[error("pull client request failed for {source_url}: {reason}")]
    RequestFailed {
        /// Source locator that was being opened
        source_url: String,
        /// Collaborator-provided failure description
        reason: String,
    },

    /// The HLS sink could not be created
    #[error("hls sink unavailable")]
    Unimplemented,

    /// The frame cannot be handled in its current form
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// The session has no sink yet (start has not completed)
    #[error("session not ready")]
    NotReady,
}

impl Error {
    /// Integer result code for this error
    ///
    /// Codes are stable and negative so they can be returned through the
    /// pull client's `int` callback contract, where 0 means success.
    pub fn status_code(&self) -> i32 {
        match self {
            Error::DuplicateIdentifier(_) => -1,
            Error::RequestFailed { .. } => -2,
            Error::Unimplemented => -3,
            Error::InvalidState(_) => -4,
            Error::NotReady => -5,
        }
    }
}

impl From<RegistryError> for Error {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::DuplicateIdentifier(id) => Error::DuplicateIdentifier(id),
        }
    }
}

/// Convert a handler result into the callback status code
pub fn status_of(result: &Result<()>) -> i32 {
    match result {
        Ok(()) => STATUS_OK,
        Err(e) => e.status_code(),
    }
}
