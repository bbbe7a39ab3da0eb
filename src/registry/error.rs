//! Registry error types

use super::id::SessionId;

/// Error type for registry operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    /// A live session is already registered under this identifier
    #[error("session already registered: {0}")]
    DuplicateIdentifier(SessionId),
}
