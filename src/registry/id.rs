//! Session identifiers
//!
//! A session is keyed by an opaque byte string chosen by the control plane
//! (typically a camera or channel name). The bytes are never interpreted
//! beyond being rendered into directory names and URLs.

use bytes::Bytes;

/// Unique identifier for a recording session
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(Bytes);

impl SessionId {
    /// Create a session id from raw bytes
    pub fn new(id: impl Into<Bytes>) -> Self {
        Self(id.into())
    }

    /// Raw identifier bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Identifier length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the identifier is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(Bytes::from(s))
    }
}

impl From<&[u8]> for SessionId {
    fn from(b: &[u8]) -> Self {
        Self(Bytes::copy_from_slice(b))
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}
