//! File identifiers derived from caller-supplied names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Returns true for characters the key namespace accepts.
///
/// memcached allows a wider character set than this, but user-supplied
/// names are stripped down to a conservative allow-list before they ever
/// reach the backend.
fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// A sanitized identifier for a cached entry.
///
/// A `FileId` names one logical entry and prefixes every key that belongs
/// to it (chunks and metadata). Distinct input names can collide on the
/// same id after sanitization; callers that need name-based identity must
/// guarantee uniqueness upstream.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(String);

impl FileId {
    /// Map an arbitrary name to a key-namespace-safe identifier.
    ///
    /// Pure and total: strips every character outside the allow-list
    /// (ASCII letters, digits, hyphen, underscore). An empty input maps
    /// to the empty id, which is valid if degenerate.
    pub fn sanitize(name: &str) -> Self {
        Self(name.chars().filter(|c| is_allowed(*c)).collect())
    }

    /// Accept an already-mapped identifier, rejecting anything outside
    /// the allow-list.
    pub fn parse(id: &str) -> crate::Result<Self> {
        if id.chars().all(is_allowed) {
            Ok(Self(id.to_string()))
        } else {
            Err(crate::Error::InvalidFileId(id.to_string()))
        }
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileId({})", self.0)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
