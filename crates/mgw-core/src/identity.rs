//! # Request Identifiers
//!
//! The request identifier is opaque to every layer below the transport.
//! Templates substitute it verbatim; nothing parses it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier assigned to one inbound call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a fresh random identifier (UUID v4, hyphenated).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an identifier supplied by the caller of the evaluator.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
