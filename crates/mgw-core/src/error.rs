//! # Error Types
//!
//! Configuration-time errors shared across the workspace. Scope errors are
//! fatal at load time and never observable per call.

use thiserror::Error;

use crate::scope::CanonicalScope;

/// Error while defining or resolving a scope grant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// Resource-server identifier is empty or contains whitespace.
    #[error("invalid resource server identifier {value:?}: {reason}")]
    InvalidResourceServer {
        /// The rejected identifier.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Scope name is empty, contains whitespace, or contains `/`.
    #[error("invalid scope name {value:?}: {reason}")]
    InvalidScopeName {
        /// The rejected scope name.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The (resource server, scope) pair is already registered.
    #[error("duplicate scope: {0}")]
    DuplicateScope(CanonicalScope),

    /// The (resource server, scope) pair was never registered.
    #[error("unknown scope: {resource_server}/{scope}")]
    UnknownScope {
        /// Resource-server identifier that was looked up.
        resource_server: String,
        /// Scope name that was looked up.
        scope: String,
    },
}

/// Error while building a fixed header set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    /// Header name is not an RFC 7230 token.
    #[error("invalid header name: {0:?}")]
    InvalidName(String),

    /// Header value is not visible ASCII, space, or tab.
    #[error("invalid value for header {name}")]
    InvalidValue {
        /// Header whose value was rejected.
        name: String,
    },
}
