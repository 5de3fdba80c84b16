//! # Scope Grants
//!
//! A `ScopeGrant` names one permission: a scope defined by a resource server.
//! Its canonical string is `"{resource_server}/{scope}"`, the form that appears
//! in a credential's `scope` claim and in an operation's required-scope set.
//!
//! ## Injectivity
//!
//! Scope names may not contain `/` and neither part may contain whitespace,
//! so the canonical string splits back into exactly one pair at its last `/`.
//! Resource-server identifiers may themselves contain `/` (URL-style
//! identifiers are common).

use serde::{Deserialize, Serialize};

use crate::error::ScopeError;

/// A (resource server, scope name) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeGrant {
    resource_server: String,
    scope: String,
}

impl ScopeGrant {
    /// Validate and build a grant.
    pub fn new(
        resource_server: impl Into<String>,
        scope: impl Into<String>,
    ) -> Result<Self, ScopeError> {
        let resource_server = resource_server.into();
        let scope = scope.into();

        if resource_server.is_empty() {
            return Err(ScopeError::InvalidResourceServer {
                value: resource_server,
                reason: "must not be empty",
            });
        }
        if resource_server.chars().any(char::is_whitespace) {
            return Err(ScopeError::InvalidResourceServer {
                value: resource_server,
                reason: "must not contain whitespace",
            });
        }
        if scope.is_empty() {
            return Err(ScopeError::InvalidScopeName {
                value: scope,
                reason: "must not be empty",
            });
        }
        if scope.chars().any(char::is_whitespace) {
            return Err(ScopeError::InvalidScopeName {
                value: scope,
                reason: "must not contain whitespace",
            });
        }
        if scope.contains('/') {
            return Err(ScopeError::InvalidScopeName {
                value: scope,
                reason: "must not contain '/'",
            });
        }

        Ok(Self {
            resource_server,
            scope,
        })
    }

    /// Resource-server identifier.
    pub fn resource_server(&self) -> &str {
        &self.resource_server
    }

    /// Scope name within the resource server.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// The `"{resource_server}/{scope}"` identifier used for comparisons.
    pub fn canonical(&self) -> CanonicalScope {
        CanonicalScope(format!("{}/{}", self.resource_server, self.scope))
    }
}

/// Canonical scope string, as carried in credentials and required-scope sets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalScope(String);

impl CanonicalScope {
    /// Wrap a scope string taken from a credential's `scope` claim.
    ///
    /// Granted scopes are compared, never interpreted, so no validation is
    /// applied here. Required scopes come from [`ScopeGrant::canonical`].
    pub fn granted(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the scope text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split back into (resource server, scope name) at the last `/`.
    pub fn split(&self) -> Option<(&str, &str)> {
        self.0.rsplit_once('/')
    }
}

impl std::fmt::Display for CanonicalScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
