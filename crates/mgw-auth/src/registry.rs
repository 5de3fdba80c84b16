//! # Scope Registry
//!
//! Holds every (resource server, scope) pair the gateway knows about. Built
//! once while loading configuration, then shared read-only.

use std::collections::BTreeMap;

use mgw_core::{CanonicalScope, ScopeError, ScopeGrant};

/// Registered scope grants, keyed by canonical string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeRegistry {
    grants: BTreeMap<CanonicalScope, ScopeGrant>,
}

impl ScopeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a grant definition. Fails with `DuplicateScope` if the pair exists.
    pub fn register(
        &mut self,
        resource_server: &str,
        scope: &str,
    ) -> Result<CanonicalScope, ScopeError> {
        let grant = ScopeGrant::new(resource_server, scope)?;
        let canonical = grant.canonical();
        if self.grants.contains_key(&canonical) {
            return Err(ScopeError::DuplicateScope(canonical));
        }
        self.grants.insert(canonical.clone(), grant);
        Ok(canonical)
    }

    /// Canonical string of a registered pair. Fails with `UnknownScope` otherwise.
    pub fn canonical(
        &self,
        resource_server: &str,
        scope: &str,
    ) -> Result<CanonicalScope, ScopeError> {
        let unknown = || ScopeError::UnknownScope {
            resource_server: resource_server.to_string(),
            scope: scope.to_string(),
        };
        let canonical = ScopeGrant::new(resource_server, scope)
            .map_err(|_| unknown())?
            .canonical();
        if self.grants.contains_key(&canonical) {
            Ok(canonical)
        } else {
            Err(unknown())
        }
    }

    /// Whether a canonical scope string is registered.
    pub fn contains(&self, scope: &CanonicalScope) -> bool {
        self.grants.contains_key(scope)
    }

    /// Registered grants in canonical order.
    pub fn grants(&self) -> impl Iterator<Item = &ScopeGrant> {
        self.grants.values()
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}
