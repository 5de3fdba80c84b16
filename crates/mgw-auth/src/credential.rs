//! Verified credential claims.

use std::collections::BTreeSet;

use mgw_core::CanonicalScope;
use serde_json::{Map, Value};

/// The claims of a credential whose signature and expiry have been checked.
///
/// Every claim is kept so the transport can expose it to templates under
/// `context.authorizer.claims`.
#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    claims: Map<String, Value>,
    scopes: BTreeSet<CanonicalScope>,
}

impl Credential {
    /// Wrap a verified claim set.
    pub fn from_claims(claims: Map<String, Value>) -> Self {
        let scopes = claims
            .get("scope")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .split_whitespace()
            .map(CanonicalScope::granted)
            .collect();
        Self { claims, scopes }
    }

    /// `sub` claim.
    pub fn subject(&self) -> Option<&str> {
        self.str_claim("sub")
    }

    /// `iss` claim.
    pub fn issuer(&self) -> Option<&str> {
        self.str_claim("iss")
    }

    /// `client_id` claim.
    pub fn client_id(&self) -> Option<&str> {
        self.str_claim("client_id")
    }

    /// `token_use` claim.
    pub fn token_use(&self) -> Option<&str> {
        self.str_claim("token_use")
    }

    /// `exp` claim in seconds since the epoch.
    pub fn expires_at(&self) -> Option<u64> {
        self.claims.get("exp").and_then(Value::as_u64)
    }

    /// `aud` claim, whether given as a string or an array.
    pub fn audiences(&self) -> Vec<&str> {
        match self.claims.get("aud") {
            Some(Value::String(aud)) => vec![aud.as_str()],
            Some(Value::Array(auds)) => auds.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Granted scopes parsed from the space-delimited `scope` claim.
    pub fn scopes(&self) -> &BTreeSet<CanonicalScope> {
        &self.scopes
    }

    /// All claims.
    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }

    fn str_claim(&self, name: &str) -> Option<&str> {
        self.claims.get(name).and_then(Value::as_str)
    }
}
