//! # Authorization Gate
//!
//! Verifies a bearer credential and checks its granted scopes against an
//! operation's required set. The gate is a local check against already-loaded
//! key material: no I/O, no shared mutable state.
//!
//! ## Checks, in order
//!
//! 1. Signature, with a key selected by the header's `kid` and algorithm.
//! 2. `exp`, which must be present. Leeway defaults to zero.
//! 3. Optional `iss`, client allow-list (`client_id` or `aud`), and `token_use`.
//! 4. Required scopes must be a subset of the granted scopes.
//!
//! Steps 1-3 fail with [`Denied::InvalidCredential`], step 4 with
//! [`Denied::InsufficientScope`].

use std::collections::BTreeSet;
use std::path::Path;

use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::Validation;
use mgw_core::CanonicalScope;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::credential::Credential;
use crate::keys::{KeyError, KeySource, KeyStore};

/// Why a credential was not accepted.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialFault {
    #[error("missing bearer credential")]
    Missing,
    #[error("malformed credential")]
    Malformed,
    #[error("no verification key matches the credential")]
    UnknownKey,
    #[error("signature verification failed")]
    BadSignature,
    #[error("credential has expired")]
    Expired,
    #[error("credential has no expiry")]
    MissingExpiry,
    #[error("credential issuer is not trusted")]
    UntrustedIssuer,
    #[error("credential was issued to an unrecognised client")]
    UnknownClient,
    #[error("credential is not of the accepted token use")]
    WrongTokenUse,
}

impl CredentialFault {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Malformed => "malformed",
            Self::UnknownKey => "unknown_key",
            Self::BadSignature => "bad_signature",
            Self::Expired => "expired",
            Self::MissingExpiry => "missing_expiry",
            Self::UntrustedIssuer => "untrusted_issuer",
            Self::UnknownClient => "unknown_client",
            Self::WrongTokenUse => "wrong_token_use",
        }
    }
}

/// Authorization outcome other than success.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Denied {
    /// Signature, expiry, or claim checks failed.
    #[error("invalid credential: {0}")]
    InvalidCredential(CredentialFault),

    /// The credential is valid but lacks required scopes.
    #[error("insufficient scope: missing {}", join(.missing))]
    InsufficientScope {
        required: BTreeSet<CanonicalScope>,
        missing: BTreeSet<CanonicalScope>,
    },
}

fn join(scopes: &BTreeSet<CanonicalScope>) -> String {
    scopes
        .iter()
        .map(CanonicalScope::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

impl Denied {
    /// HTTP status class: 401 for bad credentials, 403 for missing scopes.
    pub fn status(&self) -> u16 {
        match self {
            Self::InvalidCredential(_) => 401,
            Self::InsufficientScope { .. } => 403,
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredential(_) => "INVALID_CREDENTIAL",
            Self::InsufficientScope { .. } => "INSUFFICIENT_SCOPE",
        }
    }

    /// Label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::InvalidCredential(fault) => fault.label(),
            Self::InsufficientScope { .. } => "insufficient_scope",
        }
    }

    /// `WWW-Authenticate` value per RFC 6750 section 3.
    pub fn www_authenticate(&self) -> String {
        match self {
            Self::InvalidCredential(CredentialFault::Missing) => "Bearer".to_string(),
            Self::InvalidCredential(fault) => format!(
                "Bearer error=\"invalid_token\", error_description=\"{fault}\""
            ),
            Self::InsufficientScope { required, .. } => format!(
                "Bearer error=\"insufficient_scope\", scope=\"{}\"",
                join(required)
            ),
        }
    }
}

/// A credential that passed every check.
#[derive(Debug, Clone, PartialEq)]
pub struct Authorized {
    pub credential: Credential,
}

/// `auth` section of the gateway configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GateConfig {
    pub keys: Vec<KeySource>,
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub allowed_clients: Vec<String>,
    #[serde(default)]
    pub token_use: Option<String>,
    #[serde(default)]
    pub leeway_secs: u64,
}

/// Verifies bearer credentials against loaded keys and claim policy.
#[derive(Debug, Clone)]
pub struct AuthorizationGate {
    keys: KeyStore,
    issuer: Option<String>,
    allowed_clients: Vec<String>,
    token_use: Option<String>,
    leeway_secs: u64,
}

impl AuthorizationGate {
    /// A gate that only checks signature, expiry, and scopes.
    pub fn new(keys: KeyStore) -> Self {
        Self {
            keys,
            issuer: None,
            allowed_clients: Vec::new(),
            token_use: None,
            leeway_secs: 0,
        }
    }

    /// Build a gate from configuration, loading key material.
    pub fn from_config(config: &GateConfig, base_dir: &Path) -> Result<Self, KeyError> {
        let keys = KeyStore::from_sources(&config.keys, base_dir)?;
        let mut gate = Self::new(keys).leeway(config.leeway_secs);
        if let Some(issuer) = &config.issuer {
            gate = gate.expected_issuer(issuer);
        }
        if let Some(token_use) = &config.token_use {
            gate = gate.expected_token_use(token_use);
        }
        Ok(gate.allowed_clients(config.allowed_clients.iter().cloned()))
    }

    /// Reject credentials whose `iss` differs.
    pub fn expected_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Accept only credentials issued to one of these clients.
    pub fn allowed_clients(mut self, clients: impl IntoIterator<Item = String>) -> Self {
        self.allowed_clients = clients.into_iter().collect();
        self
    }

    /// Reject credentials whose `token_use` differs (e.g. `access`).
    pub fn expected_token_use(mut self, token_use: impl Into<String>) -> Self {
        self.token_use = Some(token_use.into());
        self
    }

    /// Clock-skew allowance for `exp`, in seconds.
    pub fn leeway(mut self, seconds: u64) -> Self {
        self.leeway_secs = seconds;
        self
    }

    /// Verify a credential and check that it grants every required scope.
    pub fn authorize(
        &self,
        token: &str,
        required: &BTreeSet<CanonicalScope>,
    ) -> Result<Authorized, Denied> {
        let credential = self.verify(token).map_err(|fault| {
            tracing::warn!(reason = fault.label(), "credential rejected");
            Denied::InvalidCredential(fault)
        })?;

        let missing: BTreeSet<CanonicalScope> =
            required.difference(credential.scopes()).cloned().collect();
        if !missing.is_empty() {
            tracing::warn!(
                subject = credential.subject().unwrap_or("-"),
                missing = %join(&missing),
                "credential lacks required scopes"
            );
            return Err(Denied::InsufficientScope {
                required: required.clone(),
                missing,
            });
        }

        Ok(Authorized { credential })
    }

    /// Check signature, expiry, and claim policy without looking at scopes.
    pub fn verify(&self, token: &str) -> Result<Credential, CredentialFault> {
        let header = jsonwebtoken::decode_header(token).map_err(|_| CredentialFault::Malformed)?;
        let (key, algorithms) = self
            .keys
            .select(&header)
            .ok_or(CredentialFault::UnknownKey)?;

        let mut validation = Validation::new(header.alg);
        validation.algorithms = algorithms.to_vec();
        validation.leeway = self.leeway_secs;
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }

        let data = jsonwebtoken::decode::<Map<String, Value>>(token, key, &validation)
            .map_err(|e| match e.kind() {
                JwtErrorKind::ExpiredSignature => CredentialFault::Expired,
                JwtErrorKind::MissingRequiredClaim(_) => CredentialFault::MissingExpiry,
                JwtErrorKind::InvalidIssuer => CredentialFault::UntrustedIssuer,
                JwtErrorKind::InvalidSignature | JwtErrorKind::InvalidAlgorithm => {
                    CredentialFault::BadSignature
                }
                _ => CredentialFault::Malformed,
            })?;
        let credential = Credential::from_claims(data.claims);

        if !self.allowed_clients.is_empty() {
            let client_ok = credential
                .client_id()
                .into_iter()
                .chain(credential.audiences())
                .any(|c| self.allowed_clients.iter().any(|a| a == c));
            if !client_ok {
                return Err(CredentialFault::UnknownClient);
            }
        }
        if let Some(expected) = &self.token_use {
            if credential.token_use() != Some(expected.as_str()) {
                return Err(CredentialFault::WrongTokenUse);
            }
        }
        Ok(credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &[u8] = b"unit-test-secret";

    fn now() -> u64 {
        jsonwebtoken::get_current_timestamp()
    }

    fn mint(claims: Value) -> String {
        encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET)).unwrap()
    }

    fn gate() -> AuthorizationGate {
        let mut keys = KeyStore::new();
        keys.add_hmac(None, SECRET).unwrap();
        AuthorizationGate::new(keys)
    }

    fn required(scopes: &[&str]) -> BTreeSet<CanonicalScope> {
        scopes.iter().map(|s| CanonicalScope::granted(*s)).collect()
    }

    #[test]
    fn grants_when_required_is_subset() {
        let token = mint(json!({
            "sub": "user-1",
            "exp": now() + 600,
            "scope": "testResourceServer/test other/read",
        }));
        let ok = gate()
            .authorize(&token, &required(&["testResourceServer/test"]))
            .unwrap();
        assert_eq!(ok.credential.subject(), Some("user-1"));
    }

    #[test]
    fn missing_scope_names_only_missing_and_required() {
        let token = mint(json!({"exp": now() + 600, "scope": "rs/a"}));
        let denied = gate()
            .authorize(&token, &required(&["rs/a", "rs/b"]))
            .unwrap_err();
        assert_eq!(
            denied,
            Denied::InsufficientScope {
                required: required(&["rs/a", "rs/b"]),
                missing: required(&["rs/b"]),
            }
        );
        assert_eq!(denied.status(), 403);
    }

    #[test]
    fn expired_is_invalid_regardless_of_scopes() {
        let token = mint(json!({"exp": now() - 120, "scope": "rs/a"}));
        let denied = gate().authorize(&token, &required(&["rs/a"])).unwrap_err();
        assert_eq!(denied, Denied::InvalidCredential(CredentialFault::Expired));
        assert_eq!(denied.status(), 401);
    }

    #[test]
    fn leeway_accepts_recently_expired() {
        let token = mint(json!({"exp": now() - 5, "scope": "rs/a"}));
        assert!(gate().leeway(60).authorize(&token, &required(&["rs/a"])).is_ok());
    }

    #[test]
    fn exp_is_required() {
        let token = mint(json!({"scope": "rs/a"}));
        assert_eq!(
            gate().verify(&token).unwrap_err(),
            CredentialFault::MissingExpiry
        );
    }

    #[test]
    fn wrong_secret_is_bad_signature() {
        let token = encode(
            &Header::default(),
            &json!({"exp": now() + 600}),
            &EncodingKey::from_secret(b"another-secret"),
        )
        .unwrap();
        assert_eq!(gate().verify(&token).unwrap_err(), CredentialFault::BadSignature);
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(gate().verify("not-a-jwt").unwrap_err(), CredentialFault::Malformed);
    }

    #[test]
    fn issuer_is_checked_when_configured() {
        let token = mint(json!({"exp": now() + 600, "iss": "https://evil.example"}));
        let gate = gate().expected_issuer("https://idp.example");
        assert_eq!(gate.verify(&token).unwrap_err(), CredentialFault::UntrustedIssuer);
    }

    #[test]
    fn client_allow_list_accepts_client_id_or_aud() {
        let gate = gate().allowed_clients(["app".to_string()]);
        let by_client = mint(json!({"exp": now() + 600, "client_id": "app"}));
        let by_aud = mint(json!({"exp": now() + 600, "aud": ["x", "app"]}));
        let stranger = mint(json!({"exp": now() + 600, "client_id": "other"}));
        assert!(gate.verify(&by_client).is_ok());
        assert!(gate.verify(&by_aud).is_ok());
        assert_eq!(gate.verify(&stranger).unwrap_err(), CredentialFault::UnknownClient);
    }

    #[test]
    fn token_use_is_checked_when_configured() {
        let gate = gate().expected_token_use("access");
        let id_token = mint(json!({"exp": now() + 600, "token_use": "id"}));
        assert_eq!(gate.verify(&id_token).unwrap_err(), CredentialFault::WrongTokenUse);
    }

    #[test]
    fn www_authenticate_values() {
        assert_eq!(
            Denied::InvalidCredential(CredentialFault::Missing).www_authenticate(),
            "Bearer"
        );
        let insufficient = Denied::InsufficientScope {
            required: required(&["rs/a"]),
            missing: required(&["rs/a"]),
        };
        assert_eq!(
            insufficient.www_authenticate(),
            "Bearer error=\"insufficient_scope\", scope=\"rs/a\""
        );
    }
}
