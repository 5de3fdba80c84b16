//! # Verification Keys
//!
//! Key material is fetched by an external collaborator and handed to the
//! gateway either as an HMAC secret or as a JWKS document on disk. Once
//! loaded, a [`KeyStore`] is immutable.
//!
//! ## Key selection
//!
//! A credential whose header names a `kid` is verified only by the key with
//! that id, or by an id-less key when none matches. Without a `kid`, the first
//! key whose family accepts the header's algorithm is used.

use std::fmt;
use std::path::{Path, PathBuf};

use jsonwebtoken::jwk::{AlgorithmParameters, EllipticCurve, Jwk, JwkSet};
use jsonwebtoken::{Algorithm, DecodingKey, Header};
use serde::Deserialize;
use thiserror::Error;

const HMAC_ALGORITHMS: &[Algorithm] = &[Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
const RSA_ALGORITHMS: &[Algorithm] = &[
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
];

/// Error while loading key material.
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("a key entry must set exactly one of secret_env, secret, jwks_file")]
    AmbiguousSource,

    #[error("environment variable {0} is not set")]
    MissingSecretEnv(String),

    #[error("HMAC secret must not be empty")]
    EmptySecret,

    #[error("failed to read JWKS file {path}: {source}")]
    ReadJwks {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JWKS document {path}: {source}")]
    ParseJwks {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("unsupported JWK {kid:?}: {reason}")]
    UnsupportedJwk { kid: Option<String>, reason: String },

    #[error("no verification keys configured")]
    NoKeys,
}

/// One configured key entry.
#[derive(Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeySource {
    /// Key id matched against the credential header's `kid`.
    #[serde(default)]
    pub kid: Option<String>,
    /// Name of the environment variable holding an HMAC secret.
    #[serde(default)]
    pub secret_env: Option<String>,
    /// Inline HMAC secret. Development only.
    #[serde(default)]
    pub secret: Option<String>,
    /// Path to a JWKS document, relative to the configuration file.
    #[serde(default)]
    pub jwks_file: Option<PathBuf>,
}

impl fmt::Debug for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySource")
            .field("kid", &self.kid)
            .field("secret_env", &self.secret_env)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("jwks_file", &self.jwks_file)
            .finish()
    }
}

#[derive(Clone)]
struct VerificationKey {
    kid: Option<String>,
    key: DecodingKey,
    algorithms: Vec<Algorithm>,
}

/// Immutable set of verification keys.
#[derive(Clone, Default)]
pub struct KeyStore {
    keys: Vec<VerificationKey>,
}

impl fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.keys.iter().map(|k| (k.kid.as_deref(), &k.algorithms)))
            .finish()
    }
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every configured source. Relative JWKS paths resolve against `base_dir`.
    pub fn from_sources(sources: &[KeySource], base_dir: &Path) -> Result<Self, KeyError> {
        let mut store = Self::new();
        for source in sources {
            match (&source.secret_env, &source.secret, &source.jwks_file) {
                (Some(var), None, None) => {
                    let secret =
                        std::env::var(var).map_err(|_| KeyError::MissingSecretEnv(var.clone()))?;
                    store.add_hmac(source.kid.clone(), secret.as_bytes())?;
                }
                (None, Some(secret), None) => {
                    store.add_hmac(source.kid.clone(), secret.as_bytes())?;
                }
                (None, None, Some(path)) => {
                    let path = base_dir.join(path);
                    let text = std::fs::read_to_string(&path).map_err(|source| {
                        KeyError::ReadJwks {
                            path: path.clone(),
                            source,
                        }
                    })?;
                    let set: JwkSet = serde_json::from_str(&text)
                        .map_err(|source| KeyError::ParseJwks { path, source })?;
                    store.add_jwks(&set)?;
                }
                _ => return Err(KeyError::AmbiguousSource),
            }
        }
        if store.is_empty() {
            return Err(KeyError::NoKeys);
        }
        tracing::debug!(keys = store.len(), "verification keys loaded");
        Ok(store)
    }

    /// Add an HMAC secret accepting HS256, HS384 and HS512.
    pub fn add_hmac(&mut self, kid: Option<String>, secret: &[u8]) -> Result<(), KeyError> {
        if secret.is_empty() {
            return Err(KeyError::EmptySecret);
        }
        self.keys.push(VerificationKey {
            kid,
            key: DecodingKey::from_secret(secret),
            algorithms: HMAC_ALGORITHMS.to_vec(),
        });
        Ok(())
    }

    /// Add every key of a JWKS document.
    pub fn add_jwks(&mut self, set: &JwkSet) -> Result<(), KeyError> {
        for jwk in &set.keys {
            self.add_jwk(jwk)?;
        }
        Ok(())
    }

    fn add_jwk(&mut self, jwk: &Jwk) -> Result<(), KeyError> {
        let kid = jwk.common.key_id.clone();
        let unsupported = |reason: &str| KeyError::UnsupportedJwk {
            kid: kid.clone(),
            reason: reason.to_string(),
        };
        let algorithms = match &jwk.algorithm {
            AlgorithmParameters::RSA(_) => RSA_ALGORITHMS.to_vec(),
            AlgorithmParameters::OctetKey(_) => HMAC_ALGORITHMS.to_vec(),
            AlgorithmParameters::EllipticCurve(params) => match params.curve {
                EllipticCurve::P256 => vec![Algorithm::ES256],
                EllipticCurve::P384 => vec![Algorithm::ES384],
                _ => return Err(unsupported("only P-256 and P-384 curves are supported")),
            },
            AlgorithmParameters::OctetKeyPair(params) => match params.curve {
                EllipticCurve::Ed25519 => vec![Algorithm::EdDSA],
                _ => return Err(unsupported("only Ed25519 octet key pairs are supported")),
            },
        };
        let key = DecodingKey::from_jwk(jwk).map_err(|e| unsupported(&e.to_string()))?;
        self.keys.push(VerificationKey {
            kid,
            key,
            algorithms,
        });
        Ok(())
    }

    /// Pick the key that verifies a credential with this header.
    pub(crate) fn select(&self, header: &Header) -> Option<(&DecodingKey, &[Algorithm])> {
        let accepts = |k: &&VerificationKey| k.algorithms.contains(&header.alg);
        let found = match &header.kid {
            Some(kid) => self
                .keys
                .iter()
                .filter(accepts)
                .find(|k| k.kid.as_deref() == Some(kid.as_str()))
                .or_else(|| self.keys.iter().filter(accepts).find(|k| k.kid.is_none())),
            None => self.keys.iter().find(accepts),
        };
        found.map(|k| (&k.key, k.algorithms.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn header(alg: Algorithm, kid: Option<&str>) -> Header {
        let mut header = Header::new(alg);
        header.kid = kid.map(String::from);
        header
    }

    #[test]
    fn inline_secret_loads() {
        let sources = vec![KeySource {
            secret: Some("dev-secret".into()),
            ..KeySource::default()
        }];
        let store = KeyStore::from_sources(&sources, Path::new(".")).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.select(&header(Algorithm::HS256, None)).is_some());
        assert!(store.select(&header(Algorithm::RS256, None)).is_none());
    }

    #[test]
    fn secret_env_must_exist() {
        let sources = vec![KeySource {
            secret_env: Some("MGW_AUTH_TEST_SECRET_THAT_IS_NEVER_SET".into()),
            ..KeySource::default()
        }];
        assert!(matches!(
            KeyStore::from_sources(&sources, Path::new(".")),
            Err(KeyError::MissingSecretEnv(_))
        ));
    }

    #[test]
    fn ambiguous_or_empty_sources_fail() {
        let both = vec![KeySource {
            secret: Some("a".into()),
            secret_env: Some("B".into()),
            ..KeySource::default()
        }];
        assert!(matches!(
            KeyStore::from_sources(&both, Path::new(".")),
            Err(KeyError::AmbiguousSource)
        ));
        assert!(matches!(
            KeyStore::from_sources(&[], Path::new(".")),
            Err(KeyError::NoKeys)
        ));
    }

    #[test]
    fn kid_selects_matching_key() {
        let mut store = KeyStore::new();
        store.add_hmac(Some("a".into()), b"secret-a").unwrap();
        store.add_hmac(Some("b".into()), b"secret-b").unwrap();
        assert!(store.select(&header(Algorithm::HS256, Some("b"))).is_some());
        assert!(store.select(&header(Algorithm::HS256, Some("zzz"))).is_none());
    }

    #[test]
    fn jwks_file_with_oct_key_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jwks.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{"keys":[{{"kty":"oct","kid":"k1","k":"c2VjcmV0LXNlY3JldC1zZWNyZXQtMTIz"}}]}}"#
        )
        .unwrap();

        let sources = vec![KeySource {
            jwks_file: Some(PathBuf::from("jwks.json")),
            ..KeySource::default()
        }];
        let store = KeyStore::from_sources(&sources, dir.path()).unwrap();
        assert!(store.select(&header(Algorithm::HS512, Some("k1"))).is_some());
    }

    #[test]
    fn missing_jwks_file_fails() {
        let sources = vec![KeySource {
            jwks_file: Some(PathBuf::from("does-not-exist.json")),
            ..KeySource::default()
        }];
        assert!(matches!(
            KeyStore::from_sources(&sources, Path::new("/nonexistent")),
            Err(KeyError::ReadJwks { .. })
        ));
    }

    #[test]
    fn debug_redacts_secrets() {
        let source = KeySource {
            secret: Some("hunter2".into()),
            ..KeySource::default()
        };
        assert!(!format!("{source:?}").contains("hunter2"));
    }
}
