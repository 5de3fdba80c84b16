//! # mgw-auth: Scopes, Credentials, and Account Bootstrap
//!
//! - [`ScopeRegistry`]: the resource-server scopes the gateway knows about.
//! - [`AuthorizationGate`]: bearer-credential verification and scope checks.
//! - [`bootstrap`]: the pre-sign-up hook that confirms new accounts.
//!
//! Credential issuance (implicit or authorization-code grants) happens at the
//! identity provider. The gate accepts any credential signed by a configured
//! key, whichever flow produced it.
//!
//! ## Crate Policy
//!
//! - The registry and gate are immutable once built and shared without locks.
//! - Secrets never appear in `Debug` output or logs.

pub mod bootstrap;
pub mod credential;
pub mod gate;
pub mod keys;
pub mod registry;

pub use credential::Credential;
pub use gate::{AuthorizationGate, Authorized, CredentialFault, Denied, GateConfig};
pub use keys::{KeyError, KeySource, KeyStore};
pub use registry::ScopeRegistry;
