//! # mgw-core: Foundational Types for the Mock Gateway
//!
//! The mock gateway fronts a backend that does not exist: every call is
//! authorized against OAuth2-style scopes and answered by evaluating a pair
//! of mapping templates. This crate holds the small value types every other
//! crate agrees on.
//!
//! ## Key Design Principles
//!
//! 1. **Newtypes for identifiers.** `RequestId` and `CanonicalScope` are not
//!    bare strings; a scope string can only be produced from a validated
//!    `ScopeGrant`.
//!
//! 2. **Caller-supplied metadata.** `RequestId` and `RequestTime` are minted
//!    by the transport and passed down. Nothing below the transport reads the
//!    clock or generates identifiers on its own.
//!
//! 3. **Fixed headers are data.** `HeaderSet` and `CorsPolicy` describe static
//!    per-operation configuration; nothing computes a header value per call.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `mgw-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod headers;
pub mod identity;
pub mod scope;
pub mod temporal;

pub use error::{HeaderError, ScopeError};
pub use headers::{CorsPolicy, HeaderSet};
pub use identity::RequestId;
pub use scope::{CanonicalScope, ScopeGrant};
pub use temporal::RequestTime;
