//! # Route Handlers
//!
//! - [`dispatch`]: every path not claimed by a fixed route, matched against
//!   configured operations.
//! - [`hooks`]: identity-provider callbacks.

pub mod dispatch;
pub mod hooks;
