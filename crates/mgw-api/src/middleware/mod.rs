//! # Middleware
//!
//! - [`cors`]: CORS headers on every error response the transport emits.

pub mod cors;
