//! # mgw-synth: Response Synthesizer
//!
//! Turns a configured operation and one inbound call into a synthetic HTTP
//! response. No backend is contacted: the response is produced entirely by
//! mapping templates evaluated against the call.
//!
//! ## Modules
//!
//! - [`config`]: the YAML document describing resource servers and operations.
//! - [`gateway`]: load-time validation and routing over compiled operations.
//! - [`synthesizer`]: the per-call pipeline (authorize, map, select, map).
//! - [`request`], [`response`]: the call going in and the outcome coming out.
//!
//! ## Crate Policy
//!
//! - Configuration errors surface at load time, never per call.
//! - A [`Gateway`] is immutable after load and safe to share across threads.
//! - Synthesis never panics and never fails: every error becomes a response.

pub mod config;
pub mod error;
pub mod gateway;
pub mod operation;
pub mod request;
pub mod response;
pub mod routing;
pub mod synthesizer;

pub use config::GatewayConfig;
pub use error::{ConfigError, SynthesisError};
pub use gateway::{Gateway, Route};
pub use operation::{IntegrationResponse, OperationSpec, PassthroughBehavior, RequestMapping};
pub use request::RequestContext;
pub use response::{ErrorBody, ErrorDetail, SynthesizedResponse};
pub use routing::{Method, ResourcePath};
pub use synthesizer::ResponseSynthesizer;
