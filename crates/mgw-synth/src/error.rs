//! # Synthesizer Errors
//!
//! [`ConfigError`] is fatal at load time. [`SynthesisError`] is per call and
//! never escapes the synthesizer: it is converted into a response with the
//! standard error headers.

use std::path::PathBuf;

use mgw_auth::{Denied, KeyError};
use mgw_core::{HeaderError, ScopeError};
use mgw_template::TemplateError;
use thiserror::Error;

/// Error while loading or validating gateway configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse YAML at {path}: {source}")]
    YamlParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("scope error: {0}")]
    Scope(#[from] ScopeError),

    #[error("key material: {0}")]
    Keys(#[from] KeyError),

    #[error("header error: {0}")]
    Header(#[from] HeaderError),

    #[error("operation {operation}: {which} template: {source}")]
    Template {
        operation: String,
        which: String,
        source: TemplateError,
    },

    #[error("invalid resource path {path:?}: {reason}")]
    InvalidResourcePath { path: String, reason: String },

    #[error("duplicate operation name {0:?}")]
    DuplicateOperation(String),

    #[error("operations {first:?} and {second:?} both answer {method} {path}")]
    DuplicateRoute {
        first: String,
        second: String,
        method: String,
        path: String,
    },

    #[error("operation {operation}: at least one required scope must be declared")]
    NoRequiredScopes { operation: String },

    #[error("operation {operation}: at least one integration response must be declared")]
    NoIntegrationResponses { operation: String },

    #[error("operation {operation}: status {status} is not a valid HTTP status")]
    InvalidStatus { operation: String, status: u16 },

    #[error("operation {operation}: integration response {status} has no method response")]
    MissingMethodResponse { operation: String, status: u16 },

    #[error("operation {operation}: header {header} of response {status} is not declared in its method response")]
    UndeclaredResponseHeader {
        operation: String,
        status: u16,
        header: String,
    },

    #[error("operation {operation}: response {status} sets {header} to a value that differs from the CORS policy")]
    CorsConflict {
        operation: String,
        status: u16,
        header: String,
    },
}

/// A per-call failure, converted into an error response.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error(transparent)]
    Denied(#[from] Denied),

    #[error("unsupported media type {content_type:?}")]
    UnsupportedMediaType { content_type: String },

    #[error("request mapping failed: {0}")]
    RequestMapping(TemplateError),

    #[error("response mapping failed: {0}")]
    ResponseMapping(TemplateError),

    #[error("request mapping designated an invalid status: {detail}")]
    InvalidStatus { detail: String },

    #[error("no integration response for status {status}")]
    NoIntegrationResponse { status: u16 },
}

impl SynthesisError {
    /// HTTP status of the error response.
    pub fn status(&self) -> u16 {
        match self {
            Self::Denied(denied) => denied.status(),
            Self::UnsupportedMediaType { .. } => 415,
            Self::RequestMapping(e) | Self::ResponseMapping(e) => {
                if e.is_caller_fault() {
                    400
                } else {
                    500
                }
            }
            Self::InvalidStatus { .. } | Self::NoIntegrationResponse { .. } => 500,
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Denied(denied) => denied.code(),
            Self::UnsupportedMediaType { .. } => "UNSUPPORTED_MEDIA_TYPE",
            Self::RequestMapping(e) | Self::ResponseMapping(e) if e.is_caller_fault() => {
                e.kind.code()
            }
            _ => "INTERNAL_ERROR",
        }
    }

    /// The template error, if evaluation failed.
    pub fn template_error(&self) -> Option<&TemplateError> {
        match self {
            Self::RequestMapping(e) | Self::ResponseMapping(e) => Some(e),
            _ => None,
        }
    }
}
