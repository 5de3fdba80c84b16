//! # API Error Types
//!
//! Transport-level failures: no operation at the path, wrong method, a body
//! that is not text. Synthesis failures never come through here; the
//! synthesizer shapes those itself. Both use the same JSON error body.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use mgw_synth::{ErrorBody, Method};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// No configured resource matches the path (404).
    #[error("no resource at {0}")]
    NotFound(String),

    /// The resource exists but does not answer this method (405).
    #[error("method {method} is not allowed on {path}")]
    MethodNotAllowed {
        method: String,
        path: String,
        allowed: Vec<Method>,
    },

    /// The request could not be read (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::MethodNotAllowed { .. } => (StatusCode::METHOD_NOT_ALLOWED, "METHOD_NOT_ALLOWED"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let body = match &self {
            Self::Internal(_) => {
                tracing::error!(error = %self, "internal server error");
                ErrorBody::internal()
            }
            Self::MethodNotAllowed { allowed, .. } => ErrorBody::new(
                code,
                self.to_string(),
                Some(json!({ "allowed": allowed })),
            ),
            other => ErrorBody::new(code, other.to_string(), None),
        };

        let mut response = (status, Json(body)).into_response();
        if let Self::MethodNotAllowed { allowed, .. } = &self {
            let list = allowed
                .iter()
                .map(Method::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            if let Ok(value) = HeaderValue::from_str(&list) {
                response.headers_mut().insert(header::ALLOW, value);
            }
        }
        response
    }
}
