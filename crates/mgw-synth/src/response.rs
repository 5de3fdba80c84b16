//! # Synthesized Responses
//!
//! Every call ends in a [`SynthesizedResponse`], success or failure. Error
//! responses use one JSON shape and carry the gateway's fixed error headers.

use mgw_core::HeaderSet;
use serde::{Deserialize, Serialize};

const INTERNAL_MESSAGE: &str = "An internal error occurred";

/// Structured JSON error response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g. `INSUFFICIENT_SCOPE`).
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorBody {
    pub fn new(code: &str, message: impl Into<String>, details: Option<serde_json::Value>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.to_string(),
                message: message.into(),
                details,
            },
        }
    }

    /// The body for any 5xx outcome. Nothing about the cause is exposed.
    pub fn internal() -> Self {
        Self::new("INTERNAL_ERROR", INTERNAL_MESSAGE, None)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"error":{{"code":"INTERNAL_ERROR","message":"{INTERNAL_MESSAGE}"}}}}"#)
        })
    }
}

/// Status, body, and headers of one synthesized outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedResponse {
    pub status: u16,
    pub content_type: String,
    pub body: String,
    pub headers: HeaderSet,
}

impl SynthesizedResponse {
    /// An error outcome with `headers` as its complete header set.
    pub fn error(status: u16, body: &ErrorBody, headers: HeaderSet) -> Self {
        Self {
            status,
            content_type: "application/json".to_string(),
            body: body.to_json(),
            headers,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
