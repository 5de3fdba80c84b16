//! # CORS on Error Responses
//!
//! Synthesized responses and preflights already carry the CORS headers.
//! Everything else the transport can emit at 4xx/5xx (unknown path, wrong
//! method, extractor rejections) gets them here, so browsers can read every
//! failure.

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use mgw_core::HeaderSet;

use crate::state::AppState;

pub async fn cors_on_errors(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        add_missing(response.headers_mut(), state.gateway.cors_headers());
    }
    response
}

/// Insert each header from `set` not already present in `headers`.
pub fn add_missing(headers: &mut HeaderMap, set: &HeaderSet) {
    for (name, value) in set.iter() {
        let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) else {
            tracing::warn!(header = name, "skipping header that is not valid HTTP");
            continue;
        };
        if !headers.contains_key(&name) {
            headers.insert(name, value);
        }
    }
}
