//! # Request Extraction Helpers

use std::collections::BTreeMap;

use axum::http::HeaderMap;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, HeaderMapExt};

/// Bearer token from `Authorization`, if present and well-formed.
///
/// A missing header, another scheme, or an unparsable value all yield `None`;
/// the gate reports them uniformly as a missing credential.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
}

/// Headers whose values are visible text, keyed by lower-cased name.
/// Repeated headers are joined with `,`.
pub fn text_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut out: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let Ok(value) = value.to_str() else {
            continue;
        };
        out.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    out
}
