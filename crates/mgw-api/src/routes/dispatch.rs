//! # Operation Dispatch
//!
//! The router's fallback. Each request is matched against the configured
//! operations and answered in one of four ways:
//!
//! | Case                                   | Response                          |
//! |----------------------------------------|-----------------------------------|
//! | `OPTIONS` on a configured resource     | `204` preflight with CORS headers |
//! | operation matched                      | synthesized response              |
//! | resource matched, method not answered | `405`                             |
//! | nothing matched                        | `404`                             |

use std::collections::{BTreeMap, HashMap};

use axum::body::{Body, Bytes};
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use mgw_core::{RequestId, RequestTime};
use mgw_synth::{RequestContext, Route, SynthesizedResponse};

use crate::error::AppError;
use crate::extractors::{bearer_token, text_headers};
use crate::middleware::cors::add_missing;
use crate::state::AppState;

pub async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let path = uri.path();
    let gateway = &state.gateway;

    if method == Method::OPTIONS {
        if !gateway.resource_exists(path) {
            return Err(AppError::NotFound(path.to_string()));
        }
        let mut response = StatusCode::NO_CONTENT.into_response();
        add_missing(response.headers_mut(), gateway.cors_headers());
        return Ok(response);
    }

    let (operation, params) = match gateway.route(method.as_str(), path) {
        Route::Matched { operation, params } => (operation, params),
        Route::MethodNotAllowed { allowed } => {
            return Err(AppError::MethodNotAllowed {
                method: method.to_string(),
                path: path.to_string(),
                allowed,
            })
        }
        Route::NotFound => return Err(AppError::NotFound(path.to_string())),
    };

    let body = String::from_utf8(body.to_vec())
        .map_err(|_| AppError::BadRequest("request body is not valid UTF-8".into()))?;

    let mut ctx = RequestContext::new(
        method.as_str(),
        path,
        RequestId::generate(),
        RequestTime::now(),
    )
    .with_path_params(params)
    .with_body(body);
    ctx.headers = text_headers(&headers);
    ctx.query = query.into_iter().collect::<BTreeMap<_, _>>();

    let token = bearer_token(&headers);
    let synthesized = gateway.synthesize(operation, &ctx, token.as_deref());
    Ok(into_http(synthesized))
}

fn into_http(synthesized: SynthesizedResponse) -> Response {
    let status = StatusCode::from_u16(synthesized.status).unwrap_or_else(|_| {
        tracing::error!(status = synthesized.status, "synthesized status is not valid HTTP");
        StatusCode::INTERNAL_SERVER_ERROR
    });

    let mut response = Response::new(Body::from(synthesized.body));
    *response.status_mut() = status;
    add_missing(response.headers_mut(), &synthesized.headers);
    if let Ok(content_type) = HeaderValue::from_str(&synthesized.content_type) {
        response.headers_mut().insert(header::CONTENT_TYPE, content_type);
    }
    response
}
