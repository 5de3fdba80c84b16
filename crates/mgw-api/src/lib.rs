//! # mgw-api: HTTP Transport for the Mock Gateway
//!
//! Serves configured operations as real HTTP endpoints. Nothing is proxied:
//! every response is synthesized from mapping templates.
//!
//! ## API Surface
//!
//! | Path                    | Handler                    | Gate        |
//! |-------------------------|----------------------------|-------------|
//! | `/health/liveness`      | [`liveness`]               | none        |
//! | `/health/readiness`     | [`readiness`]              | none        |
//! | `/metrics`              | Prometheus text exposition | none        |
//! | `/hooks/pre-sign-up`    | [`routes::hooks`]          | none        |
//! | anything else           | [`routes::dispatch`]       | per operation |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → CorsOnErrors → Handler
//! ```

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::state::AppState;

/// Assemble the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/metrics", get(metrics))
        .merge(routes::hooks::router())
        .fallback(routes::dispatch::dispatch)
        .layer(from_fn_with_state(
            state.clone(),
            middleware::cors::cors_on_errors,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness probe. Always 200 while the process runs.
pub async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe. The gateway configuration is loaded before the listener
/// binds, so a running server is ready.
pub async fn readiness(State(state): State<AppState>) -> Response {
    if state.gateway.operations().is_empty() {
        (StatusCode::SERVICE_UNAVAILABLE, "no operations configured").into_response()
    } else {
        "ready".into_response()
    }
}

async fn metrics(State(state): State<AppState>) -> Result<Response, AppError> {
    let handle = state
        .metrics
        .as_ref()
        .ok_or_else(|| AppError::NotFound("/metrics".into()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    )
        .into_response())
}
