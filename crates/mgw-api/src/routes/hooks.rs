//! # Identity Provider Hooks
//!
//! `POST /hooks/pre-sign-up` receives the pre-sign-up event and returns it
//! with the auto-confirm decision filled in. The hook is called by the
//! identity provider before an account exists, so it sits outside the gate.

use axum::routing::post;
use axum::{Json, Router};
use mgw_auth::bootstrap::{self, PreSignUpEvent};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/hooks/pre-sign-up", post(pre_sign_up))
}

async fn pre_sign_up(Json(event): Json<PreSignUpEvent>) -> Json<PreSignUpEvent> {
    Json(bootstrap::decide(event))
}
