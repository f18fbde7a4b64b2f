//! `/health` (liveness) and `/ready` (readiness).

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use bookstore_core::{liveness, readiness, HealthStatus};
use tokio::task::JoinError;

use crate::error::ApiError;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(live))
        .route("/ready", get(ready))
}

async fn live(State(state): State<AppState>) -> Response {
    let pool = state.pool().clone();
    probe_response(tokio::task::spawn_blocking(move || liveness(&pool)).await)
}

async fn ready(State(state): State<AppState>) -> Response {
    let pool = state.pool().clone();
    probe_response(tokio::task::spawn_blocking(move || readiness(&pool)).await)
}

fn probe_response(result: Result<HealthStatus, JoinError>) -> Response {
    match result {
        Ok(status) => {
            let code = if status.is_healthy() {
                StatusCode::OK
            } else {
                StatusCode::SERVICE_UNAVAILABLE
            };
            (code, Json(status.report())).into_response()
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}
