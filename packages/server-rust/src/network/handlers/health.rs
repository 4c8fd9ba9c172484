//! Health endpoints.
//!
//! `/health` is the probe the discovery directory polls; it answers `pong`
//! as long as the process is up. The `/health/*` variants serve
//! orchestrators and operators.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

use super::AppState;
use crate::network::HealthState;

/// Directory health probe: 200 with body `pong`.
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "pong")
}

/// Returns detailed health information as JSON.
///
/// Always returns 200 -- the `state` field says whether the server is
/// actually serving or draining.
pub async fn status_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "state": state.shutdown.health_state().as_str(),
        "in_flight": state.shutdown.in_flight_count(),
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}

/// Liveness probe -- always returns 200 OK.
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe -- 200 while Ready, 503 while starting or draining.
pub async fn readiness_handler(State(state): State<AppState>) -> StatusCode {
    if state.shutdown.health_state() == HealthState::Ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
