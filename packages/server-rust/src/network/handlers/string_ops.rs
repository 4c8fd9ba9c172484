//! Capability endpoints: `POST /uppercase` and `POST /count`.
//!
//! Each handler holds an in-flight guard for the duration of the call so
//! graceful shutdown can wait for it.

use axum::extract::State;
use axum::Json;
use strsvc_core::{CountRequest, CountResponse, UppercaseRequest, UppercaseResponse};

use super::AppState;

pub async fn uppercase_handler(
    State(state): State<AppState>,
    Json(req): Json<UppercaseRequest>,
) -> Json<UppercaseResponse> {
    let _guard = state.shutdown.in_flight_guard();
    let result = state.service.uppercase(&req.s).await;
    Json(UppercaseResponse::from(result))
}

pub async fn count_handler(
    State(state): State<AppState>,
    Json(req): Json<CountRequest>,
) -> Json<CountResponse> {
    let _guard = state.shutdown.in_flight_guard();
    let v = state.service.count(&req.s).await;
    Json(CountResponse { v })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::handlers::test_state;

    #[tokio::test]
    async fn uppercase_handler_returns_value() {
        let state = test_state();
        let resp = uppercase_handler(
            State(state.clone()),
            Json(UppercaseRequest { s: "ab".to_string() }),
        )
        .await
        .0;
        assert_eq!(resp.v, "AB");
        assert_eq!(resp.err, None);
        assert_eq!(state.shutdown.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn uppercase_handler_reports_error_in_body() {
        let resp = uppercase_handler(
            State(test_state()),
            Json(UppercaseRequest { s: String::new() }),
        )
        .await
        .0;
        assert_eq!(resp.v, "");
        assert_eq!(resp.err.as_deref(), Some("empty string"));
    }

    #[tokio::test]
    async fn count_handler_returns_length() {
        let resp = count_handler(
            State(test_state()),
            Json(CountRequest {
                s: "hello".to_string(),
            }),
        )
        .await
        .0;
        assert_eq!(resp, CountResponse { v: 5 });
    }
}
