//! HTTP handler definitions for the string service.
//!
//! This module defines `AppState` (the shared state carried through axum
//! extractors) and re-exports all handler functions for building the router.

pub mod health;
pub mod metrics;
pub mod string_ops;

pub use health::{health_handler, liveness_handler, readiness_handler, status_handler};
pub use metrics::metrics_handler;
pub use string_ops::{count_handler, uppercase_handler};

use std::sync::Arc;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusHandle;
use strsvc_core::StringService;

use super::ShutdownController;

/// Shared application state passed to all axum handlers via `State` extraction.
///
/// Holds `Arc` references to shared resources so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// The decorated capability.
    pub service: Arc<dyn StringService>,
    /// Renders the Prometheus exposition for `/metrics`.
    pub metrics: PrometheusHandle,
    /// Graceful shutdown controller with health state and in-flight tracking.
    pub shutdown: Arc<ShutdownController>,
    /// Server process start time, used for uptime calculation.
    pub start_time: Instant,
}

#[cfg(test)]
pub(crate) fn test_state() -> AppState {
    use strsvc_core::BasicStringService;

    use crate::service::{build_service_pipeline, prometheus_recorder, ServiceMetrics};

    let (recorder, handle) = prometheus_recorder();
    AppState {
        service: Arc::new(build_service_pipeline(
            BasicStringService,
            ServiceMetrics::new(recorder),
        )),
        metrics: handle,
        shutdown: Arc::new(ShutdownController::new()),
        start_time: Instant::now(),
    }
}
