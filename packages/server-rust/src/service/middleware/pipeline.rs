//! Pipeline composition: wraps the raw capability in the decorator chain.

use strsvc_core::StringService;
use tower::ServiceBuilder;

use super::instrumenting::{InstrumentingLayer, InstrumentingMiddleware};
use super::logging::{LoggingLayer, LoggingMiddleware};
use crate::service::metrics::ServiceMetrics;

/// Build the decorated capability.
///
/// Layer order (outermost to innermost):
/// 1. `LoggingLayer` -- sees end-to-end latency, including instrumentation
/// 2. `InstrumentingLayer` -- counts and times the raw call
/// 3. `raw` -- the business capability
///
/// The order is part of the public contract: swapping it changes which
/// layer's latency includes the other's overhead.
#[must_use]
pub fn build_service_pipeline<S: StringService>(
    raw: S,
    metrics: ServiceMetrics,
) -> LoggingMiddleware<InstrumentingMiddleware<S>> {
    ServiceBuilder::new()
        .layer(LoggingLayer)
        .layer(InstrumentingLayer::new(metrics))
        .service(raw)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
