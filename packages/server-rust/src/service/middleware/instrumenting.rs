//! Instrumenting decorator.
//!
//! Counts requests and records latency under `{method, error}` labels, and
//! records every `count` result. Metrics are written from the `Drop` of a
//! per-call guard; a call abandoned before completion is counted as an
//! error for value-producing methods.

use std::time::Instant;

use async_trait::async_trait;
use strsvc_core::{ServiceError, StringService};
use tower::Layer;

use crate::service::method_names;
use crate::service::metrics::ServiceMetrics;

// ---------------------------------------------------------------------------
// InstrumentingLayer
// ---------------------------------------------------------------------------

/// Tower layer wrapping a `StringService` in [`InstrumentingMiddleware`].
#[derive(Debug, Clone)]
pub struct InstrumentingLayer {
    metrics: ServiceMetrics,
}

impl InstrumentingLayer {
    #[must_use]
    pub fn new(metrics: ServiceMetrics) -> Self {
        Self { metrics }
    }
}

impl<S> Layer<S> for InstrumentingLayer {
    type Service = InstrumentingMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        InstrumentingMiddleware::new(inner, self.metrics.clone())
    }
}

// ---------------------------------------------------------------------------
// InstrumentingMiddleware
// ---------------------------------------------------------------------------

/// `StringService` wrapper that feeds [`ServiceMetrics`].
#[derive(Debug, Clone)]
pub struct InstrumentingMiddleware<S> {
    inner: S,
    metrics: ServiceMetrics,
}

impl<S> InstrumentingMiddleware<S> {
    #[must_use]
    pub fn new(inner: S, metrics: ServiceMetrics) -> Self {
        Self { inner, metrics }
    }
}

#[async_trait]
impl<S: StringService> StringService for InstrumentingMiddleware<S> {
    async fn uppercase(&self, input: &str) -> Result<String, ServiceError> {
        let mut call = CallObservation::begin(&self.metrics, method_names::UPPERCASE, true);
        let result = self.inner.uppercase(input).await;
        call.failed = result.is_err();
        result
    }

    async fn count(&self, input: &str) -> usize {
        // count cannot fail, so it is always labeled error="false".
        let mut call = CallObservation::begin(&self.metrics, method_names::COUNT, false);
        let n = self.inner.count(input).await;
        call.count_result = Some(n);
        n
    }
}

// ---------------------------------------------------------------------------
// CallObservation guard
// ---------------------------------------------------------------------------

struct CallObservation<'a> {
    metrics: &'a ServiceMetrics,
    method: &'static str,
    begin: Instant,
    failed: bool,
    count_result: Option<usize>,
}

impl<'a> CallObservation<'a> {
    fn begin(metrics: &'a ServiceMetrics, method: &'static str, failed: bool) -> Self {
        Self {
            metrics,
            method,
            begin: Instant::now(),
            failed,
            count_result: None,
        }
    }
}

impl Drop for CallObservation<'_> {
    fn drop(&mut self) {
        self.metrics
            .record_request(self.method, self.failed, self.begin.elapsed());
        if let Some(n) = self.count_result {
            self.metrics.record_count_result(n);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
