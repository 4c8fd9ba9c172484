//! Metric sinks for the instrumenting decorator.
//!
//! Writes go through the `metrics` facade against an injected recorder
//! rather than the process-global one, so each pipeline owns its sinks.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics::{counter, describe_counter, describe_histogram, histogram, Recorder, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use super::worker::PeriodicTask;

/// Requests received, labeled by `method` and `error`.
pub const REQUEST_COUNT: &str = "string_service_request_count";
/// Request duration in seconds, labeled by `method` and `error`.
pub const REQUEST_LATENCY: &str = "string_service_request_latency_seconds";
/// Result of each `count` call, unlabeled.
pub const COUNT_RESULT: &str = "string_service_count_result";

/// Handle to the request counter, latency and count-result histograms.
#[derive(Clone)]
pub struct ServiceMetrics {
    recorder: Arc<dyn Recorder + Send + Sync>,
}

impl ServiceMetrics {
    /// Binds the sinks to `recorder` and registers their descriptions.
    #[must_use]
    pub fn new(recorder: Arc<dyn Recorder + Send + Sync>) -> Self {
        let metrics = Self { recorder };
        metrics.with_recorder(|| {
            describe_counter!(REQUEST_COUNT, "Number of requests received");
            describe_histogram!(REQUEST_LATENCY, Unit::Seconds, "Total duration of requests");
            describe_histogram!(COUNT_RESULT, "The result of each count method");
        });
        metrics
    }

    fn with_recorder<T>(&self, f: impl FnOnce() -> T) -> T {
        metrics::with_local_recorder(self.recorder.as_ref(), f)
    }

    /// Counts one request and records its latency under the same labels.
    pub fn record_request(&self, method: &'static str, failed: bool, elapsed: Duration) {
        let error = if failed { "true" } else { "false" };
        self.with_recorder(|| {
            counter!(REQUEST_COUNT, "method" => method, "error" => error).increment(1);
            histogram!(REQUEST_LATENCY, "method" => method, "error" => error)
                .record(elapsed.as_secs_f64());
        });
    }

    /// Records the value returned by a `count` call.
    pub fn record_count_result(&self, n: usize) {
        #[allow(clippy::cast_precision_loss)]
        let value = n as f64;
        self.with_recorder(|| histogram!(COUNT_RESULT).record(value));
    }
}

impl fmt::Debug for ServiceMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceMetrics").finish_non_exhaustive()
    }
}

/// Builds a Prometheus recorder without installing it globally.
///
/// The handle renders the `/metrics` exposition and must be upkept
/// periodically (see [`MetricsUpkeep`]).
#[must_use]
pub fn prometheus_recorder() -> (Arc<dyn Recorder + Send + Sync>, PrometheusHandle) {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    (Arc::new(recorder), handle)
}

/// Periodic task draining Prometheus histogram buffers.
pub struct MetricsUpkeep {
    handle: PrometheusHandle,
}

impl MetricsUpkeep {
    #[must_use]
    pub fn new(handle: PrometheusHandle) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl PeriodicTask for MetricsUpkeep {
    async fn on_tick(&mut self) {
        self.handle.run_upkeep();
    }
}
