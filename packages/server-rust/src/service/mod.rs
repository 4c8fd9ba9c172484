//! Capability decoration and supporting background work.
//!
//! 1. **Middleware** (`middleware`): logging and instrumenting decorators over
//!    `StringService`, composed by `build_service_pipeline`
//! 2. **Metrics** (`metrics`): the metric sinks the instrumenting decorator writes to
//! 3. **Background workers** (`worker`): periodic tasks (metrics upkeep)

pub mod metrics;
pub mod middleware;
pub mod worker;

pub use metrics::{prometheus_recorder, MetricsUpkeep, ServiceMetrics};
pub use middleware::{
    build_service_pipeline, InstrumentingLayer, InstrumentingMiddleware, LoggingLayer,
    LoggingMiddleware,
};
pub use worker::{BackgroundWorker, PeriodicTask};

/// Operation names used as the `method` label and log field.
pub mod method_names {
    pub const UPPERCASE: &str = "uppercase";
    pub const COUNT: &str = "count";
}
