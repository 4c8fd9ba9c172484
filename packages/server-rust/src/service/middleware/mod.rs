//! Decorators over the `StringService` capability.
//!
//! - [`logging`]: one structured log record per call
//! - [`instrumenting`]: request count, latency and count-result metrics
//! - [`pipeline`]: composes the decorators around a raw capability

pub mod instrumenting;
pub mod logging;
pub mod pipeline;

pub use instrumenting::{InstrumentingLayer, InstrumentingMiddleware};
pub use logging::{LoggingLayer, LoggingMiddleware};
pub use pipeline::build_service_pipeline;
