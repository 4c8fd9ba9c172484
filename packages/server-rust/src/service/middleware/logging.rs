//! Logging decorator.
//!
//! Emits exactly one `tracing` event per call, from the `Drop` of a per-call
//! guard, so the record is written on every exit path: success, error,
//! panic in the inner service, or the caller dropping the future.

use std::time::Instant;

use async_trait::async_trait;
use strsvc_core::{ServiceError, StringService};
use tower::Layer;
use tracing::info;

use crate::service::method_names;

// ---------------------------------------------------------------------------
// LoggingLayer
// ---------------------------------------------------------------------------

/// Tower layer wrapping a `StringService` in [`LoggingMiddleware`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingLayer;

impl<S> Layer<S> for LoggingLayer {
    type Service = LoggingMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LoggingMiddleware::new(inner)
    }
}

// ---------------------------------------------------------------------------
// LoggingMiddleware
// ---------------------------------------------------------------------------

/// `StringService` wrapper that logs method, input, outcome and duration.
#[derive(Debug, Clone)]
pub struct LoggingMiddleware<S> {
    inner: S,
}

impl<S> LoggingMiddleware<S> {
    #[must_use]
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: StringService> StringService for LoggingMiddleware<S> {
    async fn uppercase(&self, input: &str) -> Result<String, ServiceError> {
        let mut log = CallLog::begin(method_names::UPPERCASE, input);
        let result = self.inner.uppercase(input).await;
        match &result {
            Ok(output) => log.output = Some(output.clone()),
            Err(e) => log.err = Some(e.to_string()),
        }
        result
    }

    async fn count(&self, input: &str) -> usize {
        let mut log = CallLog::begin(method_names::COUNT, input);
        let n = self.inner.count(input).await;
        log.output = Some(n.to_string());
        n
    }
}

// ---------------------------------------------------------------------------
// CallLog guard
// ---------------------------------------------------------------------------

/// Per-call record written when dropped.
struct CallLog<'a> {
    method: &'static str,
    input: &'a str,
    begin: Instant,
    output: Option<String>,
    err: Option<String>,
}

impl<'a> CallLog<'a> {
    fn begin(method: &'static str, input: &'a str) -> Self {
        Self {
            method,
            input,
            begin: Instant::now(),
            output: None,
            err: None,
        }
    }
}

impl Drop for CallLog<'_> {
    fn drop(&mut self) {
        info!(
            method = self.method,
            input = self.input,
            output = self.output.as_deref(),
            err = self.err.as_deref(),
            took_secs = self.begin.elapsed().as_secs_f64(),
            "string service call"
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
