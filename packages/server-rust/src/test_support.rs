//! Shared fixtures for unit tests: directory doubles, a stub Consul agent,
//! log capture, and metric snapshots.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::Router;
use metrics::Recorder;
use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use parking_lot::Mutex;
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

use crate::discovery::{DirectoryClient, DirectoryError, RegistrationDescriptor};

// ---------------------------------------------------------------------------
// RecordingDirectory
// ---------------------------------------------------------------------------

/// A directory call as seen by [`RecordingDirectory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryCall {
    Register(String),
    Deregister(String),
}

/// In-memory `DirectoryClient` that records every call.
#[derive(Debug, Default)]
pub struct RecordingDirectory {
    calls: Mutex<Vec<DirectoryCall>>,
    fail_register: AtomicBool,
    fail_deregister: AtomicBool,
    hang_deregister: AtomicBool,
}

impl RecordingDirectory {
    pub fn calls(&self) -> Vec<DirectoryCall> {
        self.calls.lock().clone()
    }

    pub fn fail_register(&self, fail: bool) {
        self.fail_register.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deregister(&self, fail: bool) {
        self.fail_deregister.store(fail, Ordering::SeqCst);
    }

    pub fn hang_deregister(&self, hang: bool) {
        self.hang_deregister.store(hang, Ordering::SeqCst);
    }

    fn unavailable() -> DirectoryError {
        DirectoryError::Status {
            status: 500,
            body: "agent unavailable".to_string(),
        }
    }
}

#[async_trait]
impl DirectoryClient for RecordingDirectory {
    async fn register(&self, descriptor: &RegistrationDescriptor) -> Result<(), DirectoryError> {
        self.calls
            .lock()
            .push(DirectoryCall::Register(descriptor.instance_id().to_string()));
        if self.fail_register.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        Ok(())
    }

    async fn deregister(&self, instance_id: &str) -> Result<(), DirectoryError> {
        self.calls
            .lock()
            .push(DirectoryCall::Deregister(instance_id.to_string()));
        if self.hang_deregister.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_deregister.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// StubAgent
// ---------------------------------------------------------------------------

/// A request received by [`StubAgent`].
#[derive(Debug, Clone)]
pub struct AgentCall {
    pub path: String,
    pub token: Option<String>,
    pub body: serde_json::Value,
}

#[derive(Debug, Default)]
struct AgentState {
    calls: Mutex<Vec<AgentCall>>,
    fail_status: AtomicU16,
}

/// In-process HTTP server standing in for a Consul agent.
///
/// Accepts any path, records it, and answers 200 unless told to fail.
pub struct StubAgent {
    port: u16,
    state: Arc<AgentState>,
}

impl StubAgent {
    pub async fn spawn() -> Self {
        let state = Arc::new(AgentState::default());
        let router = Router::new()
            .fallback(record_agent_call)
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Self { port, state }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn calls(&self) -> Vec<AgentCall> {
        self.state.calls.lock().clone()
    }

    /// Answer every subsequent request with `status` and body `agent unavailable`.
    pub fn fail_with(&self, status: u16) {
        self.state.fail_status.store(status, Ordering::SeqCst);
    }
}

async fn record_agent_call(
    State(state): State<Arc<AgentState>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let token = headers
        .get("x-consul-token")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    state.calls.lock().push(AgentCall {
        path: uri.path().to_string(),
        token,
        body,
    });

    match state.fail_status.load(Ordering::SeqCst) {
        0 => (StatusCode::OK, ""),
        code => (
            StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            "agent unavailable",
        ),
    }
}

// ---------------------------------------------------------------------------
// Log capture
// ---------------------------------------------------------------------------

/// One `tracing` event with its fields rendered to strings.
#[derive(Debug, Clone, Default)]
pub struct CapturedEvent {
    pub message: String,
    pub fields: HashMap<String, String>,
    pub floats: HashMap<String, f64>,
}

impl CapturedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

#[derive(Default)]
struct EventVisitor(CapturedEvent);

impl Visit for EventVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.0.floats.insert(field.name().to_string(), value);
        self.0.fields.insert(field.name().to_string(), value.to_string());
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.0.message = value.to_string();
        } else {
            self.0.fields.insert(field.name().to_string(), value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let rendered = format!("{value:?}");
        if field.name() == "message" {
            self.0.message = rendered;
        } else {
            self.0.fields.insert(field.name().to_string(), rendered);
        }
    }
}

struct CaptureLayer {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);
        self.events.lock().push(visitor.0);
    }
}

/// Captures events on the current thread until dropped.
///
/// Works with `#[tokio::test]`'s single-threaded runtime.
pub struct CapturedLogs {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
    _guard: DefaultGuard,
}

impl CapturedLogs {
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().clone()
    }

    pub fn with_message(&self, message: &str) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.message == message)
            .collect()
    }
}

pub fn capture_logs() -> CapturedLogs {
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(CaptureLayer {
        events: Arc::clone(&events),
    });
    CapturedLogs {
        events,
        _guard: tracing::subscriber::set_default(subscriber),
    }
}

// ---------------------------------------------------------------------------
// Metric snapshots
// ---------------------------------------------------------------------------

/// An isolated recorder plus the handle used to read it back.
pub fn debugging_recorder() -> (Arc<dyn Recorder + Send + Sync>, Snapshotter) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    (Arc::new(recorder), snapshotter)
}

/// Flattened view of a recorder snapshot.
pub struct MetricsSnapshot {
    entries: Vec<(String, Vec<(String, String)>, DebugValue)>,
}

impl MetricsSnapshot {
    pub fn take(snapshotter: &Snapshotter) -> Self {
        let entries = snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .map(|(key, _unit, _desc, value)| {
                let key = key.key();
                let mut labels: Vec<(String, String)> = key
                    .labels()
                    .map(|l| (l.key().to_string(), l.value().to_string()))
                    .collect();
                labels.sort();
                (key.name().to_string(), labels, value)
            })
            .collect();
        Self { entries }
    }

    fn find(&self, name: &str, labels: &[(&str, &str)]) -> Option<&DebugValue> {
        let mut wanted: Vec<(String, String)> = labels
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        wanted.sort();
        self.entries
            .iter()
            .find(|(n, l, _)| n == name && *l == wanted)
            .map(|(_, _, v)| v)
    }

    pub fn counter(&self, name: &str, labels: &[(&str, &str)]) -> Option<u64> {
        match self.find(name, labels)? {
            DebugValue::Counter(v) => Some(*v),
            _ => None,
        }
    }

    pub fn histogram(&self, name: &str, labels: &[(&str, &str)]) -> Vec<f64> {
        match self.find(name, labels) {
            Some(DebugValue::Histogram(values)) => values.iter().map(|v| v.0).collect(),
            _ => Vec::new(),
        }
    }
}
