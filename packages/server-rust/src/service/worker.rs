//! Background worker for periodic tasks.
//!
//! `BackgroundWorker` drives a `PeriodicTask` on a
//! fixed interval until stopped.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

// ---------------------------------------------------------------------------
// PeriodicTask trait
// ---------------------------------------------------------------------------

/// Work executed by `BackgroundWorker` on every tick.
#[async_trait]
pub trait PeriodicTask: Send + 'static {
    /// Called once per tick interval.
    async fn on_tick(&mut self);

    /// Called once when the worker is shutting down. Default is a no-op.
    async fn shutdown(&mut self) {}
}

// ---------------------------------------------------------------------------
// BackgroundWorker
// ---------------------------------------------------------------------------

/// Handle to a spawned periodic task.
///
/// The first tick fires one full interval after `start()`, not immediately.
pub struct BackgroundWorker {
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl BackgroundWorker {
    /// Spawn `task` on the current runtime, ticking every `interval`.
    pub fn start<R: PeriodicTask>(mut task: R, interval: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // Skip the first immediate tick so on_tick doesn't fire at startup.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => task.on_tick().await,
                    _ = &mut shutdown_rx => break,
                }
            }

            task.shutdown().await;
        });

        Self {
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// Returns `true` until `stop()` has completed.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Stop the worker, waiting for its `shutdown()` hook to finish.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
