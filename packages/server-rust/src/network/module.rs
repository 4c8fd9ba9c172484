//! Network module with deferred startup lifecycle.
//!
//! `new()` allocates shared state, `start()` binds the TCP listener, and
//! `serve()` starts accepting connections. The gap between `start()` and
//! `serve()` is where the instance registers with the discovery directory:
//! the bound port is known but no request is served yet.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use strsvc_core::StringService;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{info, warn};

use super::config::{NetworkConfig, TlsConfig};
use super::handlers::{
    count_handler, health_handler, liveness_handler, metrics_handler, readiness_handler,
    status_handler, uppercase_handler, AppState,
};
use super::middleware::build_http_layers;
use super::shutdown::ShutdownController;

/// Manages the HTTP server lifecycle.
///
/// 1. `new()` -- allocates shared state (capability, metrics handle, shutdown controller)
/// 2. `start()` -- binds TCP listener to the configured address
/// 3. `serve()` -- accepts connections until shutdown is signalled
pub struct NetworkModule {
    config: NetworkConfig,
    listener: Option<TcpListener>,
    state: AppState,
}

impl NetworkModule {
    /// Creates a new network module without binding any port.
    #[must_use]
    pub fn new(
        config: NetworkConfig,
        service: Arc<dyn StringService>,
        metrics: PrometheusHandle,
    ) -> Self {
        Self {
            config,
            listener: None,
            state: AppState {
                service,
                metrics,
                shutdown: Arc::new(ShutdownController::new()),
                start_time: Instant::now(),
            },
        }
    }

    /// Returns a shared reference to the shutdown controller.
    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.state.shutdown)
    }

    /// Assembles the axum router with all routes and middleware.
    ///
    /// Routes:
    /// - `POST /uppercase` -- uppercase the `s` field
    /// - `POST /count` -- byte length of the `s` field
    /// - `GET /metrics` -- Prometheus exposition
    /// - `GET /health` -- directory health probe (`pong`)
    /// - `GET /health/status` -- detailed health JSON
    /// - `GET /health/live` -- liveness probe
    /// - `GET /health/ready` -- readiness probe
    pub fn build_router(&self) -> Router {
        Router::new()
            .route("/uppercase", post(uppercase_handler))
            .route("/count", post(count_handler))
            .route("/metrics", get(metrics_handler))
            .route("/health", get(health_handler))
            .route("/health/status", get(status_handler))
            .route("/health/live", get(liveness_handler))
            .route("/health/ready", get(readiness_handler))
            .layer(build_http_layers(&self.config))
            .with_state(self.state.clone())
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the actual bound port, which differs from the configured
    /// port when port 0 is used (OS-assigned ephemeral port).
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound (e.g., port in use).
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        info!("TCP listener bound to {}:{}", self.config.host, port);

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves connections until the shutdown future resolves, then drains.
    ///
    /// The controller moves to `Draining` as soon as `shutdown` resolves,
    /// before the server stops accepting, so readiness probes fail while
    /// in-flight requests finish. The drain is bounded by
    /// `NetworkConfig::drain_timeout`; requests still running after that are
    /// abandoned and the controller stays `Draining`.
    ///
    /// # Errors
    ///
    /// Returns an error if `start()` was not called first, TLS material
    /// cannot be loaded, or the server hits a fatal I/O error.
    pub async fn serve(
        mut self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let listener = self
            .listener
            .take()
            .ok_or_else(|| anyhow::anyhow!("start() must be called before serve()"))?;
        let router = self.build_router();
        let shutdown_ctrl = self.shutdown_controller();
        let drain_timeout = self.config.drain_timeout;

        let (draining_tx, draining_rx) = oneshot::channel::<()>();
        let signal_ctrl = Arc::clone(&shutdown_ctrl);
        let signal = async move {
            shutdown.await;
            signal_ctrl.trigger_shutdown();
            info!(
                in_flight = signal_ctrl.in_flight_count(),
                "Shutdown signalled, draining"
            );
            let _ = draining_tx.send(());
        };
        let drain_deadline = async move {
            if draining_rx.await.is_ok() {
                tokio::time::sleep(drain_timeout).await;
            } else {
                std::future::pending::<()>().await;
            }
        };

        shutdown_ctrl.set_ready();

        let server = async {
            match &self.config.tls {
                Some(tls) => serve_tls(listener, router, tls, signal).await,
                None => serve_plain(listener, router, signal).await,
            }
        };

        tokio::select! {
            served = server => served?,
            () = drain_deadline => {
                warn!(
                    in_flight = shutdown_ctrl.in_flight_count(),
                    "Drain timeout expired with in-flight requests remaining"
                );
                return Ok(());
            }
        }

        // Connections are closed once the server returns; this records Stopped.
        if shutdown_ctrl.wait_for_drain(drain_timeout).await {
            info!("All in-flight requests drained");
        } else {
            warn!(
                in_flight = shutdown_ctrl.in_flight_count(),
                "Drain timeout expired with in-flight requests remaining"
            );
        }
        Ok(())
    }
}

/// Serves plain HTTP using axum's built-in server.
async fn serve_plain(
    listener: TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    info!("Serving plain HTTP connections");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Serves TLS using `axum-server` with rustls.
///
/// Reuses the pre-bound TCP listener by converting it to a `std::net::TcpListener`.
async fn serve_tls(
    listener: TcpListener,
    router: Router,
    tls_config: &TlsConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    use axum_server::tls_rustls::RustlsConfig;

    let rustls_config = RustlsConfig::from_pem_file(&tls_config.cert_path, &tls_config.key_path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load TLS certificates: {e}"))?;

    let addr = listener.local_addr()?;
    let std_listener = listener.into_std()?;
    let handle = axum_server::Handle::new();
    let shutdown_handle = handle.clone();

    tokio::spawn(async move {
        shutdown.await;
        shutdown_handle.graceful_shutdown(None);
    });

    info!("Serving TLS connections on {}", addr);

    axum_server::from_tcp_rustls(std_listener, rustls_config)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;
    Ok(())
}
