//! Process wiring: registry, decorated capability, HTTP server, metrics upkeep.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use strsvc_core::BasicStringService;
use tracing::info;

use crate::config::StringServiceArgs;
use crate::discovery::{RegistrationDescriptor, RegistryError, ServiceRegistry};
use crate::network::NetworkModule;
use crate::service::{
    build_service_pipeline, prometheus_recorder, BackgroundWorker, MetricsUpkeep, ServiceMetrics,
};

/// How often Prometheus histogram buffers are drained.
pub const METRICS_UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Fatal outcome of [`run`].
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("server error: {0:#}")]
    Server(anyhow::Error),
}

impl AppError {
    /// Process exit status for this failure.
    ///
    /// 2 for configuration or connection problems, 3 when the directory
    /// rejected the registration, 1 for anything the server hit at runtime.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Registry(RegistryError::Config(_) | RegistryError::Connection(_)) => 2,
            Self::Registry(RegistryError::Registration(_)) => 3,
            Self::Server(_) => 1,
        }
    }
}

/// Runs the service until `shutdown` resolves.
///
/// Startup order: directory client, capability pipeline, listener bind,
/// registration, serve. The instance is deregistered once the server has
/// stopped, including when serving fails.
///
/// # Errors
///
/// Returns [`AppError::Registry`] for invalid directory settings or a
/// rejected registration, [`AppError::Server`] if the listener cannot be
/// bound or the server fails.
pub async fn run(
    args: StringServiceArgs,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), AppError> {
    let registry = ServiceRegistry::from_config(&args.directory_config())?;

    let (recorder, metrics_handle) = prometheus_recorder();
    let service = build_service_pipeline(BasicStringService, ServiceMetrics::new(recorder));

    let network = args.network_config();
    let secure = network.is_secure();
    let mut module = NetworkModule::new(network, Arc::new(service), metrics_handle.clone());
    let port = module.start().await.map_err(AppError::Server)?;

    let descriptor = RegistrationDescriptor::new(
        &args.service_name,
        args.advertised_address(),
        port,
        secure,
        args.tags.clone(),
    )?;

    let mut upkeep = BackgroundWorker::start(
        MetricsUpkeep::new(metrics_handle),
        METRICS_UPKEEP_INTERVAL,
    );

    info!(
        instance_id = descriptor.instance_id(),
        probe = descriptor.health_check().probe_url(),
        "registering with directory"
    );
    let served = registry
        .run_registered(&descriptor, module.serve(shutdown))
        .await;
    upkeep.stop().await;

    served?.map_err(AppError::Server)?;
    info!("string service stopped");
    Ok(())
}
