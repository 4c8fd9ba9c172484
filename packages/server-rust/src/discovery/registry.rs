//! Register/deregister lifecycle against a discovery directory.
//!
//! State machine: `Unregistered -> Registered` on a successful `register()`,
//! back to `Unregistered` on `deregister()`. A failed `register()` leaves the
//! state unchanged. The tracked id sits behind an async mutex held across the
//! directory round trip, so concurrent lifecycle calls are serialized.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::client::{ConsulClient, DirectoryClient, DirectoryConfig};
use super::descriptor::RegistrationDescriptor;
use super::error::{DirectoryError, RegistryError};

/// Checks the directory endpoint before any client is built.
///
/// # Errors
///
/// Returns [`RegistryError::Config`] if `host` is shorter than 3 characters
/// or `port` is outside 1..=65535.
pub fn validate_endpoint(host: &str, port: u32) -> Result<u16, RegistryError> {
    if host.len() < 3 {
        return Err(RegistryError::Config(format!("check host: {host:?}")));
    }
    match u16::try_from(port) {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(RegistryError::Config(format!(
            "check port, port should be between 1 and 65535 (got {port})"
        ))),
    }
}

/// Owns the directory client and the id of the instance this process registered.
///
/// One registry exists per process; it is passed explicitly to the startup
/// and shutdown paths rather than stored globally.
pub struct ServiceRegistry<C = ConsulClient> {
    client: C,
    registered_id: Mutex<Option<String>>,
    deregister_timeout: Duration,
}

impl ServiceRegistry<ConsulClient> {
    /// Validates the agent endpoint and builds a Consul client with default timeouts.
    ///
    /// No network I/O happens here.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Config`] for a bad host or port,
    /// [`RegistryError::Connection`] if the client cannot be built.
    pub fn connect(host: &str, port: u32, token: &str) -> Result<Self, RegistryError> {
        Self::from_config(&DirectoryConfig {
            host: host.to_string(),
            port,
            token: Some(token.to_string()),
            ..DirectoryConfig::default()
        })
    }

    /// Like [`connect`](Self::connect) with explicit timeouts.
    ///
    /// # Errors
    ///
    /// Same as [`connect`](Self::connect).
    pub fn from_config(config: &DirectoryConfig) -> Result<Self, RegistryError> {
        let client = ConsulClient::new(config)?;
        Ok(Self::with_client(client).with_deregister_timeout(config.deregister_timeout))
    }
}

impl<C: DirectoryClient> ServiceRegistry<C> {
    /// Wraps an already-built directory client.
    #[must_use]
    pub fn with_client(client: C) -> Self {
        Self {
            client,
            registered_id: Mutex::new(None),
            deregister_timeout: DirectoryConfig::default().deregister_timeout,
        }
    }

    /// Sets the upper bound on the deregistration round trip.
    #[must_use]
    pub fn with_deregister_timeout(mut self, timeout: Duration) -> Self {
        self.deregister_timeout = timeout;
        self
    }

    /// Returns the underlying directory client.
    #[must_use]
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Returns the id currently believed to be present in the directory.
    pub async fn registered_id(&self) -> Option<String> {
        self.registered_id.lock().await.clone()
    }

    /// Announces `descriptor` to the directory.
    ///
    /// On success the descriptor's id becomes the tracked id, replacing any
    /// previous one (re-registration updates the listing).
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Registration`] if the directory call fails;
    /// the tracked id is left untouched.
    pub async fn register(&self, descriptor: &RegistrationDescriptor) -> Result<(), RegistryError> {
        let mut registered = self.registered_id.lock().await;
        self.client
            .register(descriptor)
            .await
            .map_err(RegistryError::Registration)?;
        *registered = Some(descriptor.instance_id().to_string());
        Ok(())
    }

    /// Removes the tracked instance from the directory, best effort.
    ///
    /// No-op when nothing is registered. Otherwise issues one bounded
    /// directory call and clears the tracked id whatever its outcome.
    /// Remote failures and timeouts are absorbed.
    pub async fn deregister(&self) {
        let mut registered = self.registered_id.lock().await;
        let Some(id) = registered.take() else {
            return;
        };
        let outcome =
            match tokio::time::timeout(self.deregister_timeout, self.client.deregister(&id)).await {
                Ok(result) => result,
                Err(_) => Err(DirectoryError::Timeout(self.deregister_timeout)),
            };
        match outcome {
            Ok(()) => debug!(instance_id = %id, "deregistered from directory"),
            Err(e) => warn!(instance_id = %id, error = %e, "deregistration failed, state cleared"),
        }
    }

    /// Registers, runs `body`, then deregisters on every exit path of `body`.
    ///
    /// A panic inside `body` is re-raised after deregistration. If
    /// registration fails, `body` never runs.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Registration`] if the initial registration fails.
    pub async fn run_registered<F, T>(
        &self,
        descriptor: &RegistrationDescriptor,
        body: F,
    ) -> Result<T, RegistryError>
    where
        F: Future<Output = T>,
    {
        self.register(descriptor).await?;
        let outcome = AssertUnwindSafe(body).catch_unwind().await;
        self.deregister().await;
        match outcome {
            Ok(value) => Ok(value),
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
