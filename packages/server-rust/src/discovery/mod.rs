//! Service-discovery registration.
//!
//! - [`descriptor`]: registration payload and health-check derivation
//! - [`client`]: `DirectoryClient` seam and the Consul agent implementation
//! - [`registry`]: register/deregister lifecycle over a `DirectoryClient`
//! - [`error`]: directory and registry error types

pub mod client;
pub mod descriptor;
pub mod error;
pub mod registry;

pub use client::{ConsulClient, DirectoryClient, DirectoryConfig};
pub use descriptor::{HealthCheckSpec, RegistrationDescriptor};
pub use error::{DirectoryError, RegistryError};
pub use registry::{validate_endpoint, ServiceRegistry};
