//! String service server: Consul registration, decorated capability, and the
//! HTTP surface exposing it.

pub mod app;
pub mod config;
pub mod discovery;
pub mod network;
pub mod service;

#[cfg(test)]
mod test_support;

pub use app::{run, AppError};
pub use config::{init_tracing, LogFormat, StringServiceArgs};
pub use discovery::{RegistrationDescriptor, RegistryError, ServiceRegistry};
pub use network::NetworkModule;
