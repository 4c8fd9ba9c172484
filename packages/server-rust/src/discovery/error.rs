use std::time::Duration;

/// Failure of a single round trip to the discovery directory.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("directory request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("directory returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("directory request timed out after {0:?}")]
    Timeout(Duration),
    #[error("invalid directory URL: {0}")]
    InvalidUrl(String),
}

/// Errors surfaced by `ServiceRegistry` construction and registration.
///
/// All variants are fatal during startup. Deregistration never produces one.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("invalid directory configuration: {0}")]
    Config(String),
    #[error("failed to build directory client: {0}")]
    Connection(String),
    #[error("service registration failed: {0}")]
    Registration(#[source] DirectoryError),
}
