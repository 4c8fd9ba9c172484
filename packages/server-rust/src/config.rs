//! Command-line and environment configuration for the `string-service` binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::discovery::DirectoryConfig;
use crate::network::{NetworkConfig, TlsConfig};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// String service: uppercase/count over HTTP, registered with Consul.
#[derive(Debug, Clone, Parser)]
#[command(name = "string-service", version)]
pub struct StringServiceArgs {
    /// Name under which the instance registers.
    #[arg(long, env = "SERVICE_NAME", default_value = "StringService")]
    pub service_name: String,

    /// Address the HTTP server binds to.
    #[arg(long, env = "SERVICE_HOST", default_value = "localhost")]
    pub host: String,

    /// Port the HTTP server binds to. 0 picks a free port.
    #[arg(long, env = "SERVICE_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Address advertised to the directory. Defaults to `--host`.
    #[arg(long, env = "SERVICE_ADVERTISE_ADDRESS")]
    pub advertise_address: Option<String>,

    /// Extra registration tags, comma separated.
    #[arg(long, env = "SERVICE_TAGS", value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Consul agent host.
    #[arg(long, env = "CONSUL_HOST", default_value = "127.0.0.1")]
    pub consul_host: String,

    /// Consul agent port.
    #[arg(long, env = "CONSUL_PORT", default_value_t = 8500)]
    pub consul_port: u32,

    /// Consul ACL token. Empty means none.
    #[arg(long, env = "CONSUL_HTTP_TOKEN", default_value = "", hide_env_values = true)]
    pub consul_token: String,

    /// Timeout for each Consul agent request, in seconds.
    #[arg(long, env = "CONSUL_TIMEOUT_SECS", default_value_t = 10)]
    pub consul_timeout_secs: u64,

    /// PEM certificate chain. Enables TLS together with `--tls-key`.
    #[arg(long, env = "TLS_CERT", requires = "tls_key")]
    pub tls_cert: Option<PathBuf>,

    /// PEM private key.
    #[arg(long, env = "TLS_KEY", requires = "tls_cert")]
    pub tls_key: Option<PathBuf>,

    /// Per-request timeout, in seconds.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl StringServiceArgs {
    /// Address written into the registration descriptor.
    #[must_use]
    pub fn advertised_address(&self) -> &str {
        self.advertise_address.as_deref().unwrap_or(&self.host)
    }

    #[must_use]
    pub fn network_config(&self) -> NetworkConfig {
        let tls = match (&self.tls_cert, &self.tls_key) {
            (Some(cert), Some(key)) => Some(TlsConfig {
                cert_path: cert.clone(),
                key_path: key.clone(),
            }),
            _ => None,
        };
        NetworkConfig {
            host: self.host.clone(),
            port: self.port,
            tls,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ..NetworkConfig::default()
        }
    }

    #[must_use]
    pub fn directory_config(&self) -> DirectoryConfig {
        DirectoryConfig {
            host: self.consul_host.clone(),
            port: self.consul_port,
            token: Some(self.consul_token.clone()),
            request_timeout: Duration::from_secs(self.consul_timeout_secs),
            ..DirectoryConfig::default()
        }
    }
}

/// Installs the global `tracing` subscriber.
///
/// Filtering follows `RUST_LOG`, falling back to `info`.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}
