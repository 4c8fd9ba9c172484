//! Directory client seam and the Consul agent implementation.
//!
//! `ConsulClient` speaks the agent HTTP API directly:
//! - `PUT /v1/agent/service/register` with the JSON registration body
//! - `PUT /v1/agent/service/deregister/{id}`

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Serialize;
use tracing::debug;

use super::descriptor::RegistrationDescriptor;
use super::error::{DirectoryError, RegistryError};
use super::registry::validate_endpoint;

/// Header carrying the ACL token on every agent request.
const TOKEN_HEADER: &str = "X-Consul-Token";

// ---------------------------------------------------------------------------
// DirectoryClient trait
// ---------------------------------------------------------------------------

/// Network client for the service-discovery directory.
///
/// Each method performs exactly one round trip.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Announce an instance to the directory.
    async fn register(&self, descriptor: &RegistrationDescriptor) -> Result<(), DirectoryError>;

    /// Remove an instance from the directory.
    async fn deregister(&self, instance_id: &str) -> Result<(), DirectoryError>;
}

// ---------------------------------------------------------------------------
// DirectoryConfig
// ---------------------------------------------------------------------------

/// Connection settings for the directory agent.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// Agent host name or IP.
    pub host: String,
    /// Agent HTTP port. Validated to 1..=65535.
    pub port: u32,
    /// Optional ACL token. Empty strings are treated as absent.
    pub token: Option<String>,
    /// Upper bound for any single agent request.
    pub request_timeout: Duration,
    /// Upper bound for the deregistration round trip during shutdown.
    pub deregister_timeout: Duration,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8500,
            token: None,
            request_timeout: Duration::from_secs(10),
            deregister_timeout: Duration::from_secs(5),
        }
    }
}

// ---------------------------------------------------------------------------
// ConsulClient
// ---------------------------------------------------------------------------

/// Consul agent client over plain HTTP.
#[derive(Debug, Clone)]
pub struct ConsulClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl ConsulClient {
    /// Builds the client without contacting the agent.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Config`] for a host shorter than 3 characters
    /// or a port outside 1..=65535, and [`RegistryError::Connection`] if the
    /// agent address does not form a plain `http://host:port/` URL or the
    /// HTTP client cannot be built.
    pub fn new(config: &DirectoryConfig) -> Result<Self, RegistryError> {
        let port = validate_endpoint(&config.host, config.port)?;
        let base_url = agent_base_url(&config.host, port)?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .no_proxy()
            .build()
            .map_err(|e| RegistryError::Connection(e.to_string()))?;

        let token = config.token.clone().filter(|t| !t.is_empty());

        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    /// Base URL of the agent, e.g. `http://127.0.0.1:8500/`.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, DirectoryError> {
        self.base_url
            .join(path)
            .map_err(|e| DirectoryError::InvalidUrl(e.to_string()))
    }

    fn put(&self, url: Url) -> reqwest::RequestBuilder {
        let request = self.http.put(url);
        match &self.token {
            Some(token) => request.header(TOKEN_HEADER, token),
            None => request,
        }
    }

    async fn send(request: reqwest::RequestBuilder) -> Result<(), DirectoryError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(DirectoryError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl DirectoryClient for ConsulClient {
    async fn register(&self, descriptor: &RegistrationDescriptor) -> Result<(), DirectoryError> {
        let url = self.endpoint("v1/agent/service/register")?;
        debug!(instance_id = descriptor.instance_id(), %url, "registering with consul agent");
        let body = AgentServiceRegistration::from(descriptor);
        Self::send(self.put(url).json(&body)).await
    }

    async fn deregister(&self, instance_id: &str) -> Result<(), DirectoryError> {
        let mut url = self.endpoint("v1/agent/service/deregister/")?;
        // Push as a path segment so ids are percent-encoded.
        url.path_segments_mut()
            .map_err(|()| DirectoryError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(instance_id);
        debug!(instance_id, %url, "deregistering from consul agent");
        Self::send(self.put(url)).await
    }
}

/// Builds `http://{host}:{port}/`, bracketing IPv6 literals.
///
/// Anything that does not round-trip as the URL host is rejected, so path,
/// query or port characters in `host` cannot move the port into the path.
fn agent_base_url(host: &str, port: u16) -> Result<Url, RegistryError> {
    let bad_address = |detail: &dyn std::fmt::Display| {
        RegistryError::Connection(format!("bad agent address {host:?}: {detail}"))
    };

    let literal = match host.parse::<IpAddr>() {
        Ok(IpAddr::V6(ip)) => format!("[{ip}]"),
        _ => host.to_string(),
    };

    let mut url = Url::parse("http://localhost/").map_err(|e| bad_address(&e))?;
    url.set_host(Some(&literal)).map_err(|e| bad_address(&e))?;
    // The host setter stops at the first `:`, `/` or `?` instead of failing.
    if !url
        .host_str()
        .is_some_and(|parsed| parsed.eq_ignore_ascii_case(&literal))
    {
        return Err(bad_address(&"not a plain host name or IP literal"));
    }
    url.set_port(Some(port))
        .map_err(|()| bad_address(&"port rejected"))?;
    Ok(url)
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

/// Agent registration body. Field names follow the Consul API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct AgentServiceRegistration<'a> {
    #[serde(rename = "ID")]
    id: &'a str,
    name: &'a str,
    address: &'a str,
    port: u16,
    tags: &'a [String],
    check: AgentServiceCheck<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct AgentServiceCheck<'a> {
    #[serde(rename = "HTTP")]
    http: &'a str,
    timeout: String,
    interval: String,
    deregister_critical_service_after: String,
}

impl<'a> From<&'a RegistrationDescriptor> for AgentServiceRegistration<'a> {
    fn from(desc: &'a RegistrationDescriptor) -> Self {
        let check = desc.health_check();
        Self {
            id: desc.instance_id(),
            name: desc.service_name(),
            address: desc.address(),
            port: desc.port(),
            tags: desc.tags(),
            check: AgentServiceCheck {
                http: check.probe_url(),
                timeout: go_duration(check.timeout()),
                interval: go_duration(check.interval()),
                deregister_critical_service_after: go_duration(check.deregister_after()),
            },
        }
    }
}

/// Renders a duration the way the agent parses them: `"5s"`, or `"1500ms"`
/// when there is a sub-second part.
fn go_duration(d: Duration) -> String {
    if d.subsec_millis() == 0 {
        format!("{}s", d.as_secs())
    } else {
        format!("{}ms", d.as_millis())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
