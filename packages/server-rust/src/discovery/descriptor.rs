//! Registration descriptor and health-check derivation.
//!
//! The derivation is pure and must stay byte-for-byte stable: the directory
//! UI and tag filters depend on the probe URL shape and the `secure=` marker.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::Rng;

use super::error::RegistryError;

/// Path of the health probe the directory polls.
pub const HEALTH_PATH: &str = "/health";
/// How long the directory waits for a probe response.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
/// How often the directory polls the probe.
pub const PROBE_INTERVAL: Duration = Duration::from_secs(5);
/// How long a critical instance stays listed before the directory drops it.
pub const DEREGISTER_AFTER: Duration = Duration::from_secs(20);

// ---------------------------------------------------------------------------
// HealthCheckSpec
// ---------------------------------------------------------------------------

/// HTTP health check the directory runs against a registered instance.
///
/// Invariant: `deregister_after > interval > 0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheckSpec {
    probe_url: String,
    timeout: Duration,
    interval: Duration,
    deregister_after: Duration,
}

impl HealthCheckSpec {
    /// Builds a health check, rejecting timings that would let the directory
    /// drop an instance before it had a chance to pass the probe.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Config`] unless `deregister_after > interval > 0`.
    pub fn new(
        probe_url: impl Into<String>,
        timeout: Duration,
        interval: Duration,
        deregister_after: Duration,
    ) -> Result<Self, RegistryError> {
        if interval.is_zero() {
            return Err(RegistryError::Config(
                "health check interval must be positive".to_string(),
            ));
        }
        if deregister_after <= interval {
            return Err(RegistryError::Config(format!(
                "deregister_after ({deregister_after:?}) must exceed interval ({interval:?})"
            )));
        }
        Ok(Self {
            probe_url: probe_url.into(),
            timeout,
            interval,
            deregister_after,
        })
    }

    /// Derives the standard probe for an instance: `{scheme}://{address}:{port}/health`
    /// with the fixed 5s timeout, 5s interval and 20s auto-deregistration.
    #[must_use]
    pub fn http_probe(address: &str, port: u16, secure: bool) -> Self {
        let scheme = if secure { "https" } else { "http" };
        Self {
            probe_url: format!("{scheme}://{address}:{port}{HEALTH_PATH}"),
            timeout: PROBE_TIMEOUT,
            interval: PROBE_INTERVAL,
            deregister_after: DEREGISTER_AFTER,
        }
    }

    #[must_use]
    pub fn probe_url(&self) -> &str {
        &self.probe_url
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub fn deregister_after(&self) -> Duration {
        self.deregister_after
    }
}

// ---------------------------------------------------------------------------
// RegistrationDescriptor
// ---------------------------------------------------------------------------

/// Everything the directory needs to list one instance of the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationDescriptor {
    instance_id: String,
    service_name: String,
    address: String,
    port: u16,
    tags: Vec<String>,
    health_check: HealthCheckSpec,
}

impl RegistrationDescriptor {
    /// Builds a descriptor with a fresh instance id, the `secure=` tag appended
    /// to `tags`, and the standard HTTP probe.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Config`] if `port` is 0 or the service name is empty.
    pub fn new(
        service_name: &str,
        address: &str,
        port: u16,
        secure: bool,
        tags: Vec<String>,
    ) -> Result<Self, RegistryError> {
        if service_name.is_empty() {
            return Err(RegistryError::Config("service name must not be empty".to_string()));
        }
        if port == 0 {
            return Err(RegistryError::Config(
                "service port should be between 1 and 65535".to_string(),
            ));
        }

        Ok(Self {
            instance_id: generate_instance_id(service_name),
            service_name: service_name.to_string(),
            address: address.to_string(),
            port,
            tags: with_secure_tag(tags, secure),
            health_check: HealthCheckSpec::http_probe(address, port, secure),
        })
    }

    /// Replaces the generated instance id.
    #[must_use]
    pub fn with_instance_id(mut self, instance_id: impl Into<String>) -> Self {
        self.instance_id = instance_id.into();
        self
    }

    /// Replaces the derived health check.
    #[must_use]
    pub fn with_health_check(mut self, health_check: HealthCheckSpec) -> Self {
        self.health_check = health_check;
        self
    }

    #[must_use]
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    #[must_use]
    pub fn health_check(&self) -> &HealthCheckSpec {
        &self.health_check
    }
}

/// Appends the `secure=true` / `secure=false` marker after the caller's tags.
#[must_use]
pub fn with_secure_tag(mut tags: Vec<String>, secure: bool) -> Vec<String> {
    tags.push(format!("secure={secure}"));
    tags
}

/// Builds a per-process instance id: `{name}-{unix seconds}-{1000..=9999}`.
///
/// The timestamp keeps ids distinct across restarts, the random suffix
/// separates instances started within the same second.
#[must_use]
pub fn generate_instance_id(service_name: &str) -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    let suffix: u16 = rand::rng().random_range(1000..=9999);
    format!("{service_name}-{secs}-{suffix}")
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn insecure_probe_uses_http() {
        let check = HealthCheckSpec::http_probe("svc", 8080, false);
        assert_eq!(check.probe_url(), "http://svc:8080/health");
        assert_eq!(check.timeout(), Duration::from_secs(5));
        assert_eq!(check.interval(), Duration::from_secs(5));
        assert_eq!(check.deregister_after(), Duration::from_secs(20));
    }

    #[test]
    fn secure_probe_uses_https() {
        let check = HealthCheckSpec::http_probe("svc", 8443, true);
        assert_eq!(check.probe_url(), "https://svc:8443/health");
    }

    #[test]
    fn descriptor_appends_secure_marker_after_caller_tags() {
        let desc = RegistrationDescriptor::new(
            "StringService",
            "svc",
            8080,
            false,
            vec!["v1".to_string(), "eu".to_string()],
        )
        .unwrap();
        assert_eq!(desc.tags(), ["v1", "eu", "secure=false"]);
        assert_eq!(desc.health_check().probe_url(), "http://svc:8080/health");

        let secure = RegistrationDescriptor::new("StringService", "svc", 8080, true, Vec::new())
            .unwrap();
        assert_eq!(secure.tags(), ["secure=true"]);
        assert!(secure.health_check().probe_url().starts_with("https://"));
    }

    #[test]
    fn descriptor_rejects_port_zero() {
        let err = RegistrationDescriptor::new("StringService", "svc", 0, false, Vec::new())
            .unwrap_err();
        assert!(matches!(err, RegistryError::Config(_)));
    }

    #[test]
    fn descriptor_rejects_empty_name() {
        let err = RegistrationDescriptor::new("", "svc", 80, false, Vec::new()).unwrap_err();
        assert!(matches!(err, RegistryError::Config(_)));
    }

    #[test]
    fn instance_id_shape() {
        let id = generate_instance_id("StringService");
        let parts: Vec<&str> = id.rsplitn(3, '-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[2], "StringService");
        assert!(parts[1].parse::<u64>().unwrap() > 0);
        let suffix: u16 = parts[0].parse().unwrap();
        assert!((1000..=9999).contains(&suffix));
    }

    #[test]
    fn with_instance_id_overrides_generated_id() {
        let desc = RegistrationDescriptor::new("StringService", "svc", 80, false, Vec::new())
            .unwrap()
            .with_instance_id("fixed-id");
        assert_eq!(desc.instance_id(), "fixed-id");
    }

    #[test]
    fn health_check_rejects_zero_interval() {
        let err = HealthCheckSpec::new("http://a:1/health", PROBE_TIMEOUT, Duration::ZERO, DEREGISTER_AFTER)
            .unwrap_err();
        assert!(matches!(err, RegistryError::Config(_)));
    }

    #[test]
    fn health_check_rejects_deregister_not_after_interval() {
        let interval = Duration::from_secs(10);
        let err = HealthCheckSpec::new("http://a:1/health", PROBE_TIMEOUT, interval, interval)
            .unwrap_err();
        assert!(matches!(err, RegistryError::Config(_)));
    }

    proptest! {
        #[test]
        fn health_check_accepts_ordered_timings(interval in 1u64..1000, extra in 1u64..1000) {
            let check = HealthCheckSpec::new(
                "http://a:1/health",
                PROBE_TIMEOUT,
                Duration::from_secs(interval),
                Duration::from_secs(interval + extra),
            );
            prop_assert!(check.is_ok());
        }

        #[test]
        fn probe_url_embeds_address_and_port(address in "[a-z][a-z0-9.-]{2,20}", port in 1u16..=65535, secure: bool) {
            let check = HealthCheckSpec::http_probe(&address, port, secure);
            let scheme = if secure { "https" } else { "http" };
            prop_assert_eq!(check.probe_url(), format!("{scheme}://{address}:{port}/health"));
        }
    }
}
