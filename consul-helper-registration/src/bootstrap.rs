//! Wiring registration into a host from configuration.
//!
//! The `ServiceDiscovery` section (or any other named section) is bound into
//! [`RegistrationSettings`]:
//!
//! ```json
//! {
//!   "ServiceDiscovery": {
//!     "Name": "billing",
//!     "Port": 5000,
//!     "ConsulUrl": "http://consul:8500",
//!     "Tags": ["v1"],
//!     "HealthCheckInterval": "15s"
//!   }
//! }
//! ```
//!
//! Keys are matched case-insensitively, so the same settings can come from
//! `CONSUL_HELPER_SERVICEDISCOVERY__CONSULURL` and friends. Environment
//! values arrive as text; numeric and boolean settings accept either form.

use std::sync::Arc;
use std::time::Duration;

use consul_helper_config::{ConfigError, ConfigManager, lenient};
use serde::Deserialize;
use tracing::{debug, info};

use crate::address::host_base_url;
use crate::builder::{HealthCheckOptions, RegistrationOptions, build_descriptor};
use crate::descriptor::Weights;
use crate::duration::CheckDuration;
use crate::port::{LoopbackPortAllocator, PortAllocator};
use crate::publisher::{RegistrationPolicy, RegistryPublisher};
use crate::runner::RegistrationRunner;
use crate::{RegistrationError, Result};

/// Section bound when the host does not name one.
pub const DEFAULT_SETTINGS_SECTION: &str = "ServiceDiscovery";

/// Registration settings as they appear in configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RegistrationSettings {
    #[serde(rename = "id")]
    pub id: Option<String>,
    #[serde(rename = "name")]
    pub name: Option<String>,
    #[serde(rename = "address")]
    pub address: Option<String>,
    #[serde(rename = "port", deserialize_with = "lenient::option")]
    pub port: Option<u16>,
    /// A list, or comma-separated text when set from the environment.
    #[serde(rename = "tags", deserialize_with = "lenient::list")]
    pub tags: Vec<String>,
    #[serde(rename = "enabletagoverride", deserialize_with = "lenient::value")]
    pub enable_tag_override: bool,
    #[serde(rename = "weights")]
    pub weights: Option<Weights>,
    #[serde(rename = "consulurl")]
    pub consul_url: Option<String>,
    #[serde(rename = "healthcheckurl")]
    pub health_check_url: Option<String>,
    #[serde(rename = "healthcheckinterval")]
    pub health_check_interval: Option<String>,
    #[serde(rename = "deregistercriticalserviceafter")]
    pub deregister_critical_service_after: Option<String>,
    #[serde(rename = "healthchecktimeout")]
    pub health_check_timeout: Option<String>,
    #[serde(rename = "maxretries", deserialize_with = "lenient::option")]
    pub max_retries: Option<u32>,
    #[serde(rename = "requesttimeoutseconds", deserialize_with = "lenient::option")]
    pub request_timeout_seconds: Option<u64>,
    /// ACL token for agents that enforce ACLs.
    #[serde(rename = "token")]
    pub token: Option<String>,
}

impl RegistrationSettings {
    /// Bind `section`; a missing section yields empty settings.
    pub fn from_config(config: &ConfigManager, section: &str) -> Result<Self> {
        match config.get_section(section) {
            Ok(settings) => Ok(settings),
            Err(ConfigError::KeyNotFound(_)) => {
                debug!(section, "Registration section not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(RegistrationError::validation(format!(
                "Cannot bind section '{}': {}",
                section, e
            ))),
        }
    }

    /// Retry and breaker settings, with overrides applied.
    pub fn policy(&self) -> RegistrationPolicy {
        let mut policy = RegistrationPolicy::default();
        if let Some(max_retries) = self.max_retries {
            policy.max_retries = max_retries;
        }
        if let Some(seconds) = self.request_timeout_seconds.filter(|s| *s > 0) {
            policy.request_timeout = Duration::from_secs(seconds);
        }
        policy.acl_token = self.token.clone().filter(|t| !t.is_empty());
        policy
    }

    /// Convert into builder options.
    ///
    /// Without an explicit address the host's first IPv4 address is used,
    /// falling back to the builder default when it cannot be determined.
    pub fn into_options(self) -> Result<RegistrationOptions> {
        let health_check = HealthCheckOptions {
            relative_url: self.health_check_url,
            interval: parse_duration(self.health_check_interval)?,
            deregister_after: parse_duration(self.deregister_critical_service_after)?,
            timeout: parse_duration(self.health_check_timeout)?,
        };

        let service_base_url = self.address.or_else(|| match host_base_url() {
            Ok(url) => Some(url),
            Err(e) => {
                debug!(error = %e, "Falling back to the default service address");
                None
            }
        });

        Ok(RegistrationOptions {
            name: self.name.unwrap_or_default(),
            id: self.id,
            port: self.port,
            registry_url: self.consul_url,
            service_base_url,
            tags: self.tags,
            weights: self.weights,
            enable_tag_override: self.enable_tag_override,
            health_check: Some(health_check),
        })
    }
}

fn parse_duration(value: Option<String>) -> Result<Option<CheckDuration>> {
    value.map(|v| v.parse()).transpose()
}

/// Build a registration runner from the [`DEFAULT_SETTINGS_SECTION`].
pub fn configure_consul_helper(config: &ConfigManager) -> Result<RegistrationRunner> {
    configure_consul_helper_section(config, DEFAULT_SETTINGS_SECTION)
}

/// Build a registration runner from the named configuration section.
///
/// Fails on invalid settings; the returned runner itself never fails.
pub fn configure_consul_helper_section(
    config: &ConfigManager,
    section: &str,
) -> Result<RegistrationRunner> {
    let settings = RegistrationSettings::from_config(config, section)?;
    let policy = settings.policy();

    let ports: Arc<dyn PortAllocator> = Arc::new(LoopbackPortAllocator::new());
    let descriptor = build_descriptor(settings.into_options()?, ports.as_ref())?;
    let publisher = RegistryPublisher::with_policy(&policy, ports)?;

    info!(
        service = descriptor.service_id(),
        address = %descriptor.address,
        port = descriptor.port,
        consul = %descriptor.consul_url,
        "Configured Consul registration"
    );

    Ok(RegistrationRunner::new(publisher, descriptor))
}
