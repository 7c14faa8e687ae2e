//! Registration descriptor and its Consul wire form.

use serde::{Deserialize, Serialize, Serializer};

use crate::duration::CheckDuration;

/// Service weights passed through to Consul.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weights {
    #[serde(
        rename = "Passing",
        alias = "passing",
        deserialize_with = "consul_helper_config::lenient::value"
    )]
    pub passing: u32,
    #[serde(
        rename = "Warning",
        alias = "warning",
        deserialize_with = "consul_helper_config::lenient::value"
    )]
    pub warning: u32,
}

impl Weights {
    pub fn new(passing: u32, warning: u32) -> Self {
        Self { passing, warning }
    }
}

/// Health check attached to a registration.
///
/// `args` is derived from the relative URL when the descriptor is created
/// and does not change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthCheckDescriptor {
    #[serde(skip)]
    relative_url: String,
    #[serde(rename = "DeregisterCriticalServiceAfter")]
    deregister_critical_service_after: String,
    #[serde(rename = "Args", skip_serializing_if = "Option::is_none")]
    args: Option<Vec<String>>,
    #[serde(rename = "Interval")]
    interval: String,
    #[serde(rename = "Timeout", skip_serializing_if = "Option::is_none")]
    timeout: Option<String>,
}

impl HealthCheckDescriptor {
    pub fn new(
        relative_url: impl Into<String>,
        interval: CheckDuration,
        deregister_critical_service_after: CheckDuration,
        timeout: Option<CheckDuration>,
    ) -> Self {
        let relative_url = relative_url.into();
        let args = (!relative_url.is_empty()).then(|| vec![relative_url.clone()]);

        Self {
            relative_url,
            deregister_critical_service_after: deregister_critical_service_after.to_string(),
            args,
            interval: interval.to_string(),
            timeout: timeout.map(|t| t.to_string()),
        }
    }

    pub fn relative_url(&self) -> &str {
        &self.relative_url
    }

    pub fn interval(&self) -> &str {
        &self.interval
    }

    pub fn deregister_critical_service_after(&self) -> &str {
        &self.deregister_critical_service_after
    }

    pub fn timeout(&self) -> Option<&str> {
        self.timeout.as_deref()
    }

    pub fn args(&self) -> Option<&[String]> {
        self.args.as_deref()
    }
}

/// Everything Consul needs to register one service instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationDescriptor {
    /// Instance id; the name is used when empty.
    pub id: String,
    pub name: String,
    /// Base URL the service is reachable at.
    pub address: String,
    /// Listening port; 0 means not yet assigned.
    pub port: u16,
    pub tags: Vec<String>,
    pub enable_tag_override: bool,
    pub check: Option<HealthCheckDescriptor>,
    pub weights: Option<Weights>,
    /// Registry the descriptor is published to. Not part of the payload.
    pub consul_url: String,
}

impl RegistrationDescriptor {
    /// The id sent to Consul.
    pub fn service_id(&self) -> &str {
        if self.id.is_empty() {
            &self.name
        } else {
            &self.id
        }
    }

    pub fn address_without_trailing_slash(&self) -> &str {
        without_trailing_slash(&self.address)
    }

    /// Agent endpoint the descriptor is PUT to.
    pub fn registration_endpoint(&self) -> String {
        format!(
            "{}/v1/agent/service/register",
            without_trailing_slash(&self.consul_url)
        )
    }
}

pub(crate) fn without_trailing_slash(value: &str) -> &str {
    value.strip_suffix('/').unwrap_or(value)
}

#[derive(Serialize)]
struct WireRegistration<'a> {
    #[serde(rename = "ID")]
    id: &'a str,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Tags", skip_serializing_if = "<[String]>::is_empty")]
    tags: &'a [String],
    #[serde(rename = "Address")]
    address: &'a str,
    #[serde(rename = "Port")]
    port: u16,
    #[serde(rename = "EnableTagOverride")]
    enable_tag_override: bool,
    #[serde(rename = "Check", skip_serializing_if = "Option::is_none")]
    check: Option<&'a HealthCheckDescriptor>,
    #[serde(rename = "Weights", skip_serializing_if = "Option::is_none")]
    weights: Option<&'a Weights>,
}

impl Serialize for RegistrationDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireRegistration {
            id: self.service_id(),
            name: &self.name,
            tags: &self.tags,
            address: &self.address,
            port: self.port,
            enable_tag_override: self.enable_tag_override,
            check: self.check.as_ref(),
            weights: self.weights.as_ref(),
        }
        .serialize(serializer)
    }
}
