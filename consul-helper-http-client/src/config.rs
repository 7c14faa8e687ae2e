//! Client configuration.

use crate::circuit_breaker::CircuitBreakerConfig;
use crate::retry::RetryConfig;
use std::time::Duration;

/// Header Consul reads the ACL token from.
pub const CONSUL_TOKEN_HEADER: &str = "X-Consul-Token";

/// Settings shared by every request a client sends.
///
/// Retry and circuit breaking are off unless configured.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Overall timeout of one attempt.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub retry: Option<RetryConfig>,
    pub circuit_breaker: Option<CircuitBreakerConfig>,
    /// How long idle pooled connections are kept.
    pub pool_idle_timeout: Duration,
    /// Headers added to every request unless the request sets them.
    pub default_headers: Vec<(String, String)>,
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            retry: None,
            circuit_breaker: None,
            pool_idle_timeout: Duration::from_secs(90),
            default_headers: Vec::new(),
            user_agent: format!("consul-helper/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }

    /// Value of a default header, matched case-insensitively.
    pub fn default_header(&self, name: &str) -> Option<&str> {
        self.default_headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Builder for [`HttpClientConfig`].
#[derive(Debug, Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Enable retries.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.config.retry = Some(config);
        self
    }

    /// Enable a circuit breaker shared by all clones of the client.
    pub fn circuit_breaker(mut self, config: CircuitBreakerConfig) -> Self {
        self.config.circuit_breaker = Some(config);
        self
    }

    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.pool_idle_timeout = timeout;
        self
    }

    /// Add a header to every request, replacing an earlier value.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.config
            .default_headers
            .retain(|(key, _)| !key.eq_ignore_ascii_case(&name));
        self.config.default_headers.push((name, value.into()));
        self
    }

    /// Authenticate against an ACL-enabled agent.
    pub fn acl_token(self, token: impl Into<String>) -> Self {
        self.default_header(CONSUL_TOKEN_HEADER, token)
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}
