//! One-shot registration with the Consul agent.
//!
//! The publisher never fails. Every outcome, including retries and the final
//! result, is recorded as a [`PublishEvent`] in the returned
//! [`PublishReport`], which the host logs with [`PublishReport::emit`].

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use consul_helper_http_client::{
    CircuitBreakerConfig, Execution, HttpClient, HttpClientConfig, HttpClientError, RetryConfig,
};
use tracing::{debug, error, info, warn};

use crate::descriptor::RegistrationDescriptor;
use crate::port::PortAllocator;
use crate::shutdown::ShutdownSignal;
use crate::Result;

/// Retry and circuit-breaker settings for the registration call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles for each further retry.
    pub base_delay: Duration,
    /// Upper bound of the random jitter added to each delay.
    pub max_jitter: Duration,
    /// Consecutive transient failures that open the breaker.
    pub failure_threshold: u32,
    /// How long the breaker stays open.
    pub break_duration: Duration,
    /// Timeout for each attempt.
    pub request_timeout: Duration,
    /// ACL token sent to the agent.
    pub acl_token: Option<String>,
}

impl Default for RegistrationPolicy {
    fn default() -> Self {
        Self {
            max_retries: 10,
            base_delay: Duration::from_secs(2),
            max_jitter: Duration::from_millis(100),
            failure_threshold: 5,
            break_duration: Duration::from_secs(30),
            request_timeout: Duration::from_secs(30),
            acl_token: None,
        }
    }
}

impl RegistrationPolicy {
    /// Exponential retry on transport errors, 5xx, 408 and 404.
    pub fn retry_config(&self) -> RetryConfig {
        let mut status_codes: Vec<u16> = (500..600).collect();
        status_codes.extend([404, 408]);

        RetryConfig::exponential(self.max_retries.saturating_add(1), self.base_delay)
            .with_max_delay(Duration::MAX)
            .with_jitter(self.max_jitter)
            .with_status_codes(status_codes)
    }

    pub fn circuit_breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig::new(self.failure_threshold, self.break_duration)
    }

    pub fn client_config(&self) -> HttpClientConfig {
        let builder = HttpClientConfig::builder()
            .timeout(self.request_timeout)
            .retry(self.retry_config())
            .circuit_breaker(self.circuit_breaker_config());

        match &self.acl_token {
            Some(token) => builder.acl_token(token.as_str()).build(),
            None => builder.build(),
        }
    }
}

/// Something that happened while publishing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishEvent {
    /// The descriptor had no port and one was assigned.
    PortAssigned { port: u16 },
    /// An attempt failed and will be retried after `delay`.
    Retrying {
        retry: u32,
        delay: Duration,
        reason: String,
    },
    /// The agent accepted the registration.
    Registered { attempts: u32 },
    /// The circuit breaker is open; no further attempts were made.
    CircuitOpen { attempts: u32 },
    /// Publishing gave up.
    Failed { attempts: u32, reason: String },
    /// Shutdown was signalled before publishing finished.
    Cancelled { attempts: u32 },
}

/// Outcome of one publish call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub service_id: String,
    pub endpoint: String,
    pub events: Vec<PublishEvent>,
}

impl PublishReport {
    fn new(service_id: &str, endpoint: String) -> Self {
        Self {
            service_id: service_id.to_string(),
            endpoint,
            events: Vec::new(),
        }
    }

    pub fn is_registered(&self) -> bool {
        matches!(self.outcome(), Some(PublishEvent::Registered { .. }))
    }

    /// The final event.
    pub fn outcome(&self) -> Option<&PublishEvent> {
        self.events.last()
    }

    pub fn retries(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, PublishEvent::Retrying { .. }))
            .count()
    }

    /// Transport calls made, as recorded by the final event.
    pub fn attempts(&self) -> u32 {
        match self.outcome() {
            Some(
                PublishEvent::Registered { attempts }
                | PublishEvent::CircuitOpen { attempts }
                | PublishEvent::Failed { attempts, .. }
                | PublishEvent::Cancelled { attempts },
            ) => *attempts,
            _ => 0,
        }
    }

    /// Write every event to the log.
    pub fn emit(&self) {
        let service = self.service_id.as_str();
        for event in &self.events {
            match event {
                PublishEvent::PortAssigned { port } => {
                    warn!(service, port, "No port configured, registering with a free loopback port");
                }
                PublishEvent::Retrying {
                    retry,
                    delay,
                    reason,
                } => {
                    warn!(service, retry, delay = ?delay, reason = %reason, "Registration attempt failed, retrying");
                }
                PublishEvent::Registered { attempts } => {
                    info!(service, attempts, endpoint = %self.endpoint, "Registered service with Consul");
                }
                PublishEvent::CircuitOpen { attempts } => {
                    warn!(service, attempts, "Consul circuit breaker is open, giving up registration");
                }
                PublishEvent::Failed { attempts, reason } => {
                    warn!(service, attempts, reason = %reason, "Service registration with Consul failed");
                }
                PublishEvent::Cancelled { attempts } => {
                    info!(service, attempts, "Service registration cancelled by shutdown");
                }
            }
        }
    }
}

/// Publishes registration descriptors to a Consul agent.
#[derive(Clone)]
pub struct RegistryPublisher {
    client: HttpClient,
    ports: Arc<dyn PortAllocator>,
}

impl RegistryPublisher {
    /// Publish through `client`; unset ports are drawn from `ports`.
    pub fn new(client: HttpClient, ports: Arc<dyn PortAllocator>) -> Self {
        Self { client, ports }
    }

    /// Build a `reqwest`-backed client for `policy`.
    pub fn with_policy(policy: &RegistrationPolicy, ports: Arc<dyn PortAllocator>) -> Result<Self> {
        let client = HttpClient::new(policy.client_config())?;
        Ok(Self::new(client, ports))
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// PUT the descriptor to its registry.
    ///
    /// An in-flight attempt or backoff wait is abandoned when `shutdown`
    /// fires.
    pub async fn publish(
        &self,
        descriptor: &RegistrationDescriptor,
        shutdown: &ShutdownSignal,
    ) -> PublishReport {
        let endpoint = descriptor.registration_endpoint();
        let mut report = PublishReport::new(descriptor.service_id(), endpoint.clone());

        let descriptor = if descriptor.port == 0 {
            match self.ports.port() {
                Ok(port) => {
                    report.events.push(PublishEvent::PortAssigned { port });
                    let mut assigned = descriptor.clone();
                    assigned.port = port;
                    Cow::Owned(assigned)
                }
                Err(e) => {
                    report.events.push(PublishEvent::Failed {
                        attempts: 0,
                        reason: e.to_string(),
                    });
                    return report;
                }
            }
        } else {
            Cow::Borrowed(descriptor)
        };

        debug!(
            service = descriptor.service_id(),
            endpoint = %endpoint,
            "Publishing service registration"
        );

        let execution = self
            .client
            .put(endpoint)
            .json(&*descriptor)
            .send_until(shutdown.triggered())
            .await;

        record_execution(&mut report, execution);
        report
    }
}

fn record_execution(report: &mut PublishReport, execution: Execution) {
    let Execution {
        result,
        attempts,
        retries,
    } = execution;

    report
        .events
        .extend(retries.into_iter().map(|r| PublishEvent::Retrying {
            retry: r.retry,
            delay: r.delay,
            reason: r.reason,
        }));

    let outcome = match result {
        Ok(response) if response.is_success() => PublishEvent::Registered { attempts },
        Ok(response) => PublishEvent::Failed {
            attempts,
            reason: format!("registry answered {}", response.status()),
        },
        Err(HttpClientError::CircuitOpen) => PublishEvent::CircuitOpen { attempts },
        Err(HttpClientError::Cancelled) => PublishEvent::Cancelled { attempts },
        Err(e) => {
            if attempts == 0 {
                error!(error = %e, "Registration request could not be built");
            }
            PublishEvent::Failed {
                attempts,
                reason: e.to_string(),
            }
        }
    };
    report.events.push(outcome);
}
