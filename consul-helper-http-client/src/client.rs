//! HTTP client implementation.

use http::Method;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::is_transient_status;
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::{
    CircuitBreaker, CircuitState, HttpClientConfig, HttpClientError, Request, RequestBuilder,
    Response, Result, RetryConfig,
};

/// One retry the client made before the final outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryRecord {
    /// 1-based retry number.
    pub retry: u32,
    /// Time waited before the retry.
    pub delay: Duration,
    /// Why the previous attempt was retried.
    pub reason: String,
}

/// Outcome of executing a request through the client policies.
#[derive(Debug)]
pub struct Execution {
    /// The final response or error.
    pub result: Result<Response>,
    /// Number of attempts started, including one abandoned by cancellation.
    pub attempts: u32,
    /// Retries made before the final outcome, in order.
    pub retries: Vec<RetryRecord>,
}

impl Execution {
    pub(crate) fn failed(error: HttpClientError) -> Self {
        Self {
            result: Err(error),
            attempts: 0,
            retries: Vec::new(),
        }
    }

    /// Discard the retry history and keep the outcome.
    pub fn into_result(self) -> Result<Response> {
        self.result
    }
}

/// HTTP client with retry, circuit breaker, and timeout support.
///
/// Clones share the transport and the circuit breaker.
#[derive(Clone)]
pub struct HttpClient {
    transport: Arc<dyn HttpTransport>,
    config: Arc<HttpClientConfig>,
    circuit_breaker: Option<Arc<CircuitBreaker>>,
}

impl HttpClient {
    /// Create a new HTTP client backed by `reqwest`.
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client that sends through the given transport.
    pub fn with_transport(config: HttpClientConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let circuit_breaker = config
            .circuit_breaker
            .as_ref()
            .map(|cb_config| Arc::new(CircuitBreaker::new(cb_config.clone())));

        Self {
            transport,
            config: Arc::new(config),
            circuit_breaker,
        }
    }

    /// Get the client configuration.
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Get the shared circuit breaker, if one is configured.
    pub fn circuit_breaker(&self) -> Option<&CircuitBreaker> {
        self.circuit_breaker.as_deref()
    }

    /// Create a PUT request builder.
    pub fn put(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::PUT, url.into())
    }

    /// Execute a request with retry and circuit breaker logic.
    pub async fn execute(&self, request: Request) -> Execution {
        self.execute_until(request, std::future::pending::<()>()).await
    }

    /// Execute a request, abandoning the in-flight attempt or backoff wait
    /// once `cancel` completes.
    pub async fn execute_until<F>(&self, request: Request, cancel: F) -> Execution
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(cancel);

        let mut attempts = 0;
        let mut retries = Vec::new();

        loop {
            if let Some(cb) = &self.circuit_breaker
                && !cb.is_allowed()
            {
                return Execution {
                    result: Err(HttpClientError::CircuitOpen),
                    attempts,
                    retries,
                };
            }

            attempts += 1;
            let outcome = tokio::select! {
                biased;
                _ = &mut cancel => {
                    return Execution {
                        result: Err(HttpClientError::Cancelled),
                        attempts,
                        retries,
                    };
                }
                outcome = self.transport.send(request.clone()) => outcome,
            };

            self.record_outcome(&outcome);

            let Some(retry_config) = self.config.retry.as_ref() else {
                return Execution {
                    result: outcome,
                    attempts,
                    retries,
                };
            };

            let Some(reason) = retry_reason(retry_config, &outcome) else {
                return Execution {
                    result: outcome,
                    attempts,
                    retries,
                };
            };

            if attempts >= retry_config.max_attempts {
                return Execution {
                    result: outcome,
                    attempts,
                    retries,
                };
            }

            // A breaker tripped by this attempt ends the sequence right away
            if let Some(cb) = &self.circuit_breaker
                && cb.state() == CircuitState::Open
            {
                return Execution {
                    result: Err(HttpClientError::CircuitOpen),
                    attempts,
                    retries,
                };
            }

            let delay = retry_config.delay_for_attempt(attempts - 1);
            debug!(
                retry = attempts,
                delay = ?delay,
                reason = %reason,
                "Retrying request"
            );
            retries.push(RetryRecord {
                retry: attempts,
                delay,
                reason,
            });

            tokio::select! {
                biased;
                _ = &mut cancel => {
                    return Execution {
                        result: Err(HttpClientError::Cancelled),
                        attempts,
                        retries,
                    };
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    fn record_outcome(&self, outcome: &Result<Response>) {
        let Some(cb) = &self.circuit_breaker else {
            return;
        };

        match outcome {
            Ok(response) if is_transient_status(response.status().as_u16()) => cb.record_failure(),
            Ok(_) => cb.record_success(),
            Err(e) if e.is_transient() => cb.record_failure(),
            Err(_) => {}
        }
    }
}

/// Why an outcome should be retried, or `None` when it is final.
fn retry_reason(config: &RetryConfig, outcome: &Result<Response>) -> Option<String> {
    match outcome {
        Ok(response) if config.should_retry_status(response.status().as_u16()) => {
            Some(format!("status {}", response.status()))
        }
        Ok(_) => None,
        Err(e) if config.is_retryable(e) => Some(e.to_string()),
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_client_creation() {
        let client = HttpClient::new(HttpClientConfig::default()).unwrap();
        assert!(client.config().retry.is_none());
        assert!(client.circuit_breaker().is_none());
    }

    #[test]
    fn test_client_with_config() {
        let config = HttpClientConfig::builder()
            .timeout(Duration::from_secs(60))
            .circuit_breaker(crate::CircuitBreakerConfig::default())
            .build();

        let client = HttpClient::new(config).unwrap();
        assert_eq!(client.config().timeout, Duration::from_secs(60));
        assert!(client.circuit_breaker().is_some());
    }

    #[test]
    fn test_clones_share_circuit_breaker() {
        let config = HttpClientConfig::builder()
            .circuit_breaker(crate::CircuitBreakerConfig::new(1, Duration::from_secs(30)))
            .build();
        let client = HttpClient::new(config).unwrap();
        let clone = client.clone();

        client.circuit_breaker().unwrap().record_failure();
        assert_eq!(
            clone.circuit_breaker().unwrap().state(),
            CircuitState::Open
        );
    }
}
