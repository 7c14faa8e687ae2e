//! # Consul Helper HTTP Client
//!
//! The outbound HTTP layer used to talk to the Consul agent, with retry,
//! jittered backoff and a shared circuit breaker.
//!
//! ## Features
//!
//! - **Retry with Backoff**: exponential or constant delays, plus optional jitter
//! - **Circuit Breaker**: stops calling a failing registry until a cooldown elapses
//! - **Cancellation**: any future can abort an in-flight attempt or a backoff wait
//! - **Pluggable Transport**: `reqwest` by default, substitutable for tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use consul_helper_http_client::{CircuitBreakerConfig, HttpClient, HttpClientConfig, RetryConfig};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = HttpClientConfig::builder()
//!         .retry(RetryConfig::exponential(4, Duration::from_secs(2)).with_jitter(Duration::from_millis(100)))
//!         .circuit_breaker(CircuitBreakerConfig::new(5, Duration::from_secs(30)))
//!         .build();
//!
//!     let client = HttpClient::new(config)?;
//!
//!     let response = client
//!         .put("http://localhost:8500/v1/agent/service/register")
//!         .json(&serde_json::json!({"Name": "billing"}))
//!         .send()
//!         .await?;
//!
//!     println!("Status: {}", response.status());
//!     Ok(())
//! }
//! ```

mod circuit_breaker;
mod client;
mod config;
mod error;
mod request;
mod response;
mod retry;
mod transport;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use client::{Execution, HttpClient, RetryRecord};
pub use config::{CONSUL_TOKEN_HEADER, HttpClientConfig, HttpClientConfigBuilder};
pub use error::{HttpClientError, Result};
pub use request::{Request, RequestBuilder};
pub use response::Response;
pub use retry::{BackoffStrategy, RetryConfig};
pub use transport::{HttpTransport, ReqwestTransport};

// Re-export common types
pub use bytes::Bytes;
pub use http::{HeaderMap, HeaderValue, Method, StatusCode, header};
pub use url::Url;

/// Prelude for common imports.
///
/// ```
/// use consul_helper_http_client::prelude::*;
/// ```
pub mod prelude {
    pub use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
    pub use crate::client::{Execution, HttpClient, RetryRecord};
    pub use crate::config::{HttpClientConfig, HttpClientConfigBuilder};
    pub use crate::error::{HttpClientError, Result};
    pub use crate::request::{Request, RequestBuilder};
    pub use crate::response::Response;
    pub use crate::retry::{BackoffStrategy, RetryConfig};
    pub use crate::transport::{HttpTransport, ReqwestTransport};
    pub use http::{HeaderMap, HeaderValue, Method, StatusCode, header};
}
