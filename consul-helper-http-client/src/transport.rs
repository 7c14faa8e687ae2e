//! Transport seam between the client policies and the network.

use crate::{HttpClientConfig, Request, Response, Result};
use async_trait::async_trait;

/// Sends a single request, without any retry or circuit breaking.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send the request and return whatever the server answered.
    ///
    /// Non-2xx statuses are returned as `Ok`; only transport failures are errors.
    async fn send(&self, request: Request) -> Result<Response>;
}

/// Transport backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport from the client configuration.
    pub fn new(config: &HttpClientConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { inner })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        let mut builder = self
            .inner
            .request(request.method().clone(), request.url().clone())
            .headers(request.headers().clone());

        if let Some(body) = request.body() {
            builder = builder.body(body.clone());
        }
        if let Some(timeout) = request.timeout() {
            builder = builder.timeout(timeout);
        }

        let response = self.inner.execute(builder.build()?).await?;
        Response::from_reqwest(response).await
    }
}
