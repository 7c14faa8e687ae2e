//! Default health endpoint.
//!
//! Registrations without an explicit check point Consul at
//! [`DEFAULT_HEALTH_ROUTE`]. Hosts that keep the default serve it with
//! [`health_response`].

use http::{Method, Response, StatusCode};

/// Route Consul probes when no health check is configured.
pub const DEFAULT_HEALTH_ROUTE: &str = "api/consul-helper/health";

/// Empty `200 OK` answer for the health route.
pub fn health_response() -> Response<String> {
    let mut response = Response::new(String::new());
    *response.status_mut() = StatusCode::OK;
    response
}

/// Whether a request targets the default health route.
pub fn is_health_request(method: &Method, path: &str) -> bool {
    *method == Method::GET && path.trim_matches('/') == DEFAULT_HEALTH_ROUTE
}
