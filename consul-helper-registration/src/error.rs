//! Registration error types.

use consul_helper_config::ConfigError;
use consul_helper_http_client::HttpClientError;
use thiserror::Error;

/// Result type for registration operations.
pub type Result<T> = std::result::Result<T, RegistrationError>;

/// Registration errors.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// An input failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A builder was used after it was finalized or disposed.
    #[error("{0} has already been finalized or disposed")]
    Lifecycle(&'static str),

    /// No free port could be obtained.
    #[error("Port allocation failed: {0}")]
    PortAllocation(#[source] std::io::Error),

    /// The host has no IPv4 address.
    #[error("Address lookup failed: {0}")]
    AddressLookup(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// HTTP client error.
    #[error("HTTP client error: {0}")]
    Http(#[from] HttpClientError),
}

impl RegistrationError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Check if this is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a lifecycle error.
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Self::Lifecycle(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RegistrationError::validation("Service name must not be empty");
        assert_eq!(
            err.to_string(),
            "Validation error: Service name must not be empty"
        );

        let err = RegistrationError::Lifecycle("RegistrationBuilder");
        assert_eq!(
            err.to_string(),
            "RegistrationBuilder has already been finalized or disposed"
        );
    }

    #[test]
    fn test_conversions() {
        let err: RegistrationError = ConfigError::KeyNotFound("servicediscovery".into()).into();
        assert!(matches!(err, RegistrationError::Config(_)));

        let err: RegistrationError = HttpClientError::CircuitOpen.into();
        assert!(matches!(err, RegistrationError::Http(_)));
        assert!(!err.is_validation());
    }
}
