//! Consul self-registration for network services.
//!
//! A service describes itself with a [`RegistrationDescriptor`], built
//! either fluently with [`RegistrationBuilder`] or from options with
//! [`build_descriptor`], and pushes it once at startup with a
//! [`RegistryPublisher`]. The call to the agent is retried with exponential
//! backoff and guarded by a circuit breaker; failures end up in a
//! [`PublishReport`] and the log, never in the host.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use consul_helper_config::ConfigManager;
//! use consul_helper_registration::{StartupHook, configure_consul_helper, shutdown_channel};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let config = ConfigManager::with_prefix("CONSUL_HELPER");
//! config.load_env();
//!
//! let runner = configure_consul_helper(&config)?;
//! let (_trigger, shutdown) = shutdown_channel();
//! runner.on_start(shutdown).await?;
//! # Ok(())
//! # }
//! ```

pub mod address;
pub mod bootstrap;
pub mod builder;
pub mod descriptor;
pub mod duration;
pub mod error;
pub mod health;
pub mod port;
pub mod publisher;
pub mod runner;
pub mod shutdown;

pub use address::{first_ipv4_address, host_base_url};
pub use bootstrap::{
    DEFAULT_SETTINGS_SECTION, RegistrationSettings, configure_consul_helper,
    configure_consul_helper_section,
};
pub use builder::{
    DEFAULT_CHECK_INTERVAL, DEFAULT_DEREGISTER_AFTER, DEFAULT_REGISTRY_URL,
    DEFAULT_SERVICE_BASE_URL, HealthCheckBuilder, HealthCheckOptions, RegistrationBuilder,
    RegistrationOptions, build_descriptor,
};
pub use descriptor::{HealthCheckDescriptor, RegistrationDescriptor, Weights};
pub use duration::{CheckDuration, TimeUnit};
pub use error::{RegistrationError, Result};
pub use health::{DEFAULT_HEALTH_ROUTE, health_response, is_health_request};
pub use port::{FixedPortAllocator, LoopbackPortAllocator, PortAllocator};
pub use publisher::{PublishEvent, PublishReport, RegistrationPolicy, RegistryPublisher};
pub use runner::{LifecycleResult, RegistrationRunner, StartupHook};
pub use shutdown::{ShutdownSignal, ShutdownTrigger, shutdown_channel};

/// Prelude for common imports.
///
/// ```
/// use consul_helper_registration::prelude::*;
/// ```
pub mod prelude {
    pub use crate::bootstrap::{RegistrationSettings, configure_consul_helper};
    pub use crate::builder::{RegistrationBuilder, RegistrationOptions, build_descriptor};
    pub use crate::descriptor::{RegistrationDescriptor, Weights};
    pub use crate::duration::TimeUnit;
    pub use crate::error::{RegistrationError, Result};
    pub use crate::publisher::{PublishReport, RegistryPublisher};
    pub use crate::runner::{RegistrationRunner, StartupHook};
    pub use crate::shutdown::{ShutdownSignal, shutdown_channel};
}
