// consul-helper - Consul self-registration for network services
//
// Umbrella crate: re-exports the registration API and the configuration,
// HTTP client and logging crates it is built on.

// Re-export registration functionality
pub use consul_helper_registration::*;

// Re-export supporting crates
pub use consul_helper_config as config;
pub use consul_helper_http_client as http_client;

#[cfg(feature = "log")]
pub use consul_helper_log as log;

/// Load configuration the way most hosts do: `.env`, then environment
/// variables carrying the `CONSUL_HELPER` prefix.
pub fn load_default_config() -> config::Result<config::ConfigManager> {
    let manager = config::ConfigManager::with_prefix(config::DEFAULT_ENV_PREFIX);
    manager.load_dotenv(None)?;
    Ok(manager)
}

// Prelude for common imports
pub mod prelude {
    pub use crate::config::{ConfigManager, FileFormat};
    pub use consul_helper_registration::prelude::*;
}
