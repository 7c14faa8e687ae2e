// Layered configuration for consul-helper
//
// Sources (files, .env, environment) are merged into one value tree whose
// keys are case-folded, so `ServiceDiscovery.ConsulUrl` in a JSON file and
// `SERVICEDISCOVERY__CONSULURL` in the environment address the same setting.

pub mod env;
pub mod error;
pub mod lenient;
pub mod loader;

pub use env::EnvLoader;
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Default prefix for environment variables.
pub const DEFAULT_ENV_PREFIX: &str = "CONSUL_HELPER";

/// Main configuration manager
#[derive(Clone)]
pub struct ConfigManager {
    config: Arc<RwLock<Map<String, Value>>>,
    env_prefix: Option<String>,
}

impl ConfigManager {
    /// Create a new configuration manager
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(Map::new())),
            env_prefix: None,
        }
    }

    /// Create with environment variable prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            config: Arc::new(RwLock::new(Map::new())),
            env_prefix: Some(prefix.into()),
        }
    }

    /// Load configuration from environment variables
    pub fn load_env(&self) {
        let tree = EnvLoader::new(self.env_prefix.clone()).load();
        self.merge_value(tree);
    }

    /// Load configuration from .env file
    pub fn load_dotenv(&self, path: Option<&Path>) -> Result<()> {
        if let Some(path) = path {
            dotenvy::from_path(path).map_err(|e| ConfigError::Unreadable {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        } else {
            dotenvy::dotenv().ok(); // Ignore if .env doesn't exist
        }
        self.load_env();
        Ok(())
    }

    /// Load configuration from file
    pub fn load_file(&self, path: impl AsRef<Path>, format: FileFormat) -> Result<()> {
        let loader = ConfigLoader::new(format);
        let data = loader.load_file(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "Loaded configuration file");
        self.merge_value(data);
        Ok(())
    }

    /// Load configuration from an in-memory document
    pub fn load_str(&self, content: &str, format: FileFormat) -> Result<()> {
        let data = ConfigLoader::new(format).parse(content)?;
        self.merge_value(data);
        Ok(())
    }

    /// Set a configuration value; `key` may be a dotted path
    pub fn set<T: serde::Serialize>(&self, key: &str, value: T) -> Result<()> {
        let json_value = serde_json::to_value(value)
            .map_err(|e| ConfigError::Store {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        let mut tree = Value::Object(Map::new());
        env::insert_path(&mut tree, &key.replace('.', env::SECTION_SEPARATOR), json_value);
        self.merge_value(tree);

        Ok(())
    }

    /// Get a configuration value; `key` may be a dotted path.
    ///
    /// A string value is also read as JSON when the requested type needs
    /// it, so `"5000"` from the environment binds to a `u16`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self
            .lookup(key)
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))?;

        let text = value.as_str().map(str::to_owned);
        serde_json::from_value(value).or_else(|e| {
            text.and_then(|text| serde_json::from_str(&text).ok())
                .ok_or_else(|| ConfigError::Bind {
                    key: key.to_string(),
                    message: e.to_string(),
                })
        })
    }

    /// Get a string value
    pub fn get_string(&self, key: &str) -> Result<String> {
        self.get(key)
    }

    /// Bind a named section into a typed value.
    ///
    /// Section and field names are matched case-insensitively, so the target
    /// type should name its fields in lowercase (`#[serde(rename = "consulurl")]`).
    /// Non-string fields that may come from the environment should bind
    /// through [`lenient`].
    pub fn get_section<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        self.get(name)
    }

    fn lookup(&self, key: &str) -> Option<Value> {
        let config = self.config.read();
        let mut segments = key.split('.').map(|s| s.to_lowercase());

        let first = segments.next()?;
        let mut node = config.get(&first)?;
        for segment in segments {
            node = node.get(&segment)?;
        }

        Some(node.clone())
    }

    fn merge_value(&self, value: Value) {
        let Value::Object(incoming) = fold_keys(value) else {
            return;
        };

        let mut config = self.config.write();
        for (key, value) in incoming {
            match config.get_mut(&key) {
                Some(existing) => deep_merge(existing, value),
                None => {
                    config.insert(key, value);
                }
            }
        }
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercase every object key, recursively.
fn fold_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k.to_lowercase(), fold_keys(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(fold_keys).collect()),
        other => other,
    }
}

fn deep_merge(target: &mut Value, incoming: Value) {
    match (target, incoming) {
        (Value::Object(target), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match target.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, incoming) => *target = incoming,
    }
}
