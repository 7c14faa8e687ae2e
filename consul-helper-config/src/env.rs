// Environment variable loading

use serde_json::{Map, Value};
use std::env;

/// Separator that nests an environment key under a section.
pub const SECTION_SEPARATOR: &str = "__";

/// Environment variable loader
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    /// Create a new environment loader
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Load matching environment variables as a nested value tree.
    ///
    /// With prefix `APP`, `APP_SERVICEDISCOVERY__PORT=5000` becomes
    /// `{"servicediscovery": {"port": "5000"}}`. Values stay strings; typed
    /// fields convert them when bound.
    pub fn load(&self) -> Value {
        self.load_from(env::vars())
    }

    /// Same as [`EnvLoader::load`], reading from the given pairs.
    pub fn load_from<I>(&self, vars: I) -> Value
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut root = Value::Object(Map::new());

        for (key, value) in vars {
            let key = match &self.prefix {
                Some(prefix) => match key.strip_prefix(prefix.as_str()) {
                    Some(rest) => rest.trim_start_matches('_').to_string(),
                    None => continue,
                },
                None => key,
            };

            if key.is_empty() {
                continue;
            }

            insert_path(&mut root, &key, Value::String(value));
        }

        root
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Insert `value` at the `__`-separated, case-folded `key` path.
pub(crate) fn insert_path(root: &mut Value, key: &str, value: Value) {
    let segments: Vec<String> = key
        .split(SECTION_SEPARATOR)
        .map(|s| s.to_lowercase())
        .collect();

    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut node = root;
    for segment in parents {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let Some(map) = node.as_object_mut() else {
            return;
        };
        node = map
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Some(map) = node.as_object_mut() {
        map.insert(last.clone(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Note: std::env::set_var is unsafe on edition 2024, so the loader is
    // exercised through `load_from` with explicit pairs.

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_prefix_filters_and_strips() {
        let loader = EnvLoader::new(Some("CONSUL_HELPER".to_string()));
        let tree = loader.load_from(vars(&[
            ("CONSUL_HELPER_SERVICEDISCOVERY__NAME", "billing"),
            ("CONSUL_HELPER_SERVICEDISCOVERY__PORT", "5000"),
            ("PATH", "/usr/bin"),
        ]));

        assert_eq!(tree["servicediscovery"]["name"], "billing");
        assert_eq!(tree["servicediscovery"]["port"], "5000");
        assert!(tree.get("path").is_none());
    }

    #[test]
    fn test_values_stay_text() {
        let loader = EnvLoader::new(None);
        let tree = loader.load_from(vars(&[
            ("SERVICEDISCOVERY__NAME", "2048"),
            ("SERVICEDISCOVERY__ENABLETAGOVERRIDE", "true"),
        ]));

        assert_eq!(tree["servicediscovery"]["name"], "2048");
        assert_eq!(tree["servicediscovery"]["enabletagoverride"], "true");
    }

    #[test]
    fn test_nested_sections() {
        let loader = EnvLoader::new(None);
        let tree = loader.load_from(vars(&[("A__B__C", "deep")]));

        assert_eq!(tree["a"]["b"]["c"], "deep");
    }
}
