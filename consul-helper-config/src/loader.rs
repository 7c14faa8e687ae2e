// Configuration file loaders

use crate::{ConfigError, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileFormat {
    Json,
    Toml,
    Env,
}

impl FileFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(FileFormat::Json),
            "toml" => Some(FileFormat::Toml),
            "env" => Some(FileFormat::Env),
            _ => None,
        }
    }
}

/// Configuration file loader
pub struct ConfigLoader {
    format: FileFormat,
}

impl ConfigLoader {
    pub fn new(format: FileFormat) -> Self {
        Self { format }
    }

    /// Auto-detect format from file extension
    pub fn auto(path: impl AsRef<Path>) -> Result<Self> {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                ConfigError::UnsupportedFormat(format!("{} has no extension", path.as_ref().display()))
            })?;

        let format = FileFormat::from_extension(ext)
            .ok_or_else(|| ConfigError::UnsupportedFormat(ext.to_string()))?;

        Ok(Self::new(format))
    }

    /// Load configuration from file
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Value> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Unreadable {
            path: path.as_ref().to_path_buf(),
            message: e.to_string(),
        })?;

        self.parse(&content)
    }

    /// Parse configuration from string
    pub fn parse(&self, content: &str) -> Result<Value> {
        match self.format {
            FileFormat::Json => self.parse_json(content),
            FileFormat::Toml => self.parse_toml(content),
            FileFormat::Env => self.parse_env(content),
        }
    }

    fn parse_json(&self, content: &str) -> Result<Value> {
        serde_json::from_str(content)
            .map_err(|e| self.parse_error(e))
    }

    fn parse_toml(&self, content: &str) -> Result<Value> {
        let toml_value: toml::Value = toml::from_str(content)
            .map_err(|e| self.parse_error(e))?;

        serde_json::to_value(toml_value)
            .map_err(|e| self.parse_error(e))
    }

    fn parse_error(&self, error: impl std::fmt::Display) -> ConfigError {
        ConfigError::Parse {
            format: self.format,
            message: error.to_string(),
        }
    }

    // KEY=value lines; `__` in a key nests it under a section
    fn parse_env(&self, content: &str) -> Result<Value> {
        let mut root = Value::Object(serde_json::Map::new());

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let value = value.trim().trim_matches('"').trim_matches('\'');
                crate::env::insert_path(&mut root, key.trim(), Value::String(value.to_string()));
            }
        }

        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json() {
        let loader = ConfigLoader::new(FileFormat::Json);
        let json = r#"{"ServiceDiscovery": {"Name": "billing", "Port": 5000}}"#;

        let result = loader.parse(json).unwrap();
        assert_eq!(result["ServiceDiscovery"]["Port"], 5000);
    }

    #[test]
    fn test_parse_toml() {
        let loader = ConfigLoader::new(FileFormat::Toml);
        let toml = r#"
            [ServiceDiscovery]
            Name = "billing"
            Tags = ["v1", "eu"]
        "#;

        let result = loader.parse(toml).unwrap();
        assert_eq!(result["ServiceDiscovery"]["Name"], "billing");
        assert_eq!(result["ServiceDiscovery"]["Tags"][1], "eu");
    }

    #[test]
    fn test_parse_env() {
        let loader = ConfigLoader::new(FileFormat::Env);
        let env = r#"
            SERVICEDISCOVERY__NAME=billing
            SERVICEDISCOVERY__PORT=5000
            # Comment
            QUOTED="quoted value"
        "#;

        let result = loader.parse(env).unwrap();
        assert_eq!(result["servicediscovery"]["name"], "billing");
        assert_eq!(result["servicediscovery"]["port"], "5000");
        assert_eq!(result["quoted"], "quoted value");
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(FileFormat::from_extension("json"), Some(FileFormat::Json));
        assert_eq!(FileFormat::from_extension("TOML"), Some(FileFormat::Toml));
        assert_eq!(FileFormat::from_extension("env"), Some(FileFormat::Env));
        assert_eq!(FileFormat::from_extension("unknown"), None);
        assert!(ConfigLoader::auto("settings.yaml").is_err());
    }

    #[test]
    fn test_parse_error_names_format() {
        let err = ConfigLoader::new(FileFormat::Json).parse("{").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { format: FileFormat::Json, .. }));

        let err = ConfigLoader::auto("settings.yaml").err().unwrap();
        assert!(matches!(err, ConfigError::UnsupportedFormat(ext) if ext == "yaml"));
    }
}
