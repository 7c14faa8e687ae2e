//! Serde helpers for settings that may arrive as text.
//!
//! Environment variables and `.env` files only carry strings, while JSON and
//! TOML carry typed values. Fields bound through these helpers accept both,
//! so `SERVICEDISCOVERY__PORT=5000` and `"Port": 5000` mean the same thing.
//!
//! ```rust
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Section {
//!     #[serde(default, deserialize_with = "consul_helper_config::lenient::option")]
//!     port: Option<u16>,
//! }
//!
//! let section: Section = serde_json::from_str(r#"{"port": "5000"}"#).unwrap();
//! assert_eq!(section.port, Some(5000));
//! ```

use serde::Deserialize;
use serde::de::{self, Deserializer};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Deserialize)]
#[serde(untagged)]
enum Raw<T> {
    Typed(T),
    Text(String),
}

impl<T> Raw<T>
where
    T: FromStr,
    T::Err: Display,
{
    fn resolve<E: de::Error>(self) -> Result<T, E> {
        match self {
            Raw::Typed(value) => Ok(value),
            Raw::Text(text) => parse(&text),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawList<T> {
    Items(Vec<Raw<T>>),
    Text(String),
}

fn parse<T, E>(text: &str) -> Result<T, E>
where
    T: FromStr,
    T::Err: Display,
    E: de::Error,
{
    text.trim()
        .parse()
        .map_err(|e| E::custom(format!("invalid value '{}': {}", text, e)))
}

/// A value given either typed or as its textual form.
pub fn value<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    Raw::<T>::deserialize(deserializer)?.resolve()
}

/// Optional form of [`value`].
pub fn option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    Option::<Raw<T>>::deserialize(deserializer)?
        .map(Raw::resolve)
        .transpose()
}

/// A list given as a sequence or as comma-separated text.
pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    match RawList::<T>::deserialize(deserializer)? {
        RawList::Items(items) => items.into_iter().map(Raw::resolve).collect(),
        RawList::Text(text) => text
            .split(',')
            .filter(|item| !item.trim().is_empty())
            .map(parse)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(default)]
    struct Section {
        #[serde(deserialize_with = "option")]
        port: Option<u16>,
        #[serde(deserialize_with = "value")]
        enabled: bool,
        #[serde(deserialize_with = "list")]
        tags: Vec<String>,
        name: Option<String>,
    }

    impl Default for Section {
        fn default() -> Self {
            Self {
                port: None,
                enabled: false,
                tags: Vec::new(),
                name: None,
            }
        }
    }

    #[test]
    fn test_typed_values() {
        let section: Section =
            serde_json::from_str(r#"{"port": 5000, "enabled": true, "tags": ["v1", "eu"]}"#)
                .unwrap();

        assert_eq!(section.port, Some(5000));
        assert!(section.enabled);
        assert_eq!(section.tags, vec!["v1", "eu"]);
    }

    #[test]
    fn test_textual_values() {
        let section: Section = serde_json::from_str(
            r#"{"port": " 5000", "enabled": "true", "tags": "v1, eu,", "name": "2048"}"#,
        )
        .unwrap();

        assert_eq!(section.port, Some(5000));
        assert!(section.enabled);
        assert_eq!(section.tags, vec!["v1", "eu"]);
        assert_eq!(section.name.as_deref(), Some("2048"));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let section: Section = serde_json::from_str("{}").unwrap();
        assert_eq!(section, Section::default());

        let section: Section = serde_json::from_str(r#"{"port": null}"#).unwrap();
        assert_eq!(section.port, None);
    }

    #[test]
    fn test_invalid_text_is_rejected() {
        let err = serde_json::from_str::<Section>(r#"{"port": "not a port"}"#).unwrap_err();
        assert!(err.to_string().contains("not a port"));

        assert!(serde_json::from_str::<Section>(r#"{"port": "70000"}"#).is_err());
    }
}
