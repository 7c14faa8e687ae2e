// Configuration errors

use crate::loader::FileFormat;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration key not found: {0}")]
    KeyNotFound(String),

    #[error("Cannot read configuration from {}: {message}", path.display())]
    Unreadable { path: PathBuf, message: String },

    #[error("Unsupported configuration source: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid {format:?} configuration: {message}")]
    Parse { format: FileFormat, message: String },

    #[error("Value for '{key}' cannot be stored: {message}")]
    Store { key: String, message: String },

    #[error("Value at '{key}' does not match the requested type: {message}")]
    Bind { key: String, message: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
