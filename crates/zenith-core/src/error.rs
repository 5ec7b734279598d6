//! Core error types for zenith-core.
//!
//! Every fallible operation in the library reports through one of these
//! enums. The sequencer itself never returns errors from its control
//! surface; only `bind` surfaces a [`ValidationError`].

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for zenith-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-file errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Timer configuration failed validation
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Template store errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The async tick driver task has exited
    #[error("Timer driver is not running")]
    DriverStopped,

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Errors raised while reading or writing `config.toml`.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration schema
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// A timer configuration that cannot be run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No segments at all
    #[error("configuration '{id}' has no segments")]
    NoSegments { id: String },

    /// A segment without work items
    #[error("segment {index} ('{name}') has no work items")]
    EmptyWork { index: usize, name: String },

    /// A segment whose work items last zero seconds
    #[error("segment {index} ('{name}') has a work duration of 0 seconds")]
    ZeroDuration { index: usize, name: String },
}

/// Template store errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// No template with this id
    #[error("No timer template with id '{0}'")]
    NotFound(String),

    /// Built-in templates are read-only
    #[error("Timer template '{0}' is built in and cannot be modified")]
    BuiltinReadOnly(String),

    /// Template file exists but could not be parsed
    #[error("Template file {path} is corrupt: {message}")]
    Corrupt { path: PathBuf, message: String },
}

/// Failure reported by a side-effect sink.
///
/// The sequencer logs and discards these; they never interrupt a run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// Platform refused playback (no user gesture yet, device busy)
    #[error("Audio playback blocked: {0}")]
    AudioBlocked(String),

    /// Notification could not be delivered
    #[error("Notification failed: {0}")]
    NotificationFailed(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
