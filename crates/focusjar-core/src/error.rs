//! Core error types for focusjar-core.
//!
//! Nothing in the core is fatal: storage failures degrade to defaults and
//! invalid transitions are ignored. The variants below are what remains
//! visible to callers (sync codes, advisor calls, configuration).

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focusjar-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Persistent store errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Sync payload errors
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Advisory service errors
    #[error("Advisor error: {0}")]
    Advisor(#[from] AdvisorError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persistent store errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the store
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Store is locked by another process
    #[error("Store is locked")]
    Locked,

    /// Write rejected (disk full, quota exceeded, injected failure)
    #[error("Write rejected for key '{key}': {message}")]
    WriteRejected { key: String, message: String },

    /// Data directory could not be prepared
    #[error("Data directory unavailable: {0}")]
    DataDir(#[from] std::io::Error),
}

/// Configuration-specific errors.
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

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

/// Sync payload errors.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Data is neither a payload nor a text code wrapping one
    #[error("Invalid sync code format: {0}")]
    InvalidFormat(String),

    /// Destructive import attempted without confirmation
    #[error("Import replaces all local data and must be confirmed")]
    NotConfirmed,
}

/// Advisory service errors. Recoverable; never block task creation.
#[derive(Error, Debug)]
pub enum AdvisorError {
    /// Endpoint configured but not a valid URL
    #[error("Invalid advisor endpoint '{endpoint}': {message}")]
    InvalidEndpoint { endpoint: String, message: String },

    /// Transport failure
    #[error("Could not reach the advisor: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("Advisor returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Response did not match the expected schema
    #[error("Could not get feedback from the advisor: {0}")]
    InvalidResponse(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg)
                if e.code == rusqlite::ErrorCode::DatabaseBusy
                    || e.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                StorageError::Locked
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
