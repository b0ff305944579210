//! Error types and handling utilities.
//!
//! Structured error taxonomy per spec §7: input errors reject a single
//! endpoint at load; transient/probe errors are absorbed locally into
//! samples and never reach this type; state-corruption (persistence) and
//! host-misuse errors surface to the caller as typed errors, never panics.

use std::fmt;
use thiserror::Error;

/// Scheduler error types with structured context.
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("invalid endpoint configuration: {message}")]
    InvalidEndpointConfig { message: String },

    #[error("persisted snapshot is corrupt and was discarded: {message}")]
    SnapshotCorrupt { message: String },

    #[error("dispatcher used before initialization")]
    NotInitialized,

    #[error("no endpoints configured and direct fallback disabled")]
    NoEndpoints,

    #[error("validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

impl SchedulerError {
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    #[must_use]
    pub fn invalid_endpoint_config(message: impl Into<String>) -> Self {
        Self::InvalidEndpointConfig { message: message.into() }
    }

    #[must_use]
    pub fn snapshot_corrupt(message: impl Into<String>) -> Self {
        Self::SnapshotCorrupt { message: message.into() }
    }

    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn timeout(timeout_ms: u64) -> Self {
        Self::Timeout { timeout_ms }
    }
}

/// Result type alias for convenience.
pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    fn with_context(self, context: &str) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: fmt::Display,
{
    fn with_context(self, context: &str) -> Result<T> {
        self.map_err(|e| SchedulerError::config(format!("{context}: {e}")))
    }
}

impl From<anyhow::Error> for SchedulerError {
    fn from(err: anyhow::Error) -> Self {
        SchedulerError::config(format!("operation failed: {err}"))
    }
}
