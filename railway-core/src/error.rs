//! Error types shared by the engine and its host integrations.
//!
//! None of these ever reach the end user: hook and storage failures are
//! swallowed by [`run_best_effort`](crate::station::run_best_effort) and
//! [`PersistedFlags`](crate::store::PersistedFlags) respectively.
use thiserror::Error;

/// Failure reported by a station lifecycle hook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("station hook failed: {message}")]
pub struct HookError {
    message: String,
}

impl HookError {
    /// Build a hook error from anything printable.
    pub fn msg(message: impl std::fmt::Display) -> Self {
        Self {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Failure reported by a [`FlagStore`](crate::store::FlagStore) backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage write rejected for key {key}: {reason}")]
    WriteRejected { key: String, reason: String },
    #[error("storage read failed for key {key}: {reason}")]
    ReadFailed { key: String, reason: String },
}

/// Umbrella error for callers that want a single type.
#[derive(Debug, Error)]
pub enum RailwayError {
    #[error(transparent)]
    Hook(#[from] HookError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("tour configuration could not be parsed: {0}")]
    Config(#[from] serde_json::Error),
}
