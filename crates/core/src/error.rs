//! Error type for registry operations

use thiserror::Error;

/// Errors surfaced to callers of the registry
///
/// Sampling failures and sidecar/native id collisions are not errors here;
/// they are logged and swallowed by the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No source with this id is known
    #[error("widget '{0}' not found")]
    NotFound(String),

    /// Built-in modules live for the whole process and cannot be removed
    #[error("widget '{0}' is a built-in module and cannot be removed")]
    ProtectedNative(String),

    #[error("invalid window mode: {0:?} (expected \"normal\" or \"locked\")")]
    InvalidWindowMode(String),

    #[error("opacity must be between {min} and {max}, got {value}")]
    OpacityOutOfRange { value: f64, min: f64, max: f64 },

    /// Writing the config file failed; nothing is retried
    #[error(transparent)]
    Persist(#[from] anyhow::Error),
}

pub type RegistryResult<T> = Result<T, RegistryError>;
