//! Error types for the action registry

use thiserror::Error;

/// Registration failures; nothing is inserted when one of these is returned
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid action config '{key}': {reason}")]
    InvalidConfig { key: String, reason: String },

    #[error("Action '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("Action '{key}' references unknown {kind} '{name}'")]
    UnknownCapability { key: String, kind: &'static str, name: String },
}

impl RegistryError {
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig { key: key.into(), reason: reason.into() }
    }
}

/// Registry result type
pub type RegistryResult<T> = Result<T, RegistryError>;
