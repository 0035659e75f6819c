//! Error types for the CLI

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] actionkit_config::ConfigError),

    #[error("Registry error: {0}")]
    Registry(#[from] actionkit_registry::RegistryError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] actionkit_runtime::RuntimeError),

    #[error("Connector error: {0}")]
    Connector(#[from] actionkit_connectors::ConnectorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    /// The action ran and returned `success: false`
    #[error("Action failed with {0}")]
    ActionFailed(String),

    #[error("Check failed: {0}")]
    CheckFailed(String),

    #[error("General error: {0}")]
    General(String),
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        Self::General(format!("{:#}", err))
    }
}

pub type CliResult<T> = Result<T, CliError>;
