//! Construction-time failures of the remote client and its parts.
//!
//! Request-time failures are always a classified [`actionkit_core::RemoteError`].

use actionkit_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Catalog error: {0}")]
    Catalog(String),
}

impl From<ConnectorError> for CoreError {
    fn from(err: ConnectorError) -> Self {
        match err {
            ConnectorError::Serialization(e) => CoreError::Serde(e.to_string()),
            ConnectorError::Yaml(e) => CoreError::Serde(e.to_string()),
            ConnectorError::InvalidEndpoint { .. } | ConnectorError::InvalidConfig(_) => {
                CoreError::Invalid(err.to_string())
            }
            other => CoreError::Other(other.to_string()),
        }
    }
}

pub type ConnectorResult<T> = Result<T, ConnectorError>;
