use actionkit_registry::RegistryError;
use thiserror::Error;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Wiring failures; request-time failures are always an `ActionResult`
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

impl RuntimeError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
