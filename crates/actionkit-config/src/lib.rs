pub mod env_resolver;
pub mod error;
pub mod loader;
pub mod settings;

pub use env_resolver::{EnvResolver, EnvResolverError};
pub use error::{ConfigError, ConfigResult};
pub use loader::{FileFormat, SettingsLoader};
pub use settings::{AuthorizationSettings, BackendSettings, CatalogSettings, Settings};
