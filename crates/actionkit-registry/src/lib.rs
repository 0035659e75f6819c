pub mod capabilities;
pub mod definition;
pub mod error;
pub mod registry;

// Re-export commonly used types
pub use capabilities::Capabilities;
pub use definition::config_from_definition;
pub use error::{RegistryError, RegistryResult};
pub use registry::ActionRegistry;
