pub mod authorization;
pub mod error;
pub mod notify;
pub mod registry;
pub mod service;
pub mod state;

pub use authorization::{AuthorizationEngine, DEFAULT_MEMBERSHIP_OPERATION, DEFAULT_PROJECT_PATH};
pub use error::{RuntimeError, RuntimeResult};
pub use notify::{NotificationJob, NotificationSupervisor, Notifier};
pub use registry::registry_from_definitions;
pub use service::{ActionService, ActionServiceBuilder, METRICS_SYSTEM};
pub use state::{ExecutionState, Phase};
