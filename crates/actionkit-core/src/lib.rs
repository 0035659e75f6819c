pub mod auth;
pub mod context;
pub mod definition;
pub mod error;
pub mod observability;
pub mod remote;
pub mod result;
pub mod sanitization;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use auth::{authorizer_fn, json_authorizer_fn, AuthDecision, CustomAuthorizer, MalformedDecision};
pub use context::ActionContext;
pub use definition::{ActionDefinition, AuthRuleDefinition, ParamDefinition};
pub use error::{panic_message, CoreError, CoreResult};
pub use observability::{
    ActionLogger, ActionMetric, MetricsRecorder, NoopMetrics, TracingLogger, TracingMetrics,
};
pub use remote::{
    handler_fn, ErrorExtensions, GraphqlError, HandlerError, HandlerServices, InlineHandler,
    RemoteError, RemoteExecutor, Transport, TransportError, TransportRequest, TransportResponse,
};
pub use result::{ActionError, ActionResult, ErrorCode};
pub use sanitization::{is_sensitive_field, redact};
pub use types::{
    ActionConfig, AuthRule, AuthRuleKind, Environment, LocalizedText, NotificationConfig,
    ParamRule, ParamSchema, ParamType, ParamValidator, RemoteOperation, PRIMARY_LANGUAGE,
    SECONDARY_LANGUAGE, SUPPORTED_CHANNELS,
};
pub use validation::{validate, ValidationOutcome};
