//! Action orchestration: lookup, validate, authorize, execute, notify

use crate::authorization::AuthorizationEngine;
use crate::error::{RuntimeError, RuntimeResult};
use crate::notify::{NotificationJob, NotificationSupervisor, Notifier};
use crate::state::{ExecutionState, Phase};
use actionkit_core::{
    panic_message, redact, validate, ActionConfig, ActionContext, ActionError, ActionLogger, ActionMetric,
    ActionResult, Environment, ErrorCode, HandlerError, HandlerServices, MetricsRecorder,
    NoopMetrics, RemoteError, RemoteExecutor, RemoteOperation, TracingLogger,
};
use actionkit_registry::ActionRegistry;
use futures::FutureExt;
use serde_json::{json, Value as JsonValue};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

/// `system` field of every metrics record
pub const METRICS_SYSTEM: &str = "actions";

const INTERNAL_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Entry point for executing registered actions.
///
/// `execute_action` never fails: every outcome, including panics inside
/// inline handlers, is returned as an [`ActionResult`].
pub struct ActionService {
    registry: Arc<ActionRegistry>,
    remote: Arc<dyn RemoteExecutor>,
    authorization: AuthorizationEngine,
    notifier: Option<Arc<dyn Notifier>>,
    supervisor: NotificationSupervisor,
    logger: Arc<dyn ActionLogger>,
    metrics: Arc<dyn MetricsRecorder>,
    environment: Environment,
}

pub struct ActionServiceBuilder {
    registry: Arc<ActionRegistry>,
    remote: Arc<dyn RemoteExecutor>,
    notifier: Option<Arc<dyn Notifier>>,
    logger: Arc<dyn ActionLogger>,
    metrics: Arc<dyn MetricsRecorder>,
    environment: Environment,
    membership_operation: Option<String>,
}

impl ActionServiceBuilder {
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn logger(mut self, logger: Arc<dyn ActionLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Operation used by `projectMember` rules
    pub fn membership_operation(mut self, operation_id: impl Into<String>) -> Self {
        self.membership_operation = Some(operation_id.into());
        self
    }

    pub fn build(self) -> RuntimeResult<ActionService> {
        let mut authorization =
            AuthorizationEngine::new(self.remote.clone()).with_logger(self.logger.clone());
        if let Some(operation_id) = self.membership_operation {
            if operation_id.trim().is_empty() {
                return Err(RuntimeError::config("membership operation ID must not be blank"));
            }
            authorization = authorization.with_membership_operation(operation_id);
        }

        tracing::info!(
            actions = self.registry.len(),
            environment = ?self.environment,
            notifier = self.notifier.is_some(),
            "Action service ready"
        );

        Ok(ActionService {
            registry: self.registry,
            remote: self.remote,
            authorization,
            notifier: self.notifier,
            supervisor: NotificationSupervisor::new(self.logger.clone()),
            logger: self.logger,
            metrics: self.metrics,
            environment: self.environment,
        })
    }
}

/// Tracks the state machine of one call and logs every checkpoint
struct Execution<'a> {
    logger: &'a dyn ActionLogger,
    action_key: &'a str,
    request_id: &'a str,
    state: ExecutionState,
}

impl<'a> Execution<'a> {
    fn advance(&mut self, next: ExecutionState) {
        debug_assert!(self.state.can_transition_to(&next), "{} -> {}", self.state, next);
        self.logger.debug(
            "Action phase checkpoint",
            &json!({
                "actionKey": self.action_key,
                "requestId": self.request_id,
                "from": self.state.name(),
                "to": next.to_string(),
            }),
        );
        self.state = next;
    }
}

type PhaseOutcome = Result<(Arc<ActionConfig>, JsonValue), (Phase, ActionError)>;

impl ActionService {
    pub fn builder(registry: Arc<ActionRegistry>, remote: Arc<dyn RemoteExecutor>) -> ActionServiceBuilder {
        ActionServiceBuilder {
            registry,
            remote,
            notifier: None,
            logger: Arc::new(TracingLogger),
            metrics: Arc::new(NoopMetrics),
            environment: Environment::default(),
            membership_operation: None,
        }
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn supervisor(&self) -> &NotificationSupervisor {
        &self.supervisor
    }

    /// Wait for detached notification deliveries, e.g. before shutdown
    pub async fn drain_notifications(&self) {
        self.supervisor.wait_idle().await;
    }

    pub async fn execute_action(
        &self,
        action_key: &str,
        params: JsonValue,
        context: ActionContext,
    ) -> ActionResult {
        let started = Instant::now();
        let mut execution = Execution {
            logger: self.logger.as_ref(),
            action_key,
            request_id: context.request_id(),
            state: ExecutionState::Started,
        };

        self.logger.info(
            "Action execution started",
            &json!({
                "actionKey": action_key,
                "userId": context.user_id(),
                "requestId": context.request_id(),
                "params": redact(&params),
            }),
        );

        let outcome = self.run_phases(&mut execution, action_key, &params, &context).await;
        let response_time_ms = started.elapsed().as_millis() as u64;

        let result = match outcome {
            Ok((config, data)) => {
                execution.advance(ExecutionState::Completed);
                self.logger.info(
                    "Action execution completed",
                    &json!({
                        "actionKey": action_key,
                        "requestId": context.request_id(),
                        "responseTimeMs": response_time_ms,
                    }),
                );
                let result = ActionResult::ok(data, config.update_strategy.clone());
                self.dispatch_notification(&config, params, &result, &context);
                result
            }
            Err((phase, error)) => {
                execution.advance(ExecutionState::Failed { phase, code: error.code.clone() });
                let fields = json!({
                    "actionKey": action_key,
                    "requestId": context.request_id(),
                    "phase": phase.as_str(),
                    "code": &error.code,
                    "message": &error.message,
                    "responseTimeMs": response_time_ms,
                });
                if phase == Phase::Execute {
                    self.logger.error("Action execution failed", &fields);
                } else {
                    self.logger.warn("Action execution failed", &fields);
                }
                ActionResult::failure(error)
            }
        };

        self.metrics.record(ActionMetric {
            system: METRICS_SYSTEM.to_string(),
            action_key: action_key.to_string(),
            user_id: context.user_id().to_string(),
            success: result.success,
            response_time_ms,
            error: result.error_code().map(ToString::to_string),
        });

        result
    }

    async fn run_phases(
        &self,
        execution: &mut Execution<'_>,
        action_key: &str,
        params: &JsonValue,
        context: &ActionContext,
    ) -> PhaseOutcome {
        let config = self.registry.get(action_key).ok_or_else(|| {
            (
                Phase::Lookup,
                ActionError::new(ErrorCode::UnknownAction, format!("Unknown action: {}", action_key)),
            )
        })?;

        let validation = validate(params, &config.param_schema);
        if !validation.valid {
            let error = ActionError::new(ErrorCode::ValidationFailed, "Parameter validation failed")
                .with_details(json!(validation.errors));
            return Err((Phase::Validate, error));
        }
        execution.advance(ExecutionState::Validated);

        let decision = self
            .authorization
            .authorize(context.user_id(), &config.auth_rules, params, context)
            .await;
        if !decision.authorized {
            let reason = decision.reason.unwrap_or_else(|| "Access denied".to_string());
            return Err((Phase::Authorize, ActionError::new(ErrorCode::Unauthorized, reason)));
        }
        execution.advance(ExecutionState::Authorized);

        let data = self
            .execute_operation(&config, params, context)
            .await
            .map_err(|error| (Phase::Execute, error))?;
        execution.advance(ExecutionState::Executed);

        Ok((config, data))
    }

    async fn execute_operation(
        &self,
        config: &ActionConfig,
        params: &JsonValue,
        context: &ActionContext,
    ) -> Result<JsonValue, ActionError> {
        match &config.remote_operation {
            RemoteOperation::Catalog(operation_id) => self
                .remote
                .execute(operation_id, params, context.bearer(), context.transport())
                .await
                .map_err(|e| self.remote_error(e)),
            RemoteOperation::Inline(handler) => {
                let services = HandlerServices { remote: self.remote.clone(), logger: self.logger.clone() };
                let handled = AssertUnwindSafe(handler.handle(params, context, &services))
                    .catch_unwind()
                    .await;
                match handled {
                    Ok(Ok(data)) => Ok(data),
                    Ok(Err(e)) => Err(self.handler_error(e)),
                    Err(panic) => Err(self.internal_error(format!(
                        "handler panicked: {}",
                        panic_message(panic.as_ref())
                    ))),
                }
            }
        }
    }

    fn remote_error(&self, error: RemoteError) -> ActionError {
        let message = error.to_string();
        match error {
            RemoteError::Backend { errors, .. } => ActionError::new(ErrorCode::StrapiError, message)
                .with_details(serde_json::to_value(&errors).unwrap_or_default()),
            RemoteError::Http { status, body } => ActionError::new(ErrorCode::HttpError, message)
                .with_details(json!({ "status": status, "body": body })),
            other => ActionError::new(other.code(), message),
        }
    }

    fn handler_error(&self, error: HandlerError) -> ActionError {
        match error {
            HandlerError::Remote(e) => self.remote_error(e),
            HandlerError::Domain { code, message, details } => ActionError {
                code: ErrorCode::parse(&code),
                message,
                details,
            },
            HandlerError::Other(e) => self.internal_error(format!("{:#}", e)),
        }
    }

    /// Raw cause is exposed only outside production-like environments
    fn internal_error(&self, cause: String) -> ActionError {
        let error = ActionError::new(ErrorCode::InternalError, INTERNAL_ERROR_MESSAGE);
        if self.environment.is_production_like() {
            error
        } else {
            error.with_details(json!({ "cause": cause }))
        }
    }

    fn dispatch_notification(
        &self,
        config: &ActionConfig,
        params: JsonValue,
        result: &ActionResult,
        context: &ActionContext,
    ) {
        let (Some(notification), Some(notifier)) = (&config.notification, &self.notifier) else {
            return;
        };

        self.supervisor.dispatch(
            notifier.clone(),
            NotificationJob {
                action_key: config.key.clone(),
                config: notification.clone(),
                params,
                result: result.clone(),
                context: context.clone(),
            },
        );
        self.logger.debug(
            "Notification dispatched",
            &json!({ "actionKey": config.key, "requestId": context.request_id() }),
        );
    }
}

impl std::fmt::Debug for ActionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionService")
            .field("actions", &self.registry.len())
            .field("notifier", &self.notifier.is_some())
            .field("environment", &self.environment)
            .finish()
    }
}
