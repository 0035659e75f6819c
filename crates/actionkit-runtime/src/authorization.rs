//! Ordered authorization rule chain

use actionkit_core::{
    panic_message, ActionContext, ActionLogger, AuthDecision, AuthRule, AuthRuleKind, CustomAuthorizer,
    MalformedDecision, RemoteExecutor, TracingLogger,
};
use futures::FutureExt;
use serde_json::{json, Value as JsonValue};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Operation used by `projectMember` rules unless configured otherwise
pub const DEFAULT_MEMBERSHIP_OPERATION: &str = "checkProjectMembership";

/// Parameter path used by `projectMember` rules without an explicit path
pub const DEFAULT_PROJECT_PATH: &str = "projectId";

const AUTHENTICATION_REQUIRED: &str = "Authentication required";
const PROJECT_NOT_RESOLVED: &str = "Project ID is required for project membership check";
const NOT_A_MEMBER: &str = "User is not a member of this project";
const MEMBERSHIP_CHECK_FAILED: &str = "Failed to verify project membership";
const NO_ROLES: &str = "No roles configured for role-based authorization";
const NO_PREDICATE: &str = "Custom authorization rule has no predicate";
const PREDICATE_FAILED: &str = "Custom authorization check failed";
const PREDICATE_INVALID: &str = "Custom authorization predicate returned an invalid result";
const PREDICATE_DENIED: &str = "Access denied";

pub struct AuthorizationEngine {
    remote: Arc<dyn RemoteExecutor>,
    membership_operation: String,
    logger: Arc<dyn ActionLogger>,
}

impl AuthorizationEngine {
    pub fn new(remote: Arc<dyn RemoteExecutor>) -> Self {
        Self {
            remote,
            membership_operation: DEFAULT_MEMBERSHIP_OPERATION.to_string(),
            logger: Arc::new(TracingLogger),
        }
    }

    pub fn with_membership_operation(mut self, operation_id: impl Into<String>) -> Self {
        self.membership_operation = operation_id.into();
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn ActionLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn membership_operation(&self) -> &str {
        &self.membership_operation
    }

    /// Evaluate `rules` in order; the first denial wins and later rules are
    /// never evaluated. An empty chain authorizes.
    pub async fn authorize(
        &self,
        user_id: &str,
        rules: &[AuthRule],
        params: &JsonValue,
        context: &ActionContext,
    ) -> AuthDecision {
        for (index, rule) in rules.iter().enumerate() {
            let decision = self.check_rule(user_id, &rule.kind, params, context).await;
            if decision.authorized {
                continue;
            }

            let reason = rule
                .error_message
                .clone()
                .or(decision.reason)
                .unwrap_or_else(|| PREDICATE_DENIED.to_string());
            tracing::debug!(rule = rule.kind.name(), index, reason = %reason, "Authorization denied");
            return AuthDecision::deny(reason);
        }

        AuthDecision::allow()
    }

    async fn check_rule(
        &self,
        user_id: &str,
        kind: &AuthRuleKind,
        params: &JsonValue,
        context: &ActionContext,
    ) -> AuthDecision {
        match kind {
            AuthRuleKind::Jwt => match context.bearer() {
                Some(_) => AuthDecision::allow(),
                None => AuthDecision::deny(AUTHENTICATION_REQUIRED),
            },
            AuthRuleKind::ProjectMember { path } => {
                let path = path.as_deref().unwrap_or(DEFAULT_PROJECT_PATH);
                match resolve_path(params, path) {
                    Some(project_id) => self.check_membership(user_id, &project_id, context).await,
                    None => AuthDecision::deny(PROJECT_NOT_RESOLVED),
                }
            }
            AuthRuleKind::Role { roles } => {
                if roles.is_empty() {
                    return AuthDecision::deny(NO_ROLES);
                }
                self.logger.warn(
                    "Role-based authorization is not implemented; rule passes without checking roles",
                    &json!({ "userId": user_id, "roles": roles }),
                );
                AuthDecision::allow()
            }
            AuthRuleKind::Custom { predicate } => match predicate {
                Some(predicate) => self.check_custom(predicate.as_ref(), user_id, params, context).await,
                None => AuthDecision::deny(NO_PREDICATE),
            },
        }
    }

    async fn check_membership(
        &self,
        user_id: &str,
        project_id: &str,
        context: &ActionContext,
    ) -> AuthDecision {
        let variables = json!({ "userId": user_id, "projectId": project_id });
        let response = self
            .remote
            .execute(&self.membership_operation, &variables, context.bearer(), context.transport())
            .await;

        match response {
            Ok(data) if has_projects(&data) => AuthDecision::allow(),
            Ok(_) => AuthDecision::deny(NOT_A_MEMBER),
            Err(e) => {
                self.logger.error(
                    "Project membership check failed",
                    &json!({ "userId": user_id, "projectId": project_id, "code": e.code(), "error": e.to_string() }),
                );
                AuthDecision::deny(MEMBERSHIP_CHECK_FAILED)
            }
        }
    }

    async fn check_custom(
        &self,
        predicate: &dyn CustomAuthorizer,
        user_id: &str,
        params: &JsonValue,
        context: &ActionContext,
    ) -> AuthDecision {
        let outcome = match AssertUnwindSafe(predicate.authorize(user_id, params, context)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => {
                self.logger.warn(
                    "Custom authorization predicate panicked",
                    &json!({ "error": panic_message(panic.as_ref()) }),
                );
                return AuthDecision::deny(PREDICATE_FAILED);
            }
        };

        match outcome {
            Ok(decision) if decision.authorized => decision,
            Ok(decision) => AuthDecision::deny(decision.reason.unwrap_or_else(|| PREDICATE_DENIED.to_string())),
            Err(e) if e.downcast_ref::<MalformedDecision>().is_some() => {
                self.logger.warn("Custom authorization predicate returned an invalid result", &json!({ "error": e.to_string() }));
                AuthDecision::deny(PREDICATE_INVALID)
            }
            Err(e) => {
                self.logger.warn("Custom authorization predicate failed", &json!({ "error": e.to_string() }));
                AuthDecision::deny(PREDICATE_FAILED)
            }
        }
    }
}

/// Walk a dot-separated path; only non-blank string or number leaves resolve
fn resolve_path(params: &JsonValue, path: &str) -> Option<String> {
    let leaf = path.split('.').try_fold(params, |node, segment| node.get(segment))?;
    match leaf {
        JsonValue::String(s) if !s.trim().is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn has_projects(data: &JsonValue) -> bool {
    let projects = &data["projects"];
    let list = projects.as_array().or_else(|| projects["data"].as_array());
    list.map_or(false, |items| !items.is_empty())
}
