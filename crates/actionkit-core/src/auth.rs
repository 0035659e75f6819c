//! Authorization decisions and the custom-rule predicate contract

use crate::context::ActionContext;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Outcome of an authorization check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthDecision {
    pub authorized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AuthDecision {
    pub fn allow() -> Self {
        Self { authorized: true, reason: None }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self { authorized: false, reason: Some(reason.into()) }
    }

    /// Interpret a raw predicate result; `authorized` must be a boolean
    pub fn from_value(value: &JsonValue) -> Result<Self, MalformedDecision> {
        let authorized = value
            .get("authorized")
            .and_then(JsonValue::as_bool)
            .ok_or_else(|| MalformedDecision(value.to_string()))?;
        let reason = value.get("reason").and_then(JsonValue::as_str).map(str::to_string);
        Ok(Self { authorized, reason })
    }
}

/// A predicate produced something that is not an [`AuthDecision`]
#[derive(Debug, Clone, Error)]
#[error("predicate returned an invalid result: {0}")]
pub struct MalformedDecision(pub String);

/// Predicate behind a `custom` authorization rule
#[async_trait]
pub trait CustomAuthorizer: Send + Sync {
    async fn authorize(
        &self,
        user_id: &str,
        params: &JsonValue,
        context: &ActionContext,
    ) -> anyhow::Result<AuthDecision>;
}

pub struct FnAuthorizer<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> CustomAuthorizer for FnAuthorizer<F>
where
    F: Fn(String, JsonValue, ActionContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<AuthDecision>> + Send + 'static,
{
    async fn authorize(
        &self,
        user_id: &str,
        params: &JsonValue,
        context: &ActionContext,
    ) -> anyhow::Result<AuthDecision> {
        (self.f)(user_id.to_string(), params.clone(), context.clone()).await
    }
}

/// Closure-backed predicate returning a raw JSON result
pub struct JsonFnAuthorizer<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> CustomAuthorizer for JsonFnAuthorizer<F>
where
    F: Fn(String, JsonValue, ActionContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<JsonValue>> + Send + 'static,
{
    async fn authorize(
        &self,
        user_id: &str,
        params: &JsonValue,
        context: &ActionContext,
    ) -> anyhow::Result<AuthDecision> {
        let raw = (self.f)(user_id.to_string(), params.clone(), context.clone()).await?;
        Ok(AuthDecision::from_value(&raw)?)
    }
}

pub fn authorizer_fn<F, Fut>(f: F) -> Arc<dyn CustomAuthorizer>
where
    F: Fn(String, JsonValue, ActionContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<AuthDecision>> + Send + 'static,
{
    Arc::new(FnAuthorizer { f })
}

pub fn json_authorizer_fn<F, Fut>(f: F) -> Arc<dyn CustomAuthorizer>
where
    F: Fn(String, JsonValue, ActionContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<JsonValue>> + Send + 'static,
{
    Arc::new(JsonFnAuthorizer { f })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decision_from_value() {
        let decision =
            AuthDecision::from_value(&json!({"authorized": false, "reason": "nope"})).unwrap();
        assert_eq!(decision, AuthDecision::deny("nope"));

        assert!(AuthDecision::from_value(&json!({"authorized": "yes"})).is_err());
        assert!(AuthDecision::from_value(&json!({"reason": "missing flag"})).is_err());
    }

    #[tokio::test]
    async fn test_json_authorizer_surfaces_malformed_result() {
        let predicate = json_authorizer_fn(|_, _, _| async { Ok(json!({"ok": true})) });
        let ctx = ActionContext::new("u1", "jwt", "en");

        let err = predicate.authorize("u1", &json!({}), &ctx).await.unwrap_err();
        assert!(err.downcast_ref::<MalformedDecision>().is_some());
    }
}
