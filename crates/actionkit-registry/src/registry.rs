//! The action registry: single source of truth for every request-time phase

use crate::capabilities::Capabilities;
use crate::definition::config_from_definition;
use crate::error::{RegistryError, RegistryResult};
use actionkit_core::{
    ActionConfig, ActionDefinition, NotificationConfig, RemoteOperation, SUPPORTED_CHANNELS,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Validated action configs keyed by action key.
///
/// Populated once at startup, then shared read-only (typically behind an
/// `Arc`) with the orchestration service.
#[derive(Debug, Default)]
pub struct ActionRegistry {
    actions: HashMap<String, Arc<ActionConfig>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and insert `config`; on error the registry is left unchanged
    pub fn register(&mut self, config: ActionConfig) -> RegistryResult<()> {
        validate_config(&config)?;

        if self.actions.contains_key(&config.key) {
            return Err(RegistryError::AlreadyRegistered(config.key));
        }

        tracing::debug!(
            action_key = %config.key,
            params = config.param_schema.len(),
            auth_rules = config.auth_rules.len(),
            notifies = config.notification.is_some(),
            "Registered action"
        );
        self.actions.insert(config.key.clone(), Arc::new(config));
        Ok(())
    }

    /// Convert a serialized definition and register it
    pub fn register_definition(
        &mut self,
        definition: ActionDefinition,
        capabilities: &Capabilities,
    ) -> RegistryResult<()> {
        let config = config_from_definition(definition, capabilities)?;
        self.register(config)
    }

    pub fn get(&self, key: &str) -> Option<Arc<ActionConfig>> {
        self.actions.get(key).cloned()
    }

    pub fn has(&self, key: &str) -> bool {
        self.actions.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Registered keys, sorted
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Drop every registration (test teardown only)
    #[cfg(any(test, feature = "test-support"))]
    pub fn clear(&mut self) {
        self.actions.clear();
    }
}

fn validate_config(config: &ActionConfig) -> RegistryResult<()> {
    let key = config.key.trim();
    if key.is_empty() {
        return Err(RegistryError::invalid("<unnamed>", "action key is required"));
    }
    let invalid = |reason: String| Err(RegistryError::invalid(key, reason));

    if config.description.trim().is_empty() {
        return invalid("description is required".to_string());
    }

    if let RemoteOperation::Catalog(operation_id) = &config.remote_operation {
        if operation_id.trim().is_empty() {
            return invalid("a remote operation reference is required".to_string());
        }
    }

    if let Some(name) = config.param_schema.keys().find(|name| name.trim().is_empty()) {
        return invalid(format!("parameter name '{}' is blank", name));
    }

    if let Some(notification) = &config.notification {
        validate_notification(notification).or_else(invalid)?;
    }

    Ok(())
}

fn validate_notification(notification: &NotificationConfig) -> Result<(), String> {
    match &notification.recipients {
        None | Some(serde_json::Value::Null) => {
            return Err("notification config is missing a recipients descriptor".to_string())
        }
        Some(_) => {}
    }

    let templates = [("title", &notification.title), ("body", &notification.body)];
    for (field, template) in templates {
        match template {
            None => return Err(format!("notification config is missing the {} template", field)),
            Some(text) if !text.has_base_variant() => {
                return Err(format!(
                    "notification {} template needs a primary or secondary language variant",
                    field
                ))
            }
            Some(_) => {}
        }
    }

    if notification.channels.is_empty() {
        return Err("notification config must list at least one channel".to_string());
    }

    if let Some(channel) =
        notification.channels.iter().find(|c| !SUPPORTED_CHANNELS.contains(&c.as_str()))
    {
        return Err(format!(
            "unsupported notification channel '{}' (supported: {})",
            channel,
            SUPPORTED_CHANNELS.join(", ")
        ));
    }

    Ok(())
}
