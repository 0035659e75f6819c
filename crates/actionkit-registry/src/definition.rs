//! Conversion of serialized [`ActionDefinition`]s into typed [`ActionConfig`]s

use crate::capabilities::Capabilities;
use crate::error::{RegistryError, RegistryResult};
use actionkit_core::{
    ActionConfig, ActionDefinition, AuthRule, AuthRuleDefinition, AuthRuleKind, ParamDefinition,
    ParamRule, ParamType, RemoteOperation,
};
use serde_json::Value as JsonValue;

const UNNAMED: &str = "<unnamed>";

/// Build a typed config, resolving capability names against `capabilities`.
///
/// Only the checks that need the untyped form happen here (type names,
/// `required` flags, capability references); the remaining structural checks
/// run in [`crate::ActionRegistry::register`].
pub fn config_from_definition(
    definition: ActionDefinition,
    capabilities: &Capabilities,
) -> RegistryResult<ActionConfig> {
    let key = definition.key.clone().unwrap_or_default();
    let label = if key.trim().is_empty() { UNNAMED.to_string() } else { key.clone() };

    let remote_operation = match (&definition.operation, &definition.handler) {
        (Some(_), Some(_)) => {
            return Err(RegistryError::invalid(
                &label,
                "only one of 'operation' or 'handler' may be set",
            ))
        }
        (Some(operation), None) => RemoteOperation::Catalog(operation.clone()),
        (None, Some(handler)) => {
            let resolved = capabilities.handler(handler).ok_or_else(|| {
                RegistryError::UnknownCapability {
                    key: label.clone(),
                    kind: "handler",
                    name: handler.clone(),
                }
            })?;
            RemoteOperation::Inline(resolved)
        }
        (None, None) => {
            return Err(RegistryError::invalid(&label, "a remote operation reference is required"))
        }
    };

    let mut config =
        ActionConfig::new(key, definition.description.unwrap_or_default(), remote_operation);

    for (name, param) in definition.params {
        let rule = param_rule(&label, &name, param, capabilities)?;
        config.param_schema.insert(name, rule);
    }

    for (index, rule) in definition.auth.into_iter().enumerate() {
        config.auth_rules.push(auth_rule(&label, index, rule, capabilities)?);
    }

    config.notification = definition.notification;
    config.update_strategy = definition.update_strategy;

    Ok(config)
}

fn param_rule(
    label: &str,
    name: &str,
    param: ParamDefinition,
    capabilities: &Capabilities,
) -> RegistryResult<ParamRule> {
    let param_type: ParamType = param.kind.parse().map_err(|_| {
        RegistryError::invalid(
            label,
            format!("parameter '{}' has unrecognized type '{}'", name, param.kind),
        )
    })?;

    let required = match param.required {
        JsonValue::Bool(required) => required,
        other => {
            return Err(RegistryError::invalid(
                label,
                format!("parameter '{}' has a non-boolean 'required' value: {}", name, other),
            ))
        }
    };

    let mut rule = ParamRule::new(param_type);
    rule.required = required;
    rule.description = param.description;

    if let Some(validator) = param.validator {
        let resolved = capabilities.validator(&validator).ok_or_else(|| {
            RegistryError::UnknownCapability {
                key: label.to_string(),
                kind: "validator",
                name: validator.clone(),
            }
        })?;
        rule.validator = Some(resolved);
    }

    Ok(rule)
}

fn auth_rule(
    label: &str,
    index: usize,
    rule: AuthRuleDefinition,
    capabilities: &Capabilities,
) -> RegistryResult<AuthRule> {
    let config = rule.config.unwrap_or(JsonValue::Null);
    let config_str = |field: &str| config.get(field).and_then(JsonValue::as_str).map(str::to_string);

    let kind = match rule.kind.as_str() {
        "jwt" => AuthRuleKind::Jwt,
        "projectMember" => AuthRuleKind::ProjectMember { path: config_str("path") },
        "role" => {
            let mut roles: Vec<String> = config
                .get("roles")
                .and_then(JsonValue::as_array)
                .map(|items| items.iter().filter_map(JsonValue::as_str).map(str::to_string).collect())
                .unwrap_or_default();
            if let Some(role) = config_str("role") {
                roles.push(role);
            }
            AuthRuleKind::Role { roles }
        }
        "custom" => {
            let predicate = match config_str("predicate") {
                Some(name) => Some(capabilities.authorizer(&name).ok_or_else(|| {
                    RegistryError::UnknownCapability {
                        key: label.to_string(),
                        kind: "authorizer",
                        name,
                    }
                })?),
                None => None,
            };
            AuthRuleKind::Custom { predicate }
        }
        other => {
            return Err(RegistryError::invalid(
                label,
                format!("auth rule #{} has unrecognized type '{}'", index, other),
            ))
        }
    };

    Ok(AuthRule { kind, error_message: rule.error_message })
}
