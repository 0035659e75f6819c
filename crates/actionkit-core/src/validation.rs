//! Parameter validation against a declared [`ParamSchema`]

use crate::error::panic_message;
use crate::types::{ParamRule, ParamSchema, ParamType};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Accumulated outcome of a validation pass
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Validate `params` against `schema`.
///
/// Every declared field is checked and all failures are returned together;
/// only the checks of a single field stop early. Keys not declared in the
/// schema are ignored, and a non-object `params` behaves like an empty bag.
pub fn validate(params: &JsonValue, schema: &ParamSchema) -> ValidationOutcome {
    let mut errors = Vec::new();

    for (name, rule) in schema {
        if let Some(error) = check_field(name, params.get(name), rule) {
            errors.push(error);
        }
    }

    ValidationOutcome { valid: errors.is_empty(), errors }
}

fn check_field(name: &str, value: Option<&JsonValue>, rule: &ParamRule) -> Option<String> {
    let value = match value {
        None if rule.required => return Some(format!("Missing required parameter: {}", name)),
        None => return None,
        Some(JsonValue::Null) if rule.required => {
            return Some(format!("Parameter '{}' cannot be null", name))
        }
        // null on an optional field means "not provided"
        Some(JsonValue::Null) => return None,
        Some(value) => value,
    };

    if !rule.param_type.matches(value) {
        return Some(format!(
            "Parameter '{}' must be of type {}, got {}",
            name,
            rule.param_type,
            ParamType::name_of(value)
        ));
    }

    let validator = rule.validator.as_ref()?;
    // a panicking predicate counts as a predicate error
    let outcome = catch_unwind(AssertUnwindSafe(|| validator(value)))
        .unwrap_or_else(|panic| Err(anyhow::anyhow!(panic_message(panic.as_ref()))));
    match outcome {
        Ok(true) => None,
        Ok(false) => Some(match &rule.description {
            Some(description) => format!("Parameter '{}' failed validation: {}", name, description),
            None => format!("Parameter '{}' failed validation", name),
        }),
        Err(err) => Some(format!("Parameter '{}' validation error: {}", name, err)),
    }
}
