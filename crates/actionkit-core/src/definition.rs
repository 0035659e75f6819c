//! Serializable form of an action, as written in a settings file.
//!
//! Definitions are deliberately loose (types are plain strings, `required` is
//! any JSON value) so the registry can reject malformed entries with a precise
//! message instead of a generic deserialization error.

use crate::types::NotificationConfig;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDefinition {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub params: IndexMap<String, ParamDefinition>,
    #[serde(default)]
    pub auth: Vec<AuthRuleDefinition>,
    /// Operation catalog ID
    #[serde(default)]
    pub operation: Option<String>,
    /// Name of an inline handler capability
    #[serde(default)]
    pub handler: Option<String>,
    #[serde(default)]
    pub notification: Option<NotificationConfig>,
    #[serde(default)]
    pub update_strategy: Option<JsonValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamDefinition {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default = "default_required")]
    pub required: JsonValue,
    #[serde(default)]
    pub description: Option<String>,
    /// Name of a validator capability
    #[serde(default)]
    pub validator: Option<String>,
}

fn default_required() -> JsonValue {
    JsonValue::Bool(false)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRuleDefinition {
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Rule-specific settings: `path` for projectMember, `roles`/`role` for role,
    /// `predicate` (capability name) for custom
    #[serde(default)]
    pub config: Option<JsonValue>,
    #[serde(default)]
    pub error_message: Option<String>,
}
