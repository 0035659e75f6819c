//! Action configuration model shared by the registry, the engines and the service

use crate::auth::CustomAuthorizer;
use crate::error::CoreError;
use crate::remote::InlineHandler;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Language every notification template is expected to carry first
pub const PRIMARY_LANGUAGE: &str = "en";

/// Fallback template language
pub const SECONDARY_LANGUAGE: &str = "fr";

/// Notification channels the delivery engine understands
pub const SUPPORTED_CHANNELS: &[&str] = &["email", "push", "in_app", "sms"];

/// Declared runtime type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
        }
    }

    /// Runtime type name of a JSON value, using the same vocabulary as declared types
    pub fn name_of(value: &JsonValue) -> &'static str {
        match value {
            JsonValue::Null => "null",
            JsonValue::Bool(_) => "boolean",
            JsonValue::Number(_) => "number",
            JsonValue::String(_) => "string",
            JsonValue::Array(_) => "array",
            JsonValue::Object(_) => "object",
        }
    }

    /// Exact type match; arrays never satisfy `object`
    pub fn matches(&self, value: &JsonValue) -> bool {
        matches!(
            (self, value),
            (ParamType::String, JsonValue::String(_))
                | (ParamType::Number, JsonValue::Number(_))
                | (ParamType::Boolean, JsonValue::Bool(_))
                | (ParamType::Array, JsonValue::Array(_))
                | (ParamType::Object, JsonValue::Object(_))
        )
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(ParamType::String),
            "number" => Ok(ParamType::Number),
            "boolean" => Ok(ParamType::Boolean),
            "array" => Ok(ParamType::Array),
            "object" => Ok(ParamType::Object),
            other => Err(CoreError::Invalid(format!("unrecognized parameter type '{}'", other))),
        }
    }
}

/// Custom parameter predicate. `Err` means the predicate itself failed.
pub type ParamValidator = Arc<dyn Fn(&JsonValue) -> anyhow::Result<bool> + Send + Sync>;

/// Validation rule for a single parameter
#[derive(Clone)]
pub struct ParamRule {
    pub param_type: ParamType,
    pub required: bool,
    pub validator: Option<ParamValidator>,
    pub description: Option<String>,
}

impl ParamRule {
    pub fn new(param_type: ParamType) -> Self {
        Self { param_type, required: false, validator: None, description: None }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&JsonValue) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn with_shared_validator(mut self, validator: ParamValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl fmt::Debug for ParamRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamRule")
            .field("param_type", &self.param_type)
            .field("required", &self.required)
            .field("validator", &self.validator.as_ref().map(|_| "<fn>"))
            .field("description", &self.description)
            .finish()
    }
}

/// Parameter whitelist, evaluated in declaration order
pub type ParamSchema = IndexMap<String, ParamRule>;

/// Kind-specific part of an authorization rule
#[derive(Clone)]
pub enum AuthRuleKind {
    /// Caller must present a non-blank bearer credential
    Jwt,
    /// Caller must belong to the project found at `path` (default `projectId`)
    ProjectMember { path: Option<String> },
    /// Placeholder: configured roles are not checked against the caller yet
    Role { roles: Vec<String> },
    /// Injected predicate
    Custom { predicate: Option<Arc<dyn CustomAuthorizer>> },
}

impl AuthRuleKind {
    pub fn name(&self) -> &'static str {
        match self {
            AuthRuleKind::Jwt => "jwt",
            AuthRuleKind::ProjectMember { .. } => "projectMember",
            AuthRuleKind::Role { .. } => "role",
            AuthRuleKind::Custom { .. } => "custom",
        }
    }
}

impl fmt::Debug for AuthRuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthRuleKind::Jwt => f.write_str("Jwt"),
            AuthRuleKind::ProjectMember { path } => {
                f.debug_struct("ProjectMember").field("path", path).finish()
            }
            AuthRuleKind::Role { roles } => f.debug_struct("Role").field("roles", roles).finish(),
            AuthRuleKind::Custom { predicate } => f
                .debug_struct("Custom")
                .field("predicate", &predicate.as_ref().map(|_| "<predicate>"))
                .finish(),
        }
    }
}

/// Authorization rule with an optional denial message override
#[derive(Debug, Clone)]
pub struct AuthRule {
    pub kind: AuthRuleKind,
    pub error_message: Option<String>,
}

impl AuthRule {
    pub fn new(kind: AuthRuleKind) -> Self {
        Self { kind, error_message: None }
    }

    pub fn jwt() -> Self {
        Self::new(AuthRuleKind::Jwt)
    }

    pub fn project_member() -> Self {
        Self::new(AuthRuleKind::ProjectMember { path: None })
    }

    pub fn project_member_at(path: impl Into<String>) -> Self {
        Self::new(AuthRuleKind::ProjectMember { path: Some(path.into()) })
    }

    pub fn role<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(AuthRuleKind::Role { roles: roles.into_iter().map(Into::into).collect() })
    }

    pub fn custom(predicate: Arc<dyn CustomAuthorizer>) -> Self {
        Self::new(AuthRuleKind::Custom { predicate: Some(predicate) })
    }

    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

/// Template text keyed by language code
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalizedText(pub BTreeMap<String, String>);

impl LocalizedText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, lang: impl Into<String>, text: impl Into<String>) -> Self {
        self.0.insert(lang.into(), text.into());
        self
    }

    /// Text for `lang`, falling back to the primary then the secondary variant
    pub fn get(&self, lang: &str) -> Option<&str> {
        [lang, PRIMARY_LANGUAGE, SECONDARY_LANGUAGE]
            .iter()
            .filter_map(|l| self.0.get(*l))
            .map(String::as_str)
            .find(|text| !text.trim().is_empty())
    }

    pub fn has_base_variant(&self) -> bool {
        [PRIMARY_LANGUAGE, SECONDARY_LANGUAGE]
            .iter()
            .any(|l| self.0.get(*l).map_or(false, |text| !text.trim().is_empty()))
    }
}

/// What the notification engine needs to fan out after a successful action
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationConfig {
    /// Opaque recipient descriptor, resolved by the notification engine
    #[serde(default)]
    pub recipients: Option<JsonValue>,
    #[serde(default)]
    pub title: Option<LocalizedText>,
    #[serde(default)]
    pub body: Option<LocalizedText>,
    #[serde(default)]
    pub channels: Vec<String>,
    /// Anything else (priority, link templates, ...) is passed through untouched
    #[serde(default, flatten)]
    pub extra: Map<String, JsonValue>,
}

/// How an action reaches the backend
#[derive(Clone)]
pub enum RemoteOperation {
    /// Operation ID resolved against the operation catalog
    Catalog(String),
    /// In-process handler
    Inline(Arc<dyn InlineHandler>),
}

impl fmt::Debug for RemoteOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteOperation::Catalog(id) => f.debug_tuple("Catalog").field(id).finish(),
            RemoteOperation::Inline(_) => f.write_str("Inline(<handler>)"),
        }
    }
}

/// A registered action
#[derive(Debug, Clone)]
pub struct ActionConfig {
    pub key: String,
    pub description: String,
    pub param_schema: ParamSchema,
    pub auth_rules: Vec<AuthRule>,
    pub remote_operation: RemoteOperation,
    pub notification: Option<NotificationConfig>,
    /// Opaque client refresh metadata, returned verbatim on success
    pub update_strategy: Option<JsonValue>,
}

impl ActionConfig {
    pub fn new(
        key: impl Into<String>,
        description: impl Into<String>,
        remote_operation: RemoteOperation,
    ) -> Self {
        Self {
            key: key.into(),
            description: description.into(),
            param_schema: ParamSchema::new(),
            auth_rules: Vec::new(),
            remote_operation,
            notification: None,
            update_strategy: None,
        }
    }

    /// Shorthand for an action backed by a catalog operation
    pub fn catalog(
        key: impl Into<String>,
        description: impl Into<String>,
        operation_id: impl Into<String>,
    ) -> Self {
        Self::new(key, description, RemoteOperation::Catalog(operation_id.into()))
    }

    pub fn inline(
        key: impl Into<String>,
        description: impl Into<String>,
        handler: Arc<dyn InlineHandler>,
    ) -> Self {
        Self::new(key, description, RemoteOperation::Inline(handler))
    }

    pub fn param(mut self, name: impl Into<String>, rule: ParamRule) -> Self {
        self.param_schema.insert(name.into(), rule);
        self
    }

    pub fn auth(mut self, rule: AuthRule) -> Self {
        self.auth_rules.push(rule);
        self
    }

    pub fn with_notification(mut self, notification: NotificationConfig) -> Self {
        self.notification = Some(notification);
        self
    }

    pub fn with_update_strategy(mut self, strategy: JsonValue) -> Self {
        self.update_strategy = Some(strategy);
        self
    }
}

/// Deployment environment; decides how much of an internal failure is exposed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Staging,
    Production,
}

impl Environment {
    pub fn is_production_like(&self) -> bool {
        matches!(self, Environment::Staging | Environment::Production)
    }
}

impl FromStr for Environment {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "staging" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(CoreError::Invalid(format!("unknown environment '{}'", other))),
        }
    }
}
