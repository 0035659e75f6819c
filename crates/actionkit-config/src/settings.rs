//! Typed settings file

use crate::error::{ConfigError, ConfigResult};
use actionkit_connectors::{OperationCatalog, PoolConfig, RemoteClientConfig, RetryPolicy, StaticCatalog};
use actionkit_core::{ActionDefinition, Environment};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    pub backend: BackendSettings,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub catalog: CatalogSettings,
    #[serde(default)]
    pub authorization: AuthorizationSettings,
    #[serde(default)]
    pub actions: Vec<ActionDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendSettings {
    #[serde(deserialize_with = "scalar_string")]
    pub endpoint: String,
    /// Fallback credential for calls without a caller token
    #[serde(default, deserialize_with = "optional_scalar_string")]
    pub service_token: Option<String>,
    /// Randomize retry delays
    #[serde(default)]
    pub jitter: bool,
}

/// Where operation documents come from: a catalog file or an inline table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSettings {
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub operations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationSettings {
    /// Overrides the operation used by `projectMember` rules
    #[serde(default)]
    pub membership_operation: Option<String>,
}

impl Settings {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.backend.endpoint.trim().is_empty() {
            return Err(ConfigError::validation("backend.endpoint is required"));
        }

        match (&self.catalog.path, self.catalog.operations.is_empty()) {
            (Some(_), false) => {
                return Err(ConfigError::validation(
                    "catalog.path and catalog.operations are mutually exclusive",
                ))
            }
            (None, true) => {
                return Err(ConfigError::validation(
                    "catalog needs either a path or inline operations",
                ))
            }
            _ => {}
        }
        if let Some((id, _)) = self.catalog.operations.iter().find(|(_, query)| query.trim().is_empty()) {
            return Err(ConfigError::validation(format!("catalog operation '{}' has an empty document", id)));
        }

        if self.retry.backoff_multiplier < 1.0 {
            return Err(ConfigError::validation("retry.backoffMultiplier must be at least 1.0"));
        }
        if self.retry.initial_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigError::validation("retry.initialDelayMs must not exceed retry.maxDelayMs"));
        }
        self.pool.validate().map_err(|e| ConfigError::validation(format!("pool: {}", e)))?;

        if let Some(operation) = &self.authorization.membership_operation {
            if operation.trim().is_empty() {
                return Err(ConfigError::validation("authorization.membershipOperation must not be blank"));
            }
        }

        Ok(())
    }

    /// Make a relative catalog path relative to `base` (the settings file's directory)
    pub fn resolve_paths(&mut self, base: &Path) {
        if let Some(path) = &self.catalog.path {
            if path.is_relative() {
                self.catalog.path = Some(base.join(path));
            }
        }
    }

    pub fn client_config(&self) -> RemoteClientConfig {
        RemoteClientConfig {
            endpoint: self.backend.endpoint.clone(),
            service_token: self.backend.service_token.clone().filter(|t| !t.trim().is_empty()),
            retry: self.retry.clone(),
            pool: self.pool.clone(),
            jitter: self.backend.jitter,
        }
    }

    /// Lazily loaded catalog; nothing is read until the first operation runs
    pub fn operation_catalog(&self) -> OperationCatalog {
        match &self.catalog.path {
            Some(path) => OperationCatalog::from_file(path.clone()),
            None => OperationCatalog::from_static(
                self.catalog
                    .operations
                    .iter()
                    .fold(StaticCatalog::new(), |catalog, (id, query)| catalog.with(id.clone(), query.clone())),
            ),
        }
    }
}

/// Environment references typed as numbers or booleans still land in string fields
fn scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match JsonValue::deserialize(deserializer)? {
        JsonValue::String(s) => Ok(s),
        JsonValue::Number(n) => Ok(n.to_string()),
        JsonValue::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!("expected a string, got {}", other))),
    }
}

fn optional_scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match JsonValue::deserialize(deserializer)? {
        JsonValue::Null => Ok(None),
        JsonValue::String(s) => Ok(Some(s)),
        JsonValue::Number(n) => Ok(Some(n.to_string())),
        JsonValue::Bool(b) => Ok(Some(b.to_string())),
        other => Err(serde::de::Error::custom(format!("expected a string, got {}", other))),
    }
}
