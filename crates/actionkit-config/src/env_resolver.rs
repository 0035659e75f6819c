//! `${VAR}` / `${VAR:default}` substitution inside settings values

use regex::Regex;
use serde_json::Value as JsonValue;
use std::env;
use thiserror::Error;

const REFERENCE_PATTERN: &str = r"\$\{([^}:]+)(?::([^}]*))?\}";

#[derive(Debug, Error)]
pub enum EnvResolverError {
    #[error("Environment variable '{0}' not found and no default provided")]
    VarNotFound(String),
    #[error("Environment variable '{0}' is not in whitelist. Allowed prefixes: {1:?}")]
    VarNotWhitelisted(String, Vec<String>),
    #[error("Invalid variable syntax: {0}")]
    InvalidSyntax(String),
    #[error("Variable references in '{0}' did not settle after {1} passes")]
    RecursiveReference(String, usize),
}

/// Resolves environment references in string values.
///
/// A value that is a single reference and nothing else is typed after
/// substitution (`true`, `42`, `1.5`, JSON objects and arrays); a reference
/// embedded in surrounding text always yields a string.
#[derive(Debug, Clone)]
pub struct EnvResolver {
    /// Empty means every variable is allowed
    allowed_prefixes: Vec<String>,
    max_depth: usize,
}

impl Default for EnvResolver {
    fn default() -> Self {
        Self::new(vec!["ACTIONKIT_".to_string()])
    }
}

impl EnvResolver {
    pub fn new(allowed_prefixes: Vec<String>) -> Self {
        Self { allowed_prefixes, max_depth: 10 }
    }

    pub fn unrestricted() -> Self {
        Self::new(Vec::new())
    }

    /// Maximum substitution passes for values that expand into further references
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn allowed_prefixes(&self) -> &[String] {
        &self.allowed_prefixes
    }

    pub fn resolve(&self, value: &JsonValue) -> Result<JsonValue, EnvResolverError> {
        let pattern = reference_pattern()?;
        self.resolve_value(value, &pattern)
    }

    /// Check every reference against the whitelist without reading the environment
    pub fn validate_all_vars(&self, value: &JsonValue) -> Result<(), EnvResolverError> {
        let pattern = reference_pattern()?;
        self.validate_value(value, &pattern)
    }

    fn resolve_value(&self, value: &JsonValue, pattern: &Regex) -> Result<JsonValue, EnvResolverError> {
        match value {
            JsonValue::String(s) => self.resolve_string(s, pattern),
            JsonValue::Object(map) => map
                .iter()
                .map(|(k, v)| Ok((k.clone(), self.resolve_value(v, pattern)?)))
                .collect::<Result<serde_json::Map<_, _>, _>>()
                .map(JsonValue::Object),
            JsonValue::Array(items) => items
                .iter()
                .map(|item| self.resolve_value(item, pattern))
                .collect::<Result<Vec<_>, _>>()
                .map(JsonValue::Array),
            other => Ok(other.clone()),
        }
    }

    fn resolve_string(&self, input: &str, pattern: &Regex) -> Result<JsonValue, EnvResolverError> {
        if !input.contains("${") {
            return Ok(JsonValue::String(input.to_string()));
        }

        let whole_reference = pattern
            .find(input)
            .map_or(false, |m| m.start() == 0 && m.end() == input.len());

        let mut current = input.to_string();
        let mut passes = 0;
        while pattern.is_match(&current) {
            if passes == self.max_depth {
                return Err(EnvResolverError::RecursiveReference(input.to_string(), self.max_depth));
            }
            current = self.substitute(&current, pattern)?;
            passes += 1;
        }

        if whole_reference {
            Ok(typed(current))
        } else {
            Ok(JsonValue::String(current))
        }
    }

    /// One pass: replace every reference in `input`
    fn substitute(&self, input: &str, pattern: &Regex) -> Result<String, EnvResolverError> {
        let mut output = String::with_capacity(input.len());
        let mut last = 0;

        for caps in pattern.captures_iter(input) {
            let (Some(full), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let name = name.as_str().trim();
            if name.is_empty() {
                return Err(EnvResolverError::InvalidSyntax(full.as_str().to_string()));
            }
            self.validate_var_name(name)?;

            let value = match env::var(name) {
                Ok(value) => value,
                Err(_) => match caps.get(2) {
                    Some(default) => default.as_str().to_string(),
                    None => return Err(EnvResolverError::VarNotFound(name.to_string())),
                },
            };

            output.push_str(&input[last..full.start()]);
            output.push_str(&value);
            last = full.end();
        }

        output.push_str(&input[last..]);
        Ok(output)
    }

    fn validate_value(&self, value: &JsonValue, pattern: &Regex) -> Result<(), EnvResolverError> {
        match value {
            JsonValue::String(s) => pattern
                .captures_iter(s)
                .filter_map(|caps| caps.get(1))
                .try_for_each(|name| self.validate_var_name(name.as_str().trim())),
            JsonValue::Object(map) => map.values().try_for_each(|v| self.validate_value(v, pattern)),
            JsonValue::Array(items) => items.iter().try_for_each(|v| self.validate_value(v, pattern)),
            _ => Ok(()),
        }
    }

    fn validate_var_name(&self, name: &str) -> Result<(), EnvResolverError> {
        if self.allowed_prefixes.is_empty()
            || self.allowed_prefixes.iter().any(|prefix| name.starts_with(prefix.as_str()))
        {
            return Ok(());
        }
        Err(EnvResolverError::VarNotWhitelisted(name.to_string(), self.allowed_prefixes.clone()))
    }
}

fn reference_pattern() -> Result<Regex, EnvResolverError> {
    Regex::new(REFERENCE_PATTERN).map_err(|e| EnvResolverError::InvalidSyntax(e.to_string()))
}

fn typed(resolved: String) -> JsonValue {
    if resolved.starts_with('{') || resolved.starts_with('[') {
        if let Ok(parsed) = serde_json::from_str(&resolved) {
            return parsed;
        }
    }
    if let Ok(flag) = resolved.parse::<bool>() {
        return JsonValue::Bool(flag);
    }
    if let Ok(int) = resolved.parse::<i64>() {
        return JsonValue::from(int);
    }
    if let Some(number) = resolved.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
        return JsonValue::Number(number);
    }
    JsonValue::String(resolved)
}
