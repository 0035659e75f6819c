use crate::env_resolver::EnvResolver;
use crate::error::{ConfigError, ConfigResult};
use crate::settings::Settings;
use serde_json::Value as JsonValue;
use std::fs;
use std::path::Path;

/// Supported settings file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Yaml,
    Json,
}

impl FileFormat {
    /// Detect file format from extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        match path.as_ref().extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => Ok(FileFormat::Yaml),
            Some("json") => Ok(FileFormat::Json),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => Err(ConfigError::UnsupportedFormat("no extension".to_string())),
        }
    }
}

/// Reads a settings file: parse, resolve environment references, type, validate
#[derive(Debug, Clone, Default)]
pub struct SettingsLoader {
    resolver: EnvResolver,
}

impl SettingsLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolver(mut self, resolver: EnvResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<Settings> {
        let path = path.as_ref();
        let format = FileFormat::from_path(path)?;
        let content = fs::read_to_string(path)?;

        let mut settings = self.parse(&content, format)?;
        if let Some(dir) = path.parent() {
            settings.resolve_paths(dir);
        }

        tracing::info!(
            path = %path.display(),
            environment = ?settings.environment,
            actions = settings.actions.len(),
            "Loaded settings"
        );
        Ok(settings)
    }

    pub fn parse(&self, content: &str, format: FileFormat) -> ConfigResult<Settings> {
        let raw: JsonValue = match format {
            FileFormat::Yaml => serde_yaml::from_str(content)?,
            FileFormat::Json => serde_json::from_str(content)?,
        };
        if !raw.is_object() {
            return Err(ConfigError::validation("settings root must be a mapping"));
        }

        let resolved = self.resolver.resolve(&raw)?;
        let settings: Settings = serde_json::from_value(resolved)?;
        settings.validate()?;
        Ok(settings)
    }
}
