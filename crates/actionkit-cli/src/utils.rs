//! Utility functions for the CLI

use crate::error::{CliError, CliResult};
use colored::{ColoredString, Colorize};
use serde_json::{json, Value as JsonValue};
use std::path::Path;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// `RUST_LOG` wins; otherwise `info`, or `debug` with `--verbose`
pub fn init_tracing(verbose: bool) -> CliResult<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| CliError::General(format!("Failed to set tracing subscriber: {}", e)))?;

    Ok(())
}

/// Utility for colored console output
pub struct ColoredOutput;

impl ColoredOutput {
    pub fn success(msg: &str) -> ColoredString {
        msg.green().bold()
    }

    pub fn error(msg: &str) -> ColoredString {
        msg.red().bold()
    }

    pub fn warning(msg: &str) -> ColoredString {
        msg.yellow().bold()
    }

    pub fn dim(msg: &str) -> ColoredString {
        msg.dimmed()
    }

    pub fn highlight(msg: &str) -> ColoredString {
        msg.cyan().bold()
    }
}

pub fn validate_file_exists(path: &Path) -> CliResult<()> {
    if !path.exists() {
        return Err(CliError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

/// Action parameters from `--params` or `--params-file`; an empty object when neither is given
pub fn read_params(inline: Option<&str>, file: Option<&Path>) -> CliResult<JsonValue> {
    let params = match (inline, file) {
        (Some(raw), None) => serde_json::from_str(raw)
            .map_err(|e| CliError::InvalidArgument(format!("Invalid JSON params: {}", e)))?,
        (None, Some(path)) => {
            validate_file_exists(path)?;
            let content = std::fs::read_to_string(path)?;
            match serde_json::from_str::<JsonValue>(&content) {
                Ok(value) => value,
                Err(_) => serde_yaml::from_str(&content).map_err(|e| {
                    CliError::InvalidArgument(format!(
                        "Invalid JSON/YAML params file '{}': {}",
                        path.display(),
                        e
                    ))
                })?,
            }
        }
        (None, None) => json!({}),
        (Some(_), Some(_)) => {
            return Err(CliError::InvalidArgument(
                "Cannot specify both --params and --params-file".to_string(),
            ))
        }
    };

    if !params.is_object() {
        return Err(CliError::InvalidArgument("params must be a JSON object".to_string()));
    }
    Ok(params)
}
