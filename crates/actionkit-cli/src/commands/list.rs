//! Registered action listing

use crate::app;
use crate::cli::OutputFormat;
use crate::error::CliResult;
use crate::utils::ColoredOutput;
use actionkit_core::{ActionConfig, RemoteOperation};
use serde_json::{json, Value as JsonValue};
use std::path::Path;

pub struct ListCommand;

impl ListCommand {
    pub fn run(config: &Path, format: OutputFormat) -> CliResult<()> {
        let settings = app::load_settings(config)?;
        let registry = app::build_registry(&settings)?;
        let actions: Vec<_> = registry.keys().into_iter().filter_map(|key| registry.get(key)).collect();

        match format {
            OutputFormat::Json => {
                let rows: Vec<JsonValue> = actions.iter().map(|a| Self::row(a)).collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            }
            OutputFormat::Table => {
                if actions.is_empty() {
                    println!("{}", ColoredOutput::warning("No actions registered"));
                    return Ok(());
                }
                let width = actions.iter().map(|a| a.key.len()).max().unwrap_or(0);
                for action in &actions {
                    println!(
                        "{:<width$}  {}  {}",
                        ColoredOutput::highlight(&action.key),
                        action.description,
                        ColoredOutput::dim(&Self::summary(action)),
                        width = width
                    );
                }
                println!("\n{} action(s)", actions.len());
            }
        }
        Ok(())
    }

    fn operation(action: &ActionConfig) -> String {
        match &action.remote_operation {
            RemoteOperation::Catalog(id) => id.clone(),
            RemoteOperation::Inline(_) => "<inline>".to_string(),
        }
    }

    fn auth_names(action: &ActionConfig) -> Vec<&'static str> {
        action.auth_rules.iter().map(|rule| rule.kind.name()).collect()
    }

    fn summary(action: &ActionConfig) -> String {
        let auth = Self::auth_names(action);
        format!(
            "[op: {}, params: {}, auth: {}]",
            Self::operation(action),
            action.param_schema.len(),
            if auth.is_empty() { "none".to_string() } else { auth.join(",") }
        )
    }

    fn row(action: &ActionConfig) -> JsonValue {
        json!({
            "key": action.key,
            "description": action.description,
            "operation": Self::operation(action),
            "params": action.param_schema.keys().collect::<Vec<_>>(),
            "auth": Self::auth_names(action),
            "notifies": action.notification.is_some(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actionkit_core::{AuthRule, ParamRule, ParamType};

    #[test]
    fn test_row_shape() {
        let action = ActionConfig::catalog("createProject", "Create a project", "createProject")
            .param("name", ParamRule::new(ParamType::String).required())
            .auth(AuthRule::jwt())
            .auth(AuthRule::project_member());

        assert_eq!(
            ListCommand::row(&action),
            json!({
                "key": "createProject",
                "description": "Create a project",
                "operation": "createProject",
                "params": ["name"],
                "auth": ["jwt", "projectMember"],
                "notifies": false,
            })
        );
        assert_eq!(ListCommand::summary(&action), "[op: createProject, params: 1, auth: jwt,projectMember]");
    }
}
