//! Settings validation command

use crate::app;
use crate::error::{CliError, CliResult};
use crate::utils::ColoredOutput;
use actionkit_core::RemoteOperation;
use std::path::Path;
use tracing::debug;

pub struct CheckCommand;

impl CheckCommand {
    /// Errors when any catalog-backed action names an operation the catalog lacks
    pub async fn run(config: &Path) -> CliResult<()> {
        let settings = app::load_settings(config)?;
        let registry = app::build_registry(&settings)?;
        println!("{} settings loaded from {}", ColoredOutput::success("✓"), config.display());
        println!("{} {} action(s) registered", ColoredOutput::success("✓"), registry.len());

        let catalog = settings.operation_catalog();
        let mut missing = Vec::new();
        for key in registry.keys() {
            let Some(action) = registry.get(key) else { continue };
            let RemoteOperation::Catalog(operation_id) = &action.remote_operation else { continue };

            match catalog.resolve(operation_id).await {
                Ok(_) => debug!(action = key, operation_id = %operation_id, "Operation resolved"),
                Err(e) => {
                    println!("{} {}: {}", ColoredOutput::error("✗"), key, e);
                    missing.push(key.to_string());
                }
            }
        }

        if missing.is_empty() {
            println!("{} every catalog operation resolves", ColoredOutput::success("✓"));
            Ok(())
        } else {
            Err(CliError::CheckFailed(format!("unresolved operations for {}", missing.join(", "))))
        }
    }
}
