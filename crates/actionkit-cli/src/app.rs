//! Settings to running service

use crate::error::CliResult;
use actionkit_config::{Settings, SettingsLoader};
use actionkit_connectors::RemoteClient;
use actionkit_registry::{ActionRegistry, Capabilities};
use actionkit_runtime::{registry_from_definitions, ActionService};
use std::path::Path;
use std::sync::Arc;

pub fn load_settings(path: &Path) -> CliResult<Settings> {
    crate::utils::validate_file_exists(path)?;
    Ok(SettingsLoader::new().load_file(path)?)
}

/// Settings files can only reference named capabilities; the CLI ships none,
/// so definitions naming a handler, validator or custom predicate are rejected
pub fn build_registry(settings: &Settings) -> CliResult<ActionRegistry> {
    Ok(registry_from_definitions(settings.actions.clone(), &Capabilities::new())?)
}

/// The client handle is returned alongside so callers can shut its pool down
pub fn build_service(settings: &Settings) -> CliResult<(ActionService, Arc<RemoteClient>)> {
    let registry = build_registry(settings)?;
    let client = Arc::new(RemoteClient::new(settings.client_config(), settings.operation_catalog())?);

    let mut builder = ActionService::builder(Arc::new(registry), client.clone())
        .environment(settings.environment);
    if let Some(operation) = &settings.authorization.membership_operation {
        builder = builder.membership_operation(operation.clone());
    }
    Ok((builder.build()?, client))
}
