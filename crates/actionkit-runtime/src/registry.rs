use actionkit_core::ActionDefinition;
use actionkit_registry::{ActionRegistry, Capabilities};

use crate::error::RuntimeResult;

/// Build a registry from serialized definitions, failing on the first
/// definition the registry rejects
pub fn registry_from_definitions(
    definitions: Vec<ActionDefinition>,
    capabilities: &Capabilities,
) -> RuntimeResult<ActionRegistry> {
    let mut registry = ActionRegistry::new();
    for definition in definitions {
        registry.register_definition(definition, capabilities)?;
    }

    tracing::debug!(actions = registry.len(), capabilities = ?capabilities, "Built action registry");
    Ok(registry)
}
