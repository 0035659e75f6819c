//! Named in-process capabilities that serialized action definitions refer to

use actionkit_core::{CustomAuthorizer, InlineHandler, ParamValidator};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;

/// Startup-time table of validators, custom authorizers and inline handlers.
///
/// Definitions loaded from files cannot carry closures, so they name an entry
/// here instead; names are resolved once, at registration.
#[derive(Clone, Default)]
pub struct Capabilities {
    validators: HashMap<String, ParamValidator>,
    authorizers: HashMap<String, Arc<dyn CustomAuthorizer>>,
    handlers: HashMap<String, Arc<dyn InlineHandler>>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_validator<F>(mut self, name: impl Into<String>, validator: F) -> Self
    where
        F: Fn(&JsonValue) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        self.validators.insert(name.into(), Arc::new(validator));
        self
    }

    pub fn with_authorizer(
        mut self,
        name: impl Into<String>,
        authorizer: Arc<dyn CustomAuthorizer>,
    ) -> Self {
        self.authorizers.insert(name.into(), authorizer);
        self
    }

    pub fn with_handler(mut self, name: impl Into<String>, handler: Arc<dyn InlineHandler>) -> Self {
        self.handlers.insert(name.into(), handler);
        self
    }

    pub fn validator(&self, name: &str) -> Option<ParamValidator> {
        self.validators.get(name).cloned()
    }

    pub fn authorizer(&self, name: &str) -> Option<Arc<dyn CustomAuthorizer>> {
        self.authorizers.get(name).cloned()
    }

    pub fn handler(&self, name: &str) -> Option<Arc<dyn InlineHandler>> {
        self.handlers.get(name).cloned()
    }
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = |map: Vec<&String>| {
            let mut names: Vec<String> = map.into_iter().cloned().collect();
            names.sort();
            names
        };
        f.debug_struct("Capabilities")
            .field("validators", &names(self.validators.keys().collect()))
            .field("authorizers", &names(self.authorizers.keys().collect()))
            .field("handlers", &names(self.handlers.keys().collect()))
            .finish()
    }
}
