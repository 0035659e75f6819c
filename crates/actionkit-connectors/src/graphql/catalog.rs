//! Operation catalog: operation ID to GraphQL document, loaded lazily once

use crate::error::{ConnectorError, ConnectorResult};
use actionkit_core::RemoteError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;

pub type Operations = HashMap<String, String>;

/// Where catalog entries come from
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn load(&self) -> ConnectorResult<Operations>;

    /// Short label for logs
    fn describe(&self) -> String;
}

/// In-memory catalog
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    operations: Operations,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, operation_id: impl Into<String>, query: impl Into<String>) -> Self {
        self.operations.insert(operation_id.into(), query.into());
        self
    }
}

impl From<Operations> for StaticCatalog {
    fn from(operations: Operations) -> Self {
        Self { operations }
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn load(&self) -> ConnectorResult<Operations> {
        Ok(self.operations.clone())
    }

    fn describe(&self) -> String {
        format!("static ({} operations)", self.operations.len())
    }
}

/// YAML or JSON file holding an `id: query` map
#[derive(Debug, Clone)]
pub struct FileCatalog {
    path: PathBuf,
}

impl FileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CatalogSource for FileCatalog {
    async fn load(&self) -> ConnectorResult<Operations> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let is_json = self
            .path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));

        let operations: Operations = if is_json {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        if let Some((id, _)) = operations.iter().find(|(_, query)| query.trim().is_empty()) {
            return Err(ConnectorError::Catalog(format!(
                "operation '{}' in {} has an empty document",
                id,
                self.path.display()
            )));
        }

        Ok(operations)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Lazily loaded, process-lifetime catalog.
///
/// The first successful load is cached; a failed load is not, so a later
/// call tries the source again.
pub struct OperationCatalog {
    source: Arc<dyn CatalogSource>,
    operations: OnceCell<Operations>,
}

impl OperationCatalog {
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self { source, operations: OnceCell::new() }
    }

    pub fn from_static(catalog: StaticCatalog) -> Self {
        Self::new(Arc::new(catalog))
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileCatalog::new(path)))
    }

    pub fn is_loaded(&self) -> bool {
        self.operations.initialized()
    }

    /// GraphQL document for `operation_id`
    pub async fn resolve(&self, operation_id: &str) -> Result<String, RemoteError> {
        let operations = self
            .operations
            .get_or_try_init(|| async {
                let operations = self.source.load().await?;
                tracing::debug!(
                    source = %self.source.describe(),
                    operations = operations.len(),
                    "Loaded operation catalog"
                );
                Ok::<_, ConnectorError>(operations)
            })
            .await
            .map_err(|e| {
                tracing::error!(source = %self.source.describe(), error = %e, "Failed to load operation catalog");
                RemoteError::CatalogUnavailable(e.to_string())
            })?;

        operations
            .get(operation_id)
            .cloned()
            .ok_or_else(|| RemoteError::QueryNotFound(operation_id.to_string()))
    }
}

impl std::fmt::Debug for OperationCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationCatalog")
            .field("source", &self.source.describe())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        loads: AtomicUsize,
        fail_first: bool,
    }

    #[async_trait]
    impl CatalogSource for CountingSource {
        async fn load(&self) -> ConnectorResult<Operations> {
            let n = self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail_first && n == 0 {
                return Err(ConnectorError::Catalog("backend catalog offline".into()));
            }
            Ok(Operations::from([("listProjects".to_string(), "query { projects { id } }".to_string())]))
        }

        fn describe(&self) -> String {
            "counting".into()
        }
    }

    #[tokio::test]
    async fn test_loads_once() {
        let source = Arc::new(CountingSource { loads: AtomicUsize::new(0), fail_first: false });
        let catalog = OperationCatalog::new(source.clone());
        assert!(!catalog.is_loaded());

        assert!(catalog.resolve("listProjects").await.is_ok());
        assert!(catalog.resolve("listProjects").await.is_ok());
        let miss = catalog.resolve("deleteEverything").await.unwrap_err();

        assert!(matches!(miss, RemoteError::QueryNotFound(ref id) if id == "deleteEverything"));
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
        assert!(catalog.is_loaded());
    }

    #[tokio::test]
    async fn test_failed_load_is_not_cached() {
        let source = Arc::new(CountingSource { loads: AtomicUsize::new(0), fail_first: true });
        let catalog = OperationCatalog::new(source.clone());

        let err = catalog.resolve("listProjects").await.unwrap_err();
        assert!(matches!(err, RemoteError::CatalogUnavailable(_)));
        assert!(!catalog.is_loaded());

        assert_eq!(catalog.resolve("listProjects").await.unwrap(), "query { projects { id } }");
        assert_eq!(source.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_file_catalog_yaml_and_json() {
        let mut yaml = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(yaml, "createProject: |\n  mutation($data: ProjectInput!) {{ createProject(data: $data) {{ data {{ id }} }} }}").unwrap();
        let catalog = OperationCatalog::from_file(yaml.path());
        assert!(catalog.resolve("createProject").await.unwrap().starts_with("mutation"));

        let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(json, r#"{{"listProjects": "query {{ projects {{ data {{ id }} }} }}"}}"#).unwrap();
        let catalog = OperationCatalog::from_file(json.path());
        assert!(catalog.resolve("listProjects").await.unwrap().starts_with("query"));
    }

    #[tokio::test]
    async fn test_file_catalog_errors() {
        let catalog = OperationCatalog::from_file("/nonexistent/catalog.yaml");
        assert!(matches!(
            catalog.resolve("x").await.unwrap_err(),
            RemoteError::CatalogUnavailable(_)
        ));

        let mut empty_doc = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(empty_doc, r#"{{"blank": "  "}}"#).unwrap();
        let err = FileCatalog::new(empty_doc.path()).load().await.unwrap_err();
        assert!(err.to_string().contains("operation 'blank'"));
    }
}
