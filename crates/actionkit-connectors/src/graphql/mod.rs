//! GraphQL backend connector: catalog lookup, pooled transport, retry

pub mod catalog;
pub mod client;
pub mod pool;
pub mod retry_manager;
pub mod transport;

pub use catalog::{CatalogSource, FileCatalog, OperationCatalog, Operations, StaticCatalog};
pub use client::{RemoteClient, RemoteClientConfig};
pub use pool::{ConnectionPool, PoolConfig};
pub use retry_manager::{ErrorClassification, RetryDecision, RetryManager, RetryPolicy};
pub use transport::ReqwestTransport;
