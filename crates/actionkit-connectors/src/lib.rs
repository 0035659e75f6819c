pub mod error;
pub mod graphql;

pub use error::{ConnectorError, ConnectorResult};
pub use graphql::{
    CatalogSource, ConnectionPool, FileCatalog, OperationCatalog, PoolConfig, RemoteClient,
    RemoteClientConfig, ReqwestTransport, RetryManager, RetryPolicy, StaticCatalog,
};
