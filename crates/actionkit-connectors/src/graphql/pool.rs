//! Shared HTTP connection pool for the remote client

use crate::error::{ConnectorError, ConnectorResult};
use actionkit_core::RemoteError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Semaphore, SemaphorePermit};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PoolConfig {
    /// Upper bound on concurrent in-flight requests
    pub max_sockets: usize,
    /// Idle keep-alive connections kept per host
    pub max_free_sockets: usize,
    pub keep_alive_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_sockets: 50,
            max_free_sockets: 10,
            keep_alive_ms: 30_000,
            request_timeout_ms: 30_000,
        }
    }
}

impl PoolConfig {
    pub fn validate(&self) -> ConnectorResult<()> {
        if self.max_sockets == 0 {
            return Err(ConnectorError::InvalidConfig("maxSockets must be at least 1".into()));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConnectorError::InvalidConfig("requestTimeoutMs must be positive".into()));
        }
        Ok(())
    }
}

/// Keep-alive reqwest client plus a concurrency gate.
///
/// Created with the remote client and torn down by [`ConnectionPool::shutdown`].
#[derive(Debug)]
pub struct ConnectionPool {
    client: Client,
    permits: Semaphore,
    closed: AtomicBool,
    config: PoolConfig,
}

impl ConnectionPool {
    pub fn new(config: PoolConfig) -> ConnectorResult<Self> {
        config.validate()?;

        let keep_alive = Duration::from_millis(config.keep_alive_ms);
        let client = Client::builder()
            .pool_max_idle_per_host(config.max_free_sockets)
            .pool_idle_timeout(keep_alive)
            .tcp_keepalive(keep_alive)
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            permits: Semaphore::new(config.max_sockets),
            closed: AtomicBool::new(false),
            config,
        })
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Handle to the pooled client; cheap to clone
    pub fn client(&self) -> Client {
        self.client.clone()
    }

    /// Wait for an in-flight slot. Release it by dropping the permit.
    pub async fn acquire(&self) -> Result<SemaphorePermit<'_>, RemoteError> {
        if self.is_shut_down() {
            return Err(RemoteError::ShutDown);
        }
        self.permits.acquire().await.map_err(|_| RemoteError::ShutDown)
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Stop handing out slots; waiters fail with [`RemoteError::ShutDown`].
    /// Returns `false` when the pool was already shut down.
    pub fn shutdown(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.permits.close();
        tracing::info!(max_sockets = self.config.max_sockets, "Connection pool shut down");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PoolConfig::default();
        assert_eq!(config.max_sockets, 50);
        assert_eq!(config.max_free_sockets, 10);
        assert_eq!(config.keep_alive_ms, 30_000);
        assert_eq!(config.request_timeout_ms, 30_000);
    }

    #[test]
    fn test_rejects_zero_sockets() {
        let config = PoolConfig { max_sockets: 0, ..PoolConfig::default() };
        assert!(matches!(ConnectionPool::new(config), Err(ConnectorError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_permits_bound_concurrency() {
        let pool = ConnectionPool::new(PoolConfig { max_sockets: 2, ..PoolConfig::default() }).unwrap();

        let first = pool.acquire().await.unwrap();
        let _second = pool.acquire().await.unwrap();
        assert_eq!(pool.available(), 0);

        drop(first);
        assert_eq!(pool.available(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let pool = ConnectionPool::new(PoolConfig::default()).unwrap();

        assert!(pool.shutdown());
        assert!(!pool.shutdown());
        assert!(pool.is_shut_down());
        assert!(matches!(pool.acquire().await, Err(RemoteError::ShutDown)));
    }
}
