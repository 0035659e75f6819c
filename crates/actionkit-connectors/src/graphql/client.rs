//! Resilient client for cataloged GraphQL operations

use crate::error::{ConnectorError, ConnectorResult};
use crate::graphql::catalog::OperationCatalog;
use crate::graphql::pool::{ConnectionPool, PoolConfig};
use crate::graphql::retry_manager::{RetryDecision, RetryManager, RetryPolicy};
use crate::graphql::transport::ReqwestTransport;
use actionkit_core::{
    GraphqlError, RemoteError, RemoteExecutor, Transport, TransportRequest, TransportResponse,
};
use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct RemoteClientConfig {
    pub endpoint: String,
    /// Used when a call carries no caller token
    pub service_token: Option<String>,
    pub retry: RetryPolicy,
    pub pool: PoolConfig,
    pub jitter: bool,
}

impl RemoteClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(), ..Default::default() }
    }

    pub fn with_service_token(mut self, token: impl Into<String>) -> Self {
        self.service_token = Some(token.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }
}

/// Runs cataloged operations against one backend endpoint, retrying
/// transport failures and 5xx responses with exponential backoff.
pub struct RemoteClient {
    endpoint: String,
    service_token: Option<String>,
    catalog: OperationCatalog,
    retry: RetryManager,
    pool: ConnectionPool,
    transport: Arc<dyn Transport>,
}

impl RemoteClient {
    pub fn new(config: RemoteClientConfig, catalog: OperationCatalog) -> ConnectorResult<Self> {
        let endpoint = url::Url::parse(&config.endpoint).map_err(|e| {
            ConnectorError::InvalidEndpoint { endpoint: config.endpoint.clone(), reason: e.to_string() }
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ConnectorError::InvalidEndpoint {
                endpoint: config.endpoint.clone(),
                reason: format!("unsupported scheme '{}'", endpoint.scheme()),
            });
        }

        let pool = ConnectionPool::new(config.pool)?;
        let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new(pool.client()));

        Ok(Self {
            endpoint: config.endpoint,
            service_token: config.service_token.filter(|t| !t.trim().is_empty()),
            catalog,
            retry: RetryManager::new(config.retry).with_jitter(config.jitter),
            pool,
            transport,
        })
    }

    /// Replace the default reqwest transport for every call of this client
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn catalog(&self) -> &OperationCatalog {
        &self.catalog
    }

    pub fn retry_manager(&self) -> &RetryManager {
        &self.retry
    }

    /// Run `operation_id`, retrying while the retry manager allows it.
    /// On exhaustion the last classified error is returned unchanged.
    pub async fn execute(
        &self,
        operation_id: &str,
        variables: &JsonValue,
        token: Option<&str>,
        transport: Option<Arc<dyn Transport>>,
    ) -> Result<JsonValue, RemoteError> {
        let start = Instant::now();
        let mut retries_done = 0;

        loop {
            let error = match self.execute_once(operation_id, variables, token, transport.clone()).await {
                Ok(data) => {
                    tracing::debug!(
                        operation_id,
                        attempts = retries_done + 1,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Remote operation succeeded"
                    );
                    return Ok(data);
                }
                Err(error) => error,
            };

            match self.retry.should_retry(&error, retries_done) {
                RetryDecision::Retry { delay, attempt_number } => {
                    tracing::warn!(
                        operation_id,
                        attempt = attempt_number,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Retrying remote operation"
                    );
                    tokio::time::sleep(delay).await;
                    retries_done += 1;
                }
                RetryDecision::Stop { reason, final_attempt } => {
                    tracing::error!(
                        operation_id,
                        attempts = final_attempt,
                        code = %error.code(),
                        reason = %reason,
                        error = %error,
                        "Remote operation failed"
                    );
                    return Err(error);
                }
            }
        }
    }

    /// Single attempt: resolve, send one POST, classify the reply
    pub async fn execute_once(
        &self,
        operation_id: &str,
        variables: &JsonValue,
        token: Option<&str>,
        transport: Option<Arc<dyn Transport>>,
    ) -> Result<JsonValue, RemoteError> {
        if self.pool.is_shut_down() {
            return Err(RemoteError::ShutDown);
        }

        let query = self.catalog.resolve(operation_id).await?;
        let request = TransportRequest {
            url: self.endpoint.clone(),
            bearer: self.select_credential(token),
            body: json!({ "query": query, "variables": variables }),
        };
        let transport = transport.unwrap_or_else(|| self.transport.clone());

        let response = {
            let _permit = self.pool.acquire().await?;
            transport.send(request).await.map_err(|e| RemoteError::Network(e.to_string()))?
        };

        classify_response(response)
    }

    /// Tear down the pool; later calls fail with a network error
    pub fn shutdown(&self) {
        self.pool.shutdown();
    }

    pub fn is_shut_down(&self) -> bool {
        self.pool.is_shut_down()
    }

    fn select_credential(&self, token: Option<&str>) -> Option<String> {
        token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .or_else(|| self.service_token.clone())
    }
}

fn classify_response(response: TransportResponse) -> Result<JsonValue, RemoteError> {
    if !(200..300).contains(&response.status) {
        return Err(RemoteError::Http { status: response.status, body: response.body });
    }

    let mut envelope: JsonValue = serde_json::from_str(&response.body)
        .map_err(|e| RemoteError::InvalidResponse(format!("body is not JSON: {}", e)))?;

    let Some(object) = envelope.as_object_mut() else {
        return Err(RemoteError::InvalidResponse("body is not a JSON object".to_string()));
    };

    match object.get("errors") {
        Some(JsonValue::Array(errors)) if !errors.is_empty() => {
            let errors: Vec<GraphqlError> = serde_json::from_value(JsonValue::Array(errors.clone()))
                .map_err(|e| RemoteError::InvalidResponse(format!("malformed errors list: {}", e)))?;
            return Err(RemoteError::backend(errors));
        }
        _ => {}
    }

    object
        .remove("data")
        .ok_or_else(|| RemoteError::InvalidResponse("response has neither data nor errors".to_string()))
}

#[async_trait]
impl RemoteExecutor for RemoteClient {
    async fn execute(
        &self,
        operation_id: &str,
        variables: &JsonValue,
        token: Option<&str>,
        transport: Option<Arc<dyn Transport>>,
    ) -> Result<JsonValue, RemoteError> {
        RemoteClient::execute(self, operation_id, variables, token, transport).await
    }
}

impl std::fmt::Debug for RemoteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteClient")
            .field("endpoint", &self.endpoint)
            .field("service_token", &self.service_token.as_ref().map(|_| "***REDACTED***"))
            .field("catalog", &self.catalog)
            .field("retry", &self.retry)
            .field("pool", &self.pool)
            .finish()
    }
}
