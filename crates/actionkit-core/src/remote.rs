//! Contracts for reaching the backend: the wire transport, the remote executor,
//! inline handlers and the single error type the remote client produces.

use crate::context::ActionContext;
use crate::observability::ActionLogger;
use crate::result::ErrorCode;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// A single POST to the backend endpoint
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub url: String,
    pub bearer: Option<String>,
    pub body: JsonValue,
}

/// Raw backend reply; status and body are classified by the remote client
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn json(status: u16, body: &JsonValue) -> Self {
        Self { status, body: body.to_string() }
    }
}

/// No response was obtained (connect failure, reset, timeout)
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Network-call function, injectable per client and per request context
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// Extensions block of a GraphQL error entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorExtensions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, flatten)]
    pub other: Map<String, JsonValue>,
}

/// One entry of the backend's native `errors` list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphqlError {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<ErrorExtensions>,
    #[serde(default, flatten)]
    pub other: Map<String, JsonValue>,
}

impl GraphqlError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), extensions: None, other: Map::new() }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.extensions.get_or_insert_with(ErrorExtensions::default).code = Some(code.into());
        self
    }

    pub fn code(&self) -> Option<&str> {
        self.extensions.as_ref().and_then(|e| e.code.as_deref())
    }
}

/// Every failure mode of the remote client, already classified
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    #[error("Operation '{0}' not found in operation catalog")]
    QueryNotFound(String),

    #[error("Operation catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("Backend responded with HTTP {status}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("{message}")]
    Backend { code: String, message: String, errors: Vec<GraphqlError> },

    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),

    #[error("client has been shut down")]
    ShutDown,
}

impl RemoteError {
    /// Build a backend error from a non-empty error list; the first entry decides code and message
    pub fn backend(errors: Vec<GraphqlError>) -> Self {
        let (code, message) = match errors.first() {
            Some(first) => (
                first.code().unwrap_or(ErrorCode::StrapiError.as_str()).to_string(),
                match first.message.trim() {
                    "" => "Backend error".to_string(),
                    _ => first.message.clone(),
                },
            ),
            None => (ErrorCode::StrapiError.as_str().to_string(), "Backend error".to_string()),
        };
        RemoteError::Backend { code, message, errors }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            RemoteError::QueryNotFound(_) => ErrorCode::QueryNotFound,
            RemoteError::CatalogUnavailable(_) => ErrorCode::CatalogError,
            RemoteError::Http { .. } => ErrorCode::HttpError,
            RemoteError::Network(_) | RemoteError::ShutDown => ErrorCode::NetworkError,
            RemoteError::Backend { code, .. } => ErrorCode::parse(code),
            RemoteError::InvalidResponse(_) => ErrorCode::InvalidResponse,
        }
    }

    /// Transport failures and 5xx responses; never 4xx or backend error lists
    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteError::Network(_) => true,
            RemoteError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Anything able to run a cataloged operation
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    async fn execute(
        &self,
        operation_id: &str,
        variables: &JsonValue,
        token: Option<&str>,
        transport: Option<Arc<dyn Transport>>,
    ) -> Result<JsonValue, RemoteError>;
}

/// Collaborators handed to inline handlers
#[derive(Clone)]
pub struct HandlerServices {
    pub remote: Arc<dyn RemoteExecutor>,
    pub logger: Arc<dyn ActionLogger>,
}

/// Failure of an inline handler
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Purpose-built failure that keeps its own code
    #[error("{message}")]
    Domain { code: String, message: String, details: Option<JsonValue> },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HandlerError {
    pub fn domain(code: impl Into<String>, message: impl Into<String>) -> Self {
        HandlerError::Domain { code: code.into(), message: message.into(), details: None }
    }
}

/// In-process implementation of an action's remote step
#[async_trait]
pub trait InlineHandler: Send + Sync {
    async fn handle(
        &self,
        params: &JsonValue,
        context: &ActionContext,
        services: &HandlerServices,
    ) -> Result<JsonValue, HandlerError>;
}

/// Closure-backed handler, see [`handler_fn`]
pub struct FnHandler<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> InlineHandler for FnHandler<F>
where
    F: Fn(JsonValue, ActionContext, HandlerServices) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<JsonValue, HandlerError>> + Send + 'static,
{
    async fn handle(
        &self,
        params: &JsonValue,
        context: &ActionContext,
        services: &HandlerServices,
    ) -> Result<JsonValue, HandlerError> {
        (self.f)(params.clone(), context.clone(), services.clone()).await
    }
}

/// Wrap an async closure as an [`InlineHandler`]
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn InlineHandler>
where
    F: Fn(JsonValue, ActionContext, HandlerServices) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<JsonValue, HandlerError>> + Send + 'static,
{
    Arc::new(FnHandler { f })
}
