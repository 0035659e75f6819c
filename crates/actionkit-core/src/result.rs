//! Uniform result shape returned by every action execution

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::fmt;

/// Error codes surfaced to callers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    UnknownAction,
    ValidationFailed,
    Unauthorized,
    /// Remote business failure (backend error list)
    StrapiError,
    InternalError,
    QueryNotFound,
    HttpError,
    NetworkError,
    CatalogError,
    InvalidResponse,
    /// A code supplied by a handler or the backend, passed through verbatim
    Other(String),
}

impl ErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::UnknownAction => "UNKNOWN_ACTION",
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::StrapiError => "STRAPI_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::QueryNotFound => "QUERY_NOT_FOUND",
            ErrorCode::HttpError => "HTTP_ERROR",
            ErrorCode::NetworkError => "NETWORK_ERROR",
            ErrorCode::CatalogError => "CATALOG_ERROR",
            ErrorCode::InvalidResponse => "INVALID_RESPONSE",
            ErrorCode::Other(code) => code,
        }
    }

    pub fn parse(code: &str) -> Self {
        match code {
            "UNKNOWN_ACTION" => ErrorCode::UnknownAction,
            "VALIDATION_FAILED" => ErrorCode::ValidationFailed,
            "UNAUTHORIZED" => ErrorCode::Unauthorized,
            "STRAPI_ERROR" => ErrorCode::StrapiError,
            "INTERNAL_ERROR" => ErrorCode::InternalError,
            "QUERY_NOT_FOUND" => ErrorCode::QueryNotFound,
            "HTTP_ERROR" => ErrorCode::HttpError,
            "NETWORK_ERROR" => ErrorCode::NetworkError,
            "CATALOG_ERROR" => ErrorCode::CatalogError,
            "INVALID_RESPONSE" => ErrorCode::InvalidResponse,
            other => ErrorCode::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(ErrorCode::parse(&code))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
}

impl ActionError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), details: None }
    }

    pub fn with_details(mut self, details: JsonValue) -> Self {
        self.details = Some(details);
        self
    }
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_strategy: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ActionError>,
}

impl ActionResult {
    pub fn ok(data: JsonValue, update_strategy: Option<JsonValue>) -> Self {
        Self { success: true, data: Some(data), update_strategy, error: None }
    }

    pub fn failure(error: ActionError) -> Self {
        Self { success: false, data: None, update_strategy: None, error: Some(error) }
    }

    pub fn error_code(&self) -> Option<&ErrorCode> {
        self.error.as_ref().map(|e| &e.code)
    }
}
