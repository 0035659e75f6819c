use crate::remote::Transport;
use std::fmt;
use std::sync::Arc;

/// Per-call request context. Built once by the caller and never mutated afterwards.
#[derive(Clone)]
pub struct ActionContext {
    request_id: String,
    user_id: String,
    jwt: String,
    lang: String,
    transport: Option<Arc<dyn Transport>>,
}

impl ActionContext {
    /// Create a new context with a generated request ID
    pub fn new(user_id: impl Into<String>, jwt: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            jwt: jwt.into(),
            lang: lang.into(),
            transport: None,
        }
    }

    /// Use a caller-chosen request ID, e.g. one propagated from an upstream gateway
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    /// Route every backend call made on behalf of this context through `transport`
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn jwt(&self) -> &str {
        &self.jwt
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn transport(&self) -> Option<Arc<dyn Transport>> {
        self.transport.clone()
    }

    /// Caller credential, if it carries anything besides whitespace
    pub fn bearer(&self) -> Option<&str> {
        let jwt = self.jwt.trim();
        if jwt.is_empty() {
            None
        } else {
            Some(jwt)
        }
    }
}

impl fmt::Debug for ActionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionContext")
            .field("request_id", &self.request_id)
            .field("user_id", &self.user_id)
            .field("jwt", &if self.jwt.is_empty() { "" } else { "***REDACTED***" })
            .field("lang", &self.lang)
            .field("transport", &self.transport.as_ref().map(|_| "<transport>"))
            .finish()
    }
}
