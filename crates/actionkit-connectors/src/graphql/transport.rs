//! Default network transport over reqwest

use actionkit_core::{Transport, TransportError, TransportRequest, TransportResponse};
use async_trait::async_trait;
use reqwest::Client;

/// Sends each request as a JSON POST; any status is returned as a response.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let mut builder = self.client.post(&request.url).json(&request.body);
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| TransportError(describe(&e)))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| TransportError(describe(&e)))?;

        Ok(TransportResponse { status, body })
    }
}

fn describe(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("request timed out: {}", error)
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_posts_json_with_bearer() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/graphql")
                    .header("authorization", "Bearer user-token")
                    .json_body(json!({"query": "query { me { id } }", "variables": {}}));
                then.status(200).json_body(json!({"data": {"me": {"id": "u1"}}}));
            })
            .await;

        let transport = ReqwestTransport::new(Client::new());
        let response = transport
            .send(TransportRequest {
                url: server.url("/graphql"),
                bearer: Some("user-token".into()),
                body: json!({"query": "query { me { id } }", "variables": {}}),
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, 200);
        let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body["data"]["me"]["id"], "u1");
    }

    #[tokio::test]
    async fn test_error_status_is_a_response() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql");
                then.status(503).body("maintenance");
            })
            .await;

        let transport = ReqwestTransport::new(Client::new());
        let response = transport
            .send(TransportRequest { url: server.url("/graphql"), bearer: None, body: json!({}) })
            .await
            .unwrap();

        assert_eq!(response.status, 503);
        assert_eq!(response.body, "maintenance");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let transport = ReqwestTransport::new(Client::new());
        let result = transport
            .send(TransportRequest {
                url: "http://127.0.0.1:1/graphql".into(),
                bearer: None,
                body: json!({}),
            })
            .await;
        assert!(result.is_err());
    }
}
