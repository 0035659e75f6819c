//! Service wired to a real `RemoteClient` over a scripted transport

use actionkit_connectors::{OperationCatalog, RemoteClient, RemoteClientConfig, RetryPolicy, StaticCatalog};
use actionkit_core::{
    ActionConfig, ActionContext, AuthRule, ErrorCode, ParamRule, ParamType, Transport, TransportError,
    TransportRequest, TransportResponse,
};
use actionkit_registry::ActionRegistry;
use actionkit_runtime::ActionService;
use async_trait::async_trait;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct ScriptedTransport {
    replies: Mutex<Vec<Result<TransportResponse, TransportError>>>,
    fallback: Result<TransportResponse, TransportError>,
    seen: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    fn new(
        mut replies: Vec<Result<TransportResponse, TransportError>>,
        fallback: Result<TransportResponse, TransportError>,
    ) -> Arc<Self> {
        replies.reverse();
        Arc::new(Self { replies: Mutex::new(replies), fallback, seen: Mutex::new(Vec::new()) })
    }

    fn seen(&self) -> Vec<TransportRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.seen.lock().unwrap().push(request);
        self.replies.lock().unwrap().pop().unwrap_or_else(|| self.fallback.clone())
    }
}

fn service(transport: Arc<ScriptedTransport>, max_retries: u32) -> ActionService {
    let catalog = OperationCatalog::from_static(
        StaticCatalog::new()
            .with("createProject", "mutation($name: String!) { createProject(data: { name: $name }) { data { id } } }")
            .with("checkProjectMembership", "query($userId: ID!, $projectId: ID!) { projects { data { id } } }"),
    );
    let config = RemoteClientConfig::new("http://backend.local/graphql")
        .with_service_token("service-token")
        .with_retry(RetryPolicy { max_retries, initial_delay_ms: 100, max_delay_ms: 1000, backoff_multiplier: 2.0 });
    let client = RemoteClient::new(config, catalog).unwrap().with_transport(transport);

    let mut registry = ActionRegistry::new();
    registry
        .register(
            ActionConfig::catalog("createProject", "Create a project", "createProject")
                .param("name", ParamRule::new(ParamType::String).required())
                .auth(AuthRule::jwt())
                .with_update_strategy(json!({"invalidate": ["projects"]})),
        )
        .unwrap();
    registry
        .register(
            ActionConfig::catalog("renameProject", "Rename a project", "renameProject")
                .auth(AuthRule::project_member()),
        )
        .unwrap();
    registry
        .register(ActionConfig::catalog("ghost", "Points at a missing operation", "deleteEverything"))
        .unwrap();

    ActionService::builder(Arc::new(registry), Arc::new(client)).build().unwrap()
}

fn ctx() -> ActionContext {
    ActionContext::new("user-1", "caller-jwt", "en")
}

#[tokio::test]
async fn success_goes_through_catalog_and_transport() {
    let transport = ScriptedTransport::new(
        vec![],
        Ok(TransportResponse::json(200, &json!({"data": {"createProject": {"data": {"id": "42"}}}}))),
    );
    let service = service(transport.clone(), 0);

    let result = service.execute_action("createProject", json!({"name": "Apollo"}), ctx()).await;

    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.data, Some(json!({"createProject": {"data": {"id": "42"}}})));
    assert_eq!(result.update_strategy, Some(json!({"invalidate": ["projects"]})));

    let seen = transport.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].bearer.as_deref(), Some("caller-jwt"));
    assert_eq!(seen[0].body["variables"], json!({"name": "Apollo"}));
    assert!(seen[0].body["query"].as_str().unwrap().starts_with("mutation"));
}

#[tokio::test(start_paused = true)]
async fn network_failures_exhaust_retries() {
    let transport = ScriptedTransport::new(vec![], Err(TransportError("connection reset".into())));
    let service = service(transport.clone(), 2);

    let started = tokio::time::Instant::now();
    let result = service.execute_action("createProject", json!({"name": "Apollo"}), ctx()).await;

    let error = result.error.unwrap();
    assert_eq!(error.code, ErrorCode::NetworkError);
    assert_eq!(transport.seen().len(), 3, "first attempt plus two retries");
    assert_eq!(started.elapsed(), Duration::from_millis(100 + 200));
}

#[tokio::test(start_paused = true)]
async fn transient_failure_then_success() {
    let transport = ScriptedTransport::new(
        vec![Ok(TransportResponse::new(503, "unavailable"))],
        Ok(TransportResponse::json(200, &json!({"data": {"createProject": {"data": {"id": "7"}}}}))),
    );
    let service = service(transport.clone(), 3);

    let result = service.execute_action("createProject", json!({"name": "Apollo"}), ctx()).await;

    assert!(result.success);
    assert_eq!(transport.seen().len(), 2);
}

#[tokio::test]
async fn backend_error_list_is_not_retried() {
    let transport = ScriptedTransport::new(
        vec![],
        Ok(TransportResponse::json(
            200,
            &json!({"errors": [{"message": "Name already taken", "extensions": {"code": "BAD_USER_INPUT"}}]}),
        )),
    );
    let service = service(transport.clone(), 3);

    let result = service.execute_action("createProject", json!({"name": "Apollo"}), ctx()).await;

    let error = result.error.unwrap();
    assert_eq!(error.code, ErrorCode::StrapiError);
    assert_eq!(error.message, "Name already taken");
    assert_eq!(error.details.unwrap()[0]["extensions"]["code"], "BAD_USER_INPUT");
    assert_eq!(transport.seen().len(), 1);
}

#[tokio::test]
async fn client_error_status_is_not_retried() {
    let transport = ScriptedTransport::new(vec![], Ok(TransportResponse::new(400, "bad request")));
    let service = service(transport.clone(), 3);

    let result = service.execute_action("createProject", json!({"name": "Apollo"}), ctx()).await;

    assert_eq!(result.error_code(), Some(&ErrorCode::HttpError));
    assert_eq!(transport.seen().len(), 1);
}

#[tokio::test]
async fn missing_catalog_entry_never_reaches_transport() {
    let transport = ScriptedTransport::new(vec![], Ok(TransportResponse::json(200, &json!({"data": {}}))));
    let service = service(transport.clone(), 3);

    let result = service.execute_action("ghost", json!({}), ctx()).await;

    assert_eq!(result.error_code(), Some(&ErrorCode::QueryNotFound));
    assert!(transport.seen().is_empty());
}

#[tokio::test]
async fn membership_check_runs_through_the_client() {
    let transport = ScriptedTransport::new(
        vec![Ok(TransportResponse::json(200, &json!({"data": {"projects": {"data": []}}})))],
        Ok(TransportResponse::json(200, &json!({"data": {"renamed": true}}))),
    );
    let service = service(transport.clone(), 0);

    let result = service.execute_action("renameProject", json!({"projectId": "p-5"}), ctx()).await;

    let error = result.error.unwrap();
    assert_eq!(error.code, ErrorCode::Unauthorized);
    assert_eq!(error.message, "User is not a member of this project");

    let seen = transport.seen();
    assert_eq!(seen.len(), 1, "the action itself never runs");
    assert_eq!(seen[0].body["variables"], json!({"userId": "user-1", "projectId": "p-5"}));
}

#[tokio::test]
async fn context_transport_overrides_client_transport() {
    let default_transport = ScriptedTransport::new(vec![], Ok(TransportResponse::json(200, &json!({"data": {}}))));
    let request_transport = ScriptedTransport::new(
        vec![],
        Ok(TransportResponse::json(200, &json!({"data": {"createProject": {"data": {"id": "9"}}}}))),
    );
    let service = service(default_transport.clone(), 0);

    let context = ctx().with_transport(request_transport.clone());
    let result = service.execute_action("createProject", json!({"name": "Apollo"}), context).await;

    assert!(result.success);
    assert!(default_transport.seen().is_empty());
    assert_eq!(request_transport.seen().len(), 1);
}

#[tokio::test]
async fn error_entry_without_message_is_strapi_error() {
    let errors = json!([{"extensions": {"code": "FORBIDDEN"}}]);
    let transport = ScriptedTransport::new(
        vec![],
        Ok(TransportResponse::json(200, &json!({"data": null, "errors": errors}))),
    );
    let service = service(transport.clone(), 2);

    let result = service.execute_action("createProject", json!({"name": "Apollo"}), ctx()).await;

    let error = result.error.unwrap();
    assert_eq!(error.code, ErrorCode::StrapiError);
    assert_eq!(error.message, "Backend error");
    assert_eq!(error.details, Some(errors));
    assert_eq!(transport.seen().len(), 1);
}
