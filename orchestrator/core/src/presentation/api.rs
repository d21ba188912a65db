// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! REST surface over [`AgentLifecycleService`].
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET | `/health` | liveness |
//! | POST | `/agent/register` | register |
//! | POST | `/agent/initialize` | initialize |
//! | POST | `/agent/query` | query |
//! | GET | `/agent/status/{agent_id}` | status |
//! | GET | `/agent/memory/{agent_id}` | memory |
//!
//! Failures are rendered as `{"success": false, "error": {code, message,
//! details?, retryable}}`.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::application::agent::AgentLifecycleService;
use crate::application::error::{LifecycleError, RegistryFailure};
use crate::domain::agent::{AgentId, AgentStatusReport, MemoryHubAddress};
use crate::domain::state::AgentState;

pub const SERVICE_NAME: &str = "agent-host";

pub struct AppState {
    pub lifecycle: Arc<dyn AgentLifecycleService>,
}

pub fn app(lifecycle: Arc<dyn AgentLifecycleService>) -> Router {
    let state = Arc::new(AppState { lifecycle });

    Router::new()
        .route("/health", get(health_handler))
        .route("/agent/register", post(register_handler))
        .route("/agent/initialize", post(initialize_handler))
        .route("/agent/query", post(query_handler))
        .route("/agent/status/{agent_id}", get(status_handler))
        .route("/agent/memory/{agent_id}", get(memory_handler))
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug)]
pub enum ApiError {
    Lifecycle(LifecycleError),
    InvalidRequest(String),
    NotFound,
}

impl From<LifecycleError> for ApiError {
    fn from(value: LifecycleError) -> Self {
        Self::Lifecycle(value)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self::InvalidRequest(value.body_text())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Lifecycle(err) => match err {
                LifecycleError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
                LifecycleError::Registry(RegistryFailure::RegistrationConflict { .. }) => {
                    StatusCode::CONFLICT
                }
                LifecycleError::Registry(RegistryFailure::InsufficientFunds(_)) => {
                    StatusCode::PAYMENT_REQUIRED
                }
                LifecycleError::Registry(_) => StatusCode::SERVICE_UNAVAILABLE,
                LifecycleError::AgentInitialization { .. } => StatusCode::SERVICE_UNAVAILABLE,
                LifecycleError::NotInitialized(_) => StatusCode::NOT_FOUND,
                LifecycleError::QueryProcessing { .. } => StatusCode::SERVICE_UNAVAILABLE,
            },
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }

    fn body(&self) -> Value {
        let (code, message, retryable, details) = match self {
            Self::Lifecycle(err) => {
                let details = match err {
                    LifecycleError::NotInitialized(agent_id) => Some(json!({
                        "agent_id": agent_id,
                        "suggestion": "Call POST /agent/initialize first",
                    })),
                    LifecycleError::Registry(RegistryFailure::RegistrationConflict {
                        agent_id,
                        owner,
                    }) => Some(json!({ "agent_id": agent_id, "owner": owner })),
                    _ => None,
                };
                (err.code(), err.to_string(), err.is_retryable(), details)
            }
            Self::InvalidRequest(message) => ("INVALID_REQUEST", message.clone(), false, None),
            Self::NotFound => ("NOT_FOUND", "Endpoint not found".to_string(), false, None),
        };

        let mut error = Map::new();
        error.insert("code".into(), json!(code));
        error.insert("message".into(), json!(message));
        if let Some(details) = details {
            error.insert("details".into(), details);
        }
        error.insert("retryable".into(), json!(retryable));

        json!({ "success": false, "error": error })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, "Request failed: {:?}", self);
        } else {
            tracing::debug!(status = %status, "Request rejected: {:?}", self);
        }
        (status, Json(self.body())).into_response()
    }
}

fn parse_agent_id(raw: String) -> Result<AgentId, ApiError> {
    AgentId::parse(raw).map_err(|e| ApiError::InvalidRequest(e.to_string()))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub agent_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub transaction_hash: String,
    pub agent_id: String,
    pub wallet_address: String,
}

#[derive(Debug, Deserialize)]
pub struct InitializeRequest {
    pub agent_id: String,
    pub description: String,
    #[serde(default)]
    pub memory_hub_address: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InitializeResponse {
    pub success: bool,
    pub agent_id: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub agent_id: String,
    pub query: String,
    #[serde(default)]
    pub user_context: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    pub success: bool,
    pub response: String,
    pub agent_state: AgentState,
    pub interaction_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MemoryResponse {
    pub agent_id: String,
    pub state: AgentState,
    /// RFC 3339
    pub last_updated: String,
}

async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
    }))
}

async fn register_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let Json(request) = payload?;
    let agent_id = parse_agent_id(request.agent_id)?;

    let record = state.lifecycle.register(&agent_id).await?;

    Ok(Json(RegisterResponse {
        success: true,
        transaction_hash: record.transaction_hash.to_string(),
        agent_id: record.agent_id.to_string(),
        wallet_address: record.wallet_address.to_string(),
    }))
}

async fn initialize_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<InitializeRequest>, JsonRejection>,
) -> Result<Json<InitializeResponse>, ApiError> {
    let Json(request) = payload?;
    let agent_id = parse_agent_id(request.agent_id)?;
    let memory_hub = request
        .memory_hub_address
        .filter(|address| !address.trim().is_empty())
        .map(MemoryHubAddress::unchecked);

    let initialized = state
        .lifecycle
        .initialize(&agent_id, &request.description, memory_hub)
        .await?;

    Ok(Json(InitializeResponse {
        success: true,
        agent_id: initialized.agent_id.to_string(),
        status: "initialized".to_string(),
    }))
}

async fn query_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(request) = payload?;
    let agent_id = parse_agent_id(request.agent_id)?;

    let outcome = state
        .lifecycle
        .query(&agent_id, &request.query, request.user_context)
        .await?;

    Ok(Json(QueryResponse {
        success: true,
        response: outcome.response,
        agent_state: outcome.agent_state,
        interaction_id: outcome.interaction_id,
    }))
}

async fn status_handler(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
) -> Result<Json<AgentStatusReport>, ApiError> {
    let agent_id = parse_agent_id(agent_id)?;
    Ok(Json(state.lifecycle.status(&agent_id).await))
}

async fn memory_handler(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
) -> Result<Json<MemoryResponse>, ApiError> {
    let agent_id = parse_agent_id(agent_id)?;
    let snapshot = state.lifecycle.memory(&agent_id).await?;

    Ok(Json(MemoryResponse {
        agent_id: snapshot.agent_id.to_string(),
        state: snapshot.state,
        last_updated: snapshot.last_updated.to_rfc3339(),
    }))
}

async fn not_found_handler() -> ApiError {
    ApiError::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::lifecycle::{LifecycleSettings, ManagerIdentity, StandardAgentLifecycleService};
    use crate::domain::llm::{ChatTurn, GenerationOptions, GenerationResponse, LLMError, LLMProvider, TokenUsage};
    use crate::domain::credential::UNOWNED_SENTINEL;
    use crate::infrastructure::identity_registry::InMemoryRegistryConnector;
    use crate::infrastructure::local_runtime::{ConversationLog, LocalAgentRuntime};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;

    const WALLET: &str = "0x1111111111111111111111111111111111111111";
    const OTHER_WALLET: &str = "0x2222222222222222222222222222222222222222";

    struct CannedProvider;

    #[async_trait]
    impl LLMProvider for CannedProvider {
        async fn generate(
            &self,
            _turns: &[ChatTurn],
            _options: &GenerationOptions,
        ) -> Result<GenerationResponse, LLMError> {
            Ok(GenerationResponse {
                text: "It is sunny.".into(),
                usage: TokenUsage::default(),
                provider: "canned".into(),
                model: "canned".into(),
            })
        }

        async fn health_check(&self) -> Result<(), LLMError> {
            Ok(())
        }
    }

    async fn test_app(connector: InMemoryRegistryConnector) -> Router {
        let runtime = LocalAgentRuntime::new(
            ConversationLog::new(),
            Some(Arc::new(CannedProvider)),
            GenerationOptions::default(),
        );
        let service = StandardAgentLifecycleService::connect(
            ManagerIdentity {
                wallet_address: WALLET.into(),
                secret_key: "secret".into(),
                membase_id: "manager".into(),
            },
            LifecycleSettings {
                settle_delay: Duration::ZERO,
                ..LifecycleSettings::default()
            },
            Arc::new(connector),
            Arc::new(runtime),
        )
        .await
        .unwrap();
        app(Arc::new(service))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app(InMemoryRegistryConnector::default()).await;
        let (status, body) = send(&app, get_req("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], SERVICE_NAME);
    }

    #[tokio::test]
    async fn test_register_then_register_again_returns_placeholder() {
        let app = test_app(InMemoryRegistryConnector::default()).await;

        let (status, first) = send(&app, post_json("/agent/register", json!({"agent_id": "agentA"}))).await;
        assert_eq!(status, StatusCode::OK);
        let tx = first["transaction_hash"].as_str().unwrap();
        assert_eq!(tx.len(), 66);
        assert!(tx.starts_with("0x"));
        assert_eq!(first["wallet_address"], WALLET);

        let (status, second) = send(&app, post_json("/agent/register", json!({"agent_id": "agentA"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["transaction_hash"], format!("0x{}", "0".repeat(64)));
    }

    #[tokio::test]
    async fn test_register_conflict_is_409() {
        let connector = InMemoryRegistryConnector::default();
        connector.ledger().assign("agentA", OTHER_WALLET);
        let app = test_app(connector).await;

        let (status, body) = send(&app, post_json("/agent/register", json!({"agent_id": "agentA"}))).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "AGENT_ALREADY_REGISTERED");
        assert_eq!(body["error"]["retryable"], false);
        assert!(body["error"]["message"].as_str().unwrap().contains(OTHER_WALLET));
    }

    #[tokio::test]
    async fn test_query_before_initialize_is_404_with_suggestion() {
        let app = test_app(InMemoryRegistryConnector::default()).await;

        let (status, body) = send(
            &app,
            post_json("/agent/query", json!({"agent_id": "ghost", "query": "hi"})),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "AGENT_NOT_FOUND");
        assert_eq!(body["error"]["details"]["agent_id"], "ghost");
        assert_eq!(
            body["error"]["details"]["suggestion"],
            "Call POST /agent/initialize first"
        );
    }

    #[tokio::test]
    async fn test_initialize_query_status_memory_flow() {
        let app = test_app(InMemoryRegistryConnector::default()).await;

        let (status, body) = send(
            &app,
            post_json(
                "/agent/initialize",
                json!({"agent_id": "agentA", "description": "Weather helper"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "initialized");

        let (status, body) = send(
            &app,
            post_json(
                "/agent/query",
                json!({"agent_id": "agentA", "query": "Weather?", "user_context": {"city": "Oslo"}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "It is sunny.");
        assert_eq!(body["agent_state"]["preferences"]["city"], "Oslo");
        assert_eq!(body["agent_state"]["interactionHistory"][0]["userQuery"], "Weather?");
        assert!(uuid::Uuid::parse_str(body["interaction_id"].as_str().unwrap()).is_ok());

        let (status, body) = send(&app, get_req("/agent/status/agentA")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "active");
        assert_eq!(body["registered"], false);
        assert_eq!(body["wallet_address"], UNOWNED_SENTINEL);
        assert_eq!(body["memory_hub_connected"], true);

        let (status, body) = send(&app, get_req("/agent/memory/agentA")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["agent_id"], "agentA");
        assert_eq!(body["state"]["interactionHistory"].as_array().unwrap().len(), 1);
        assert!(chrono::DateTime::parse_from_rfc3339(body["last_updated"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_status_of_unknown_agent_is_inactive() {
        let app = test_app(InMemoryRegistryConnector::default()).await;
        let (status, body) = send(&app, get_req("/agent/status/nobody")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "inactive");
        assert_eq!(body["registered"], false);
        assert_eq!(body["wallet_address"], UNOWNED_SENTINEL);
    }

    #[tokio::test]
    async fn test_malformed_body_is_400() {
        let app = test_app(InMemoryRegistryConnector::default()).await;

        let (status, body) = send(&app, post_json("/agent/register", json!({"wrong": 1}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_REQUEST");

        let (status, _) = send(&app, post_json("/agent/register", json!({"agent_id": ""}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = test_app(InMemoryRegistryConnector::default()).await;
        let (status, body) = send(&app, get_req("/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }
}
