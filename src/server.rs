//! HTTP server for the remote todo API.
//!
//! ## Endpoints
//!
//! - `GET /todos?userId=<id>`: the user's last saved tasks, `[]` if none
//! - `POST /todos`: replace the user's tasks with `{userId, todos}`
//!
//! Records live in process memory only and are lost on restart. Every
//! `OPTIONS` request is answered with 200, and CORS allows any origin.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, Request, State};
use axum::http::{header, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};

use crate::api::{ErrorBody, SaveTodosRequest, SaveTodosResponse, TODOS_PATH};
use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::task::Task;

/// Shared server state: `userId -> tasks`.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    records: Arc<RwLock<HashMap<String, Vec<Task>>>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn todos_for(&self, user_id: &str) -> Option<Vec<Task>> {
        self.records.read().await.get(user_id).cloned()
    }

    pub async fn user_count(&self) -> usize {
        self.records.read().await.len()
    }

    async fn replace(&self, user_id: String, todos: Vec<Task>) {
        self.records.write().await.insert(user_id, todos);
    }
}

/// Build the API router over `state`.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route(TODOS_PATH, get(get_todos).post(save_todos))
        .fallback(not_found)
        .layer(middleware::from_fn(answer_options))
        .layer(cors)
        .with_state(state)
}

/// A running API server.
pub struct TodoServer {
    addr: SocketAddr,
    state: AppState,
    handle: JoinHandle<()>,
}

impl TodoServer {
    /// Bind `{config.host}:{config.port}` (port `0` picks a free port) and
    /// serve in a background task.
    pub async fn start(config: &ServerConfig) -> Result<Self> {
        let state = AppState::new();
        let app = router(state.clone());

        let bind_addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&bind_addr).await.map_err(|e| {
            Error::OperationFailed(format!("failed to bind {bind_addr}: {e}"))
        })?;
        let addr = listener.local_addr()?;

        tracing::info!("todo server listening on http://{addr}");

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("todo server error: {e}");
            }
        });

        Ok(Self {
            addr,
            state,
            handle,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL for clients on this machine.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serve until the task ends.
    pub async fn wait(self) -> Result<()> {
        self.handle
            .await
            .map_err(|e| Error::OperationFailed(format!("server task failed: {e}")))
    }

    pub fn shutdown(self) {
        self.handle.abort();
    }
}

#[derive(Debug, Deserialize)]
struct TodosQuery {
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

async fn get_todos(
    State(state): State<AppState>,
    query: std::result::Result<Query<TodosQuery>, QueryRejection>,
) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => return bad_request(&rejection.body_text()),
    };
    let Some(user_id) = query.user_id.filter(|id| !id.is_empty()) else {
        return bad_request("userId parameter is required");
    };

    let todos = state.todos_for(&user_id).await.unwrap_or_default();
    Json(todos).into_response()
}

async fn save_todos(State(state): State<AppState>, body: Bytes) -> Response {
    let request = match parse_save_request(&body) {
        Ok(request) => request,
        Err(Error::Validation(message)) => return bad_request(&message),
        Err(other) => return bad_request(&other.to_string()),
    };

    tracing::debug!(user = %request.user_id, count = request.todos.len(), "saving todos");
    state.replace(request.user_id, request.todos).await;

    Json(SaveTodosResponse {
        success: true,
        message: "Todos saved successfully".to_string(),
    })
    .into_response()
}

/// Validate a `POST /todos` body. `userId` must be a non-empty string (a
/// number is accepted and stringified) and `todos` an array of tasks.
pub fn parse_save_request(body: &[u8]) -> Result<SaveTodosRequest> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| Error::Validation(format!("invalid JSON body: {e}")))?;

    let user_id = match value.get("userId") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => return Err(Error::Validation("userId is required".to_string())),
    };

    let todos = match value.get("todos") {
        Some(todos @ Value::Array(_)) => serde_json::from_value::<Vec<Task>>(todos.clone())
            .map_err(|e| Error::Validation(format!("todos must be an array of tasks: {e}")))?,
        _ => return Err(Error::Validation("todos must be an array".to_string())),
    };

    Ok(SaveTodosRequest { user_id, todos })
}

async fn answer_options(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    next.run(request).await
}

async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "not found".to_string(),
        }),
    )
        .into_response()
}

fn bad_request(message: &str) -> Response {
    tracing::debug!(error = message, "rejecting request");
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}
