//! Wire types for the remote todo API, shared by the HTTP backend and the
//! server.

use serde::{Deserialize, Serialize};

use crate::task::Task;

pub const TODOS_PATH: &str = "/todos";
pub const USER_ID_PARAM: &str = "userId";

/// Body of `POST /todos`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveTodosRequest {
    pub user_id: String,
    pub todos: Vec<Task>,
}

/// Success body of `POST /todos`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveTodosResponse {
    pub success: bool,
    pub message: String,
}

/// Body of every 4xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
