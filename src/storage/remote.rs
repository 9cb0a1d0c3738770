//! Remote HTTP backend talking to the todo API (`GET`/`POST /todos`).

use std::time::Duration;

use async_trait::async_trait;

use crate::api::{SaveTodosRequest, TODOS_PATH, USER_ID_PARAM};
use crate::error::{Error, Result};
use crate::identity::UserIdentity;
use crate::task::Task;

use super::{BackendKind, TaskBackend};

#[derive(Debug, Clone)]
pub struct RemoteBackend {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteBackend {
    /// Build a backend for `base_url`. `timeout_ms` of `None` leaves requests
    /// without a deadline.
    pub fn new(base_url: &str, timeout_ms: Option<u64>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout_ms) = timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        let client = builder.build()?;
        Ok(Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn todos_url(&self) -> String {
        format!("{}{}", self.base_url, TODOS_PATH)
    }
}

#[async_trait]
impl TaskBackend for RemoteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    async fn load(&self, identity: &UserIdentity) -> Result<Vec<Task>> {
        let response = self
            .client
            .get(self.todos_url())
            .query(&[(USER_ID_PARAM, identity.id())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Transport(format!("GET {TODOS_PATH} returned {status}")));
        }

        Ok(response.json::<Vec<Task>>().await?)
    }

    async fn save(&self, identity: &UserIdentity, tasks: &[Task]) -> Result<()> {
        let body = SaveTodosRequest {
            user_id: identity.id().to_string(),
            todos: tasks.to_vec(),
        };

        let response = self.client.post(self.todos_url()).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Transport(format!("POST {TODOS_PATH} returned {status}")));
        }
        Ok(())
    }
}
