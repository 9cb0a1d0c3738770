//! Host cloud-storage backend.
//!
//! The host facility reports completion through callbacks. Each call is
//! bridged into a future with a oneshot channel here, so nothing above this
//! module sees callback style.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::error::{Error, Result};
use crate::host::CloudStorage;
use crate::identity::UserIdentity;
use crate::task::Task;

use super::{decode_tasks, encode_tasks, BackendKind, TaskBackend, TODOS_KEY};

#[derive(Clone)]
pub struct HostCloudBackend {
    cloud: Arc<dyn CloudStorage>,
}

impl HostCloudBackend {
    pub fn new(cloud: Arc<dyn CloudStorage>) -> Self {
        Self { cloud }
    }

    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let (tx, rx) = oneshot::channel();
        self.cloud.get_item(
            key,
            Box::new(move |err, value| {
                let _ = tx.send(match err {
                    Some(err) => Err(err),
                    None => Ok(value),
                });
            }),
        );

        match rx.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(Error::Transport(format!("host getItem failed: {err}"))),
            Err(_) => Err(Error::Transport(
                "host dropped the getItem callback".to_string(),
            )),
        }
    }

    async fn set_item(&self, key: &str, value: String) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.cloud.set_item(
            key,
            value,
            Box::new(move |err, stored| {
                let _ = tx.send(match err {
                    Some(err) => Err(err),
                    None => Ok(stored),
                });
            }),
        );

        match rx.await {
            Ok(Ok(true)) => Ok(()),
            Ok(Ok(false)) => Err(Error::Transport(
                "host setItem reported the value was not stored".to_string(),
            )),
            Ok(Err(err)) => Err(Error::Transport(format!("host setItem failed: {err}"))),
            Err(_) => Err(Error::Transport(
                "host dropped the setItem callback".to_string(),
            )),
        }
    }
}

#[async_trait]
impl TaskBackend for HostCloudBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::HostCloud
    }

    // The host facility is already scoped to its signed-in user.
    async fn load(&self, _identity: &UserIdentity) -> Result<Vec<Task>> {
        match self.get_item(TODOS_KEY).await? {
            Some(raw) => decode_tasks(&raw),
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, _identity: &UserIdentity, tasks: &[Task]) -> Result<()> {
        let raw = encode_tasks(tasks)?;
        self.set_item(TODOS_KEY, raw).await
    }
}
