//! Storage backends for task collections.
//!
//! Three interchangeable backends sit behind [`TaskBackend`]:
//!
//! ```text
//! local       device key-value store, key "todos", not identity-scoped
//! remote      GET/POST {base}/todos, scoped by userId
//! host_cloud  host callback facility, key "todos", scoped by the host user
//! ```
//!
//! A backend is picked once per session by [`select_backend`]. Callers go
//! through [`Storage`], which never fails: load errors become an empty
//! collection and save errors become `false`, both logged.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::{StorageConfig, StoragePolicy};
use crate::error::{Error, Result};
use crate::host::HostEnvironment;
use crate::identity::UserIdentity;
use crate::task::Task;

pub mod cloud;
pub mod local;
pub mod remote;

pub use cloud::HostCloudBackend;
pub use local::{DeviceStore, LocalBackend};
pub use remote::RemoteBackend;

/// Key under which the task array is stored in key-value backends.
pub const TODOS_KEY: &str = "todos";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Local,
    Remote,
    HostCloud,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Local => "local",
            BackendKind::Remote => "remote",
            BackendKind::HostCloud => "host_cloud",
        }
    }

    /// Whether stored data is keyed by the session identity.
    pub fn is_identity_scoped(&self) -> bool {
        !matches!(self, BackendKind::Local)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persistence mechanism for one user's task collection.
#[async_trait]
pub trait TaskBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Fetch the stored collection. Nothing stored yet is `Ok(vec![])`.
    async fn load(&self, identity: &UserIdentity) -> Result<Vec<Task>>;

    /// Replace the stored collection with `tasks`.
    async fn save(&self, identity: &UserIdentity, tasks: &[Task]) -> Result<()>;
}

/// Non-failing facade over the selected backend.
#[derive(Clone)]
pub struct Storage {
    backend: Arc<dyn TaskBackend>,
}

impl Storage {
    pub fn new(backend: Arc<dyn TaskBackend>) -> Self {
        Self { backend }
    }

    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Load the collection, or an empty one if the backend fails.
    pub async fn load(&self, identity: &UserIdentity) -> Vec<Task> {
        match self.backend.load(identity).await {
            Ok(tasks) => {
                tracing::debug!(backend = %self.kind(), user = %identity, count = tasks.len(), "loaded tasks");
                tasks
            }
            Err(err) => {
                tracing::warn!(backend = %self.kind(), user = %identity, error = %err, "load failed, starting empty");
                Vec::new()
            }
        }
    }

    /// Save the collection. Returns `false` if the backend failed; the
    /// failure is logged and not retried.
    pub async fn save(&self, identity: &UserIdentity, tasks: &[Task]) -> bool {
        match self.backend.save(identity, tasks).await {
            Ok(()) => {
                tracing::debug!(backend = %self.kind(), user = %identity, count = tasks.len(), "saved tasks");
                true
            }
            Err(err) => {
                tracing::warn!(backend = %self.kind(), user = %identity, error = %err, "save failed");
                false
            }
        }
    }
}

/// Pick the backend for this session.
///
/// - `capability`: host cloud storage if the host offers it, else the device
///   store.
/// - `remote`: always the remote API.
pub fn select_backend(config: &StorageConfig, host: &dyn HostEnvironment) -> Result<Storage> {
    let backend: Arc<dyn TaskBackend> = match config.policy {
        StoragePolicy::Remote => {
            let url = config.remote_url.as_deref().ok_or_else(|| {
                Error::InvalidConfig(
                    "storage.remote_url is required when storage.policy = \"remote\"".to_string(),
                )
            })?;
            Arc::new(RemoteBackend::new(url, config.remote_timeout_ms)?)
        }
        StoragePolicy::Capability => match host.cloud_storage() {
            Some(cloud) => Arc::new(HostCloudBackend::new(cloud)),
            None => {
                let reason = Error::StorageUnavailable(BackendKind::HostCloud.to_string());
                tracing::debug!(reason = %reason, "falling back to device storage");
                Arc::new(LocalBackend::new(DeviceStore::new(config.local_dir())))
            }
        },
    };

    tracing::info!(backend = %backend.kind(), "selected storage backend");
    Ok(Storage::new(backend))
}

pub(crate) fn decode_tasks(raw: &str) -> Result<Vec<Task>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(raw)?)
}

pub(crate) fn encode_tasks(tasks: &[Task]) -> Result<String> {
    Ok(serde_json::to_string(tasks)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{DirectoryHost, HostUser, NoHost};

    #[test]
    fn capability_policy_without_cloud_uses_local() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = StorageConfig {
            local_dir: Some(dir.path().to_path_buf()),
            ..StorageConfig::default()
        };
        let storage = select_backend(&config, &NoHost).expect("select");
        assert_eq!(storage.kind(), BackendKind::Local);
    }

    #[test]
    fn capability_policy_prefers_host_cloud() {
        let dir = tempfile::tempdir().expect("tempdir");
        let host = DirectoryHost::new(HostUser { id: 9 }, Some(dir.path().to_path_buf()));
        let storage = select_backend(&StorageConfig::default(), &host).expect("select");
        assert_eq!(storage.kind(), BackendKind::HostCloud);
    }

    #[test]
    fn capability_policy_host_without_cloud_uses_local() {
        let dir = tempfile::tempdir().expect("tempdir");
        let host = DirectoryHost::new(HostUser { id: 9 }, None);
        let config = StorageConfig {
            local_dir: Some(dir.path().to_path_buf()),
            ..StorageConfig::default()
        };
        let storage = select_backend(&config, &host).expect("select");
        assert_eq!(storage.kind(), BackendKind::Local);
    }

    #[test]
    fn remote_policy_ignores_host_capabilities() {
        let dir = tempfile::tempdir().expect("tempdir");
        let host = DirectoryHost::new(HostUser { id: 9 }, Some(dir.path().to_path_buf()));
        let config = StorageConfig {
            policy: StoragePolicy::Remote,
            remote_url: Some("http://127.0.0.1:9".to_string()),
            ..StorageConfig::default()
        };
        let storage = select_backend(&config, &host).expect("select");
        assert_eq!(storage.kind(), BackendKind::Remote);
    }

    #[test]
    fn remote_policy_without_url_is_config_error() {
        let config = StorageConfig {
            policy: StoragePolicy::Remote,
            ..StorageConfig::default()
        };
        assert!(matches!(
            select_backend(&config, &NoHost),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn identity_scoping_by_kind() {
        assert!(!BackendKind::Local.is_identity_scoped());
        assert!(BackendKind::Remote.is_identity_scoped());
        assert!(BackendKind::HostCloud.is_identity_scoped());
    }

    #[test]
    fn decode_blank_is_empty() {
        assert!(decode_tasks("  ").expect("decode").is_empty());
        assert!(decode_tasks("{").is_err());
    }
}
