//! Host environment capabilities.
//!
//! The app can run embedded in a host runtime that exposes the signed-in user
//! and a callback-style cloud key-value store. Both are optional and detected
//! at startup; nothing downstream should assume either exists.
//!
//! `DirectoryHost` is the host used by the CLI: the user id comes from config
//! or `--host-user-id`, and cloud storage is a directory whose I/O runs on a
//! worker thread before the callback fires, like a real host bridge.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::config::HostConfig;
use crate::lock::{self, DEFAULT_LOCK_TIMEOUT_MS};

/// Error reported by a host facility through its callback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct HostError(pub String);

/// Completion callback for `CloudStorage::set_item`: `(error, stored)`.
pub type SetCallback = Box<dyn FnOnce(Option<HostError>, bool) + Send + 'static>;

/// Completion callback for `CloudStorage::get_item`: `(error, value)`.
pub type GetCallback = Box<dyn FnOnce(Option<HostError>, Option<String>) + Send + 'static>;

/// Callback-based key-value facility provided by the host.
///
/// Implementations must invoke each callback at most once. Dropping a
/// callback without calling it is treated as a failed call by the adapter.
pub trait CloudStorage: Send + Sync {
    fn set_item(&self, key: &str, value: String, callback: SetCallback);
    fn get_item(&self, key: &str, callback: GetCallback);
}

/// The signed-in host user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostUser {
    pub id: i64,
}

/// Capabilities exposed by the surrounding host runtime.
pub trait HostEnvironment: Send + Sync {
    fn user(&self) -> Option<HostUser>;
    fn cloud_storage(&self) -> Option<Arc<dyn CloudStorage>>;
}

/// Running outside any host.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHost;

impl HostEnvironment for NoHost {
    fn user(&self) -> Option<HostUser> {
        None
    }

    fn cloud_storage(&self) -> Option<Arc<dyn CloudStorage>> {
        None
    }
}

/// Host backed by configuration and an optional cloud directory.
pub struct DirectoryHost {
    user: HostUser,
    cloud: Option<Arc<DirCloudStorage>>,
}

impl DirectoryHost {
    pub fn new(user: HostUser, cloud_dir: Option<PathBuf>) -> Self {
        let cloud = cloud_dir.map(|dir| {
            let scoped = dir.join(user.id.to_string());
            Arc::new(DirCloudStorage::new(scoped))
        });
        Self { user, cloud }
    }
}

impl HostEnvironment for DirectoryHost {
    fn user(&self) -> Option<HostUser> {
        Some(self.user.clone())
    }

    fn cloud_storage(&self) -> Option<Arc<dyn CloudStorage>> {
        self.cloud
            .clone()
            .map(|cloud| cloud as Arc<dyn CloudStorage>)
    }
}

/// Detect the host for this process. A host is present only when a user id
/// is configured; `user_override` (from the CLI/env) wins over the file.
pub fn detect(config: &HostConfig, user_override: Option<i64>) -> Arc<dyn HostEnvironment> {
    match user_override.or(config.user_id) {
        Some(id) => {
            tracing::debug!(user_id = id, cloud = config.cloud_dir.is_some(), "host detected");
            Arc::new(DirectoryHost::new(HostUser { id }, config.cloud_dir.clone()))
        }
        None => {
            tracing::debug!("no host environment");
            Arc::new(NoHost)
        }
    }
}

/// Directory-backed cloud storage, one file per key.
#[derive(Debug, Clone)]
pub struct DirCloudStorage {
    root: PathBuf,
}

impl DirCloudStorage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn value_path(&self, key: &str) -> Result<PathBuf, HostError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

impl CloudStorage for DirCloudStorage {
    fn set_item(&self, key: &str, value: String, callback: SetCallback) {
        let path = match self.value_path(key) {
            Ok(path) => path,
            Err(err) => return callback(Some(err), false),
        };
        std::thread::spawn(move || {
            match lock::write_atomic_locked(&path, value.as_bytes(), DEFAULT_LOCK_TIMEOUT_MS) {
                Ok(()) => callback(None, true),
                Err(err) => callback(Some(HostError(err.to_string())), false),
            }
        });
    }

    fn get_item(&self, key: &str, callback: GetCallback) {
        let path = match self.value_path(key) {
            Ok(path) => path,
            Err(err) => return callback(Some(err), None),
        };
        std::thread::spawn(move || match lock::read_locked_opt(&path, DEFAULT_LOCK_TIMEOUT_MS) {
            Ok(value) => callback(None, value),
            Err(err) => callback(Some(HostError(err.to_string())), None),
        });
    }
}

// Host keys are 1-128 characters of A-Z, a-z, 0-9, _ and -.
fn validate_key(key: &str) -> Result<(), HostError> {
    if key.is_empty() || key.len() > 128 {
        return Err(HostError(format!("invalid key length: {}", key.len())));
    }
    if !key
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
    {
        return Err(HostError(format!("invalid key: {key}")));
    }
    Ok(())
}
