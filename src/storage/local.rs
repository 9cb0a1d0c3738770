//! Device key-value store and the local backend built on it.
//!
//! One file per key under the store directory. Single user per device: the
//! session identity is ignored.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::identity::UserIdentity;
use crate::lock::{self, DEFAULT_LOCK_TIMEOUT_MS};
use crate::task::Task;

use super::{decode_tasks, encode_tasks, BackendKind, TaskBackend, TODOS_KEY};

/// Synchronous string key-value store on the local filesystem.
#[derive(Debug, Clone)]
pub struct DeviceStore {
    dir: PathBuf,
}

impl DeviceStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.item_path(key)?;
        lock::read_locked_opt(&path, DEFAULT_LOCK_TIMEOUT_MS)
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let path = self.item_path(key)?;
        lock::write_atomic_locked(&path, value.as_bytes(), DEFAULT_LOCK_TIMEOUT_MS)
    }

    fn item_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || !key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
        {
            return Err(Error::InvalidArgument(format!("invalid store key: '{key}'")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

/// Backend persisting to the device store under [`TODOS_KEY`].
#[derive(Debug, Clone)]
pub struct LocalBackend {
    store: DeviceStore,
}

impl LocalBackend {
    pub fn new(store: DeviceStore) -> Self {
        Self { store }
    }

    // Lock waits sleep the calling thread.
    async fn with_store<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&DeviceStore) -> Result<T> + Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(|e| Error::OperationFailed(format!("device store task failed: {e}")))?
    }
}

#[async_trait]
impl TaskBackend for LocalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn load(&self, _identity: &UserIdentity) -> Result<Vec<Task>> {
        match self.with_store(|store| store.get_item(TODOS_KEY)).await? {
            Some(raw) => decode_tasks(&raw),
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, _identity: &UserIdentity, tasks: &[Task]) -> Result<()> {
        let raw = encode_tasks(tasks)?;
        self.with_store(move |store| store.set_item(TODOS_KEY, &raw))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn identity(id: &str) -> UserIdentity {
        UserIdentity::new(id).expect("identity")
    }

    #[test]
    fn get_missing_key_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DeviceStore::new(dir.path().to_path_buf());
        assert_eq!(store.get_item("todos").expect("get"), None);
    }

    #[test]
    fn set_then_get() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DeviceStore::new(dir.path().join("nested"));
        store.set_item("todos", "[]").expect("set");
        assert_eq!(store.get_item("todos").expect("get").as_deref(), Some("[]"));
        assert!(dir.path().join("nested").join("todos.json").exists());
    }

    #[test]
    fn rejects_path_like_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DeviceStore::new(dir.path().to_path_buf());
        assert!(store.set_item("../todos", "[]").is_err());
        assert!(store.get_item("").is_err());
    }

    #[tokio::test]
    async fn load_ignores_identity() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = LocalBackend::new(DeviceStore::new(dir.path().to_path_buf()));
        let tasks = vec![Task::new(1, "a"), Task::new(2, "b")];

        backend.save(&identity("alice"), &tasks).await.expect("save");
        let loaded = backend.load(&identity("bob")).await.expect("load");
        assert_eq!(loaded, tasks);
    }

    #[tokio::test]
    async fn corrupt_value_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("todos.json"), "{not json").expect("write");
        let backend = LocalBackend::new(DeviceStore::new(dir.path().to_path_buf()));
        assert!(matches!(
            backend.load(&identity("alice")).await,
            Err(Error::Json(_))
        ));
    }

    #[tokio::test]
    async fn contended_store_does_not_block_the_runtime() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("todos.json"), "[]").expect("write");
        let held = crate::lock::FileLock::acquire(dir.path().join("todos.json.lock"), 1000)
            .expect("lock");

        let backend = LocalBackend::new(DeviceStore::new(dir.path().to_path_buf()));
        let load = tokio::spawn(async move { backend.load(&identity("alice")).await });

        let started = std::time::Instant::now();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(started.elapsed() < std::time::Duration::from_secs(1));

        drop(held);
        let loaded = load.await.expect("join").expect("load");
        assert!(loaded.is_empty());
    }
}
