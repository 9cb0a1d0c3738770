#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use todosync::config::CONFIG_FILENAME;
use todosync::identity::UserIdentity;
use todosync::storage::{BackendKind, TaskBackend};
use todosync::task::Task;
use todosync::{Error, Result};
use tokio::sync::Mutex;

/// A scratch directory holding a `.todosync.toml` and a device store.
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn store_dir(&self) -> PathBuf {
        self.dir.path().join("store")
    }

    pub fn cloud_dir(&self) -> PathBuf {
        self.dir.path().join("cloud")
    }

    pub fn write_config(&self, contents: &str) -> PathBuf {
        let path = self.dir.path().join(CONFIG_FILENAME);
        fs::write(&path, contents).expect("write config");
        path
    }

    /// Config pointing the device store and host cloud into this directory.
    pub fn write_local_config(&self) -> PathBuf {
        self.write_config(&format!(
            "[storage]\npolicy = \"capability\"\nlocal_dir = {:?}\n\n[host]\ncloud_dir = {:?}\n",
            self.store_dir().display().to_string(),
            self.cloud_dir().display().to_string(),
        ))
    }
}

/// In-memory backend that records every save and can be slowed down.
#[derive(Clone, Default)]
pub struct RecordingBackend {
    pub stored: Arc<Mutex<Vec<Task>>>,
    pub saves: Arc<Mutex<Vec<Vec<Task>>>>,
    pub delay: Duration,
    pub fail: bool,
}

impl RecordingBackend {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub async fn seed(&self, tasks: Vec<Task>) {
        *self.stored.lock().await = tasks;
    }

    pub async fn save_count(&self) -> usize {
        self.saves.lock().await.len()
    }

    pub async fn last_saved(&self) -> Option<Vec<Task>> {
        self.saves.lock().await.last().cloned()
    }
}

#[async_trait]
impl TaskBackend for RecordingBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    async fn load(&self, _identity: &UserIdentity) -> Result<Vec<Task>> {
        if self.fail {
            return Err(Error::Transport("load refused".to_string()));
        }
        Ok(self.stored.lock().await.clone())
    }

    async fn save(&self, _identity: &UserIdentity, tasks: &[Task]) -> Result<()> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(Error::Transport("save refused".to_string()));
        }
        self.saves.lock().await.push(tasks.to_vec());
        *self.stored.lock().await = tasks.to_vec();
        Ok(())
    }
}
