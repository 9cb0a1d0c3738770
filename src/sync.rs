//! Session orchestration: identity, initial load, and save-on-mutation.
//!
//! A [`Session`] owns the task list for one UI session and moves through
//!
//! ```text
//! Uninitialized -> ResolvingIdentity -> Loading -> Ready <-> Saving
//! ```
//!
//! Identity resolution is awaited before the load starts, and the load is
//! awaited before the first render. Mutations apply and render immediately;
//! persistence is handed to a single saver task whose mailbox holds one
//! snapshot, so a burst of mutations ends in one save of the newest state
//! instead of racing saves.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::host::HostEnvironment;
use crate::identity::{self, UserIdentity};
use crate::storage::{BackendKind, Storage};
use crate::task::{Mutation, Task, TaskList};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Uninitialized,
    ResolvingIdentity,
    Loading,
    Ready,
    /// Ready, with a snapshot not yet persisted.
    Saving,
}

/// Receives the task list whenever it should be redrawn.
pub trait Renderer {
    fn render(&mut self, tasks: &TaskList);
}

/// Renderer that draws nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _tasks: &TaskList) {}
}

pub struct Session<R: Renderer> {
    host: Arc<dyn HostEnvironment>,
    storage: Storage,
    renderer: R,
    state: SyncState,
    identity: Option<UserIdentity>,
    tasks: TaskList,
    deferred: Vec<Mutation>,
    saver: Option<SaveCoalescer>,
}

impl<R: Renderer> Session<R> {
    pub fn new(host: Arc<dyn HostEnvironment>, storage: Storage, renderer: R) -> Self {
        Self {
            host,
            storage,
            renderer,
            state: SyncState::Uninitialized,
            identity: None,
            tasks: TaskList::new(),
            deferred: Vec::new(),
            saver: None,
        }
    }

    /// Resolve identity, load the stored collection and render. Calling it
    /// again after the session is ready does nothing.
    pub async fn start(&mut self) -> UserIdentity {
        if let Some(identity) = &self.identity {
            return identity.clone();
        }

        self.state = SyncState::ResolvingIdentity;
        let identity = identity::resolve(self.host.as_ref()).await;

        self.state = SyncState::Loading;
        let loaded = self.storage.load(&identity).await;
        self.tasks.replace(loaded);

        self.saver = Some(SaveCoalescer::spawn(self.storage.clone(), identity.clone()));
        self.identity = Some(identity.clone());
        self.state = SyncState::Ready;
        tracing::info!(user = %identity, backend = %self.storage.kind(), count = self.tasks.len(), "session ready");

        if self.deferred.is_empty() {
            self.renderer.render(&self.tasks);
        } else {
            let deferred = std::mem::take(&mut self.deferred);
            tracing::debug!(count = deferred.len(), "replaying deferred mutations");
            for mutation in &deferred {
                self.tasks.apply(mutation);
            }
            self.renderer.render(&self.tasks);
            self.enqueue_save();
        }

        identity
    }

    pub fn state(&self) -> SyncState {
        match (&self.state, &self.saver) {
            (SyncState::Ready, Some(saver)) if saver.has_pending() => SyncState::Saving,
            (state, _) => *state,
        }
    }

    pub fn identity(&self) -> Option<&UserIdentity> {
        self.identity.as_ref()
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.storage.kind()
    }

    pub fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Add a task. Blank text is ignored. Before the session is ready the
    /// add is deferred and `None` is returned.
    pub fn add(&mut self, text: &str) -> Option<i64> {
        if text.trim().is_empty() {
            return None;
        }
        if self.state != SyncState::Ready {
            self.deferred.push(Mutation::Add(text.to_string()));
            return None;
        }
        let id = self.tasks.add(text);
        self.after_mutation();
        id
    }

    /// Flip completion of task `id`. Returns whether a task matched.
    pub fn toggle(&mut self, id: i64) -> bool {
        self.mutate(Mutation::Toggle(id))
    }

    /// Delete task `id`. Returns whether a task matched.
    pub fn delete(&mut self, id: i64) -> bool {
        self.mutate(Mutation::Delete(id))
    }

    /// Remove completed tasks. Returns whether anything was removed.
    pub fn clear_completed(&mut self) -> bool {
        self.mutate(Mutation::ClearCompleted)
    }

    fn mutate(&mut self, mutation: Mutation) -> bool {
        if self.state != SyncState::Ready {
            self.deferred.push(mutation);
            return false;
        }
        let changed = self.tasks.apply(&mutation);
        self.after_mutation();
        changed
    }

    fn after_mutation(&mut self) {
        self.renderer.render(&self.tasks);
        self.enqueue_save();
    }

    fn enqueue_save(&mut self) {
        if let Some(saver) = self.saver.as_mut() {
            saver.enqueue(self.tasks.snapshot());
        }
    }

    /// Wait until the newest snapshot has been handed to the backend.
    pub async fn flush(&self) {
        if let Some(saver) = &self.saver {
            saver.flush().await;
        }
    }

    /// Flush pending saves and stop the saver task.
    pub async fn shutdown(mut self) -> R {
        if let Some(saver) = self.saver.take() {
            saver.shutdown().await;
        }
        self.renderer
    }
}

#[derive(Debug, Clone)]
struct Snapshot {
    generation: u64,
    tasks: Vec<Task>,
}

/// Saver task with a depth-1 mailbox. A snapshot enqueued while a save is in
/// flight replaces any snapshot still waiting.
struct SaveCoalescer {
    pending: watch::Sender<Option<Snapshot>>,
    completed: watch::Receiver<u64>,
    generation: u64,
    handle: JoinHandle<()>,
}

impl SaveCoalescer {
    fn spawn(storage: Storage, identity: UserIdentity) -> Self {
        let (pending, mut mailbox) = watch::channel(None::<Snapshot>);
        let (completed_tx, completed) = watch::channel(0u64);

        let handle = tokio::spawn(async move {
            while mailbox.changed().await.is_ok() {
                let snapshot = mailbox.borrow_and_update().clone();
                let Some(snapshot) = snapshot else {
                    continue;
                };
                storage.save(&identity, &snapshot.tasks).await;
                completed_tx.send_replace(snapshot.generation);
            }
        });

        Self {
            pending,
            completed,
            generation: 0,
            handle,
        }
    }

    fn enqueue(&mut self, tasks: Vec<Task>) {
        self.generation += 1;
        self.pending.send_replace(Some(Snapshot {
            generation: self.generation,
            tasks,
        }));
    }

    fn has_pending(&self) -> bool {
        *self.completed.borrow() < self.generation
    }

    async fn flush(&self) {
        let target = self.generation;
        let mut completed = self.completed.clone();
        // Err means the saver is gone; there is nothing left to wait for.
        let _ = completed.wait_for(|done| *done >= target).await;
    }

    async fn shutdown(self) {
        self.flush().await;
        drop(self.pending);
        if let Err(err) = self.handle.await {
            tracing::warn!(error = %err, "saver task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NoHost;
    use crate::storage::{DeviceStore, LocalBackend};

    #[derive(Default)]
    struct Recorder {
        frames: Vec<Vec<Task>>,
    }

    impl Renderer for Recorder {
        fn render(&mut self, tasks: &TaskList) {
            self.frames.push(tasks.snapshot());
        }
    }

    fn local_session(dir: &std::path::Path) -> Session<Recorder> {
        let backend = LocalBackend::new(DeviceStore::new(dir.to_path_buf()));
        Session::new(
            Arc::new(NoHost),
            Storage::new(Arc::new(backend)),
            Recorder::default(),
        )
    }

    #[tokio::test]
    async fn start_moves_to_ready_and_renders_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = local_session(dir.path());
        assert_eq!(session.state(), SyncState::Uninitialized);

        let identity = session.start().await;
        assert!(identity.is_guest());
        assert_eq!(session.state(), SyncState::Ready);
        assert_eq!(session.renderer().frames.len(), 1);
        assert!(session.tasks().is_empty());

        let again = session.start().await;
        assert_eq!(again, identity);
        assert_eq!(session.renderer().frames.len(), 1);
    }

    #[tokio::test]
    async fn mutations_render_immediately_and_persist() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = local_session(dir.path());
        session.start().await;

        let id = session.add("write tests").expect("added");
        assert_eq!(session.renderer().frames.len(), 2);
        assert!(session.toggle(id));
        assert_eq!(session.renderer().frames.len(), 3);
        assert!(session.renderer().frames[2][0].completed);

        let recorder = session.shutdown().await;
        assert_eq!(recorder.frames.len(), 3);

        let mut reopened = local_session(dir.path());
        reopened.start().await;
        assert_eq!(reopened.tasks().len(), 1);
        assert!(reopened.tasks().get(id).expect("task").completed);
    }

    #[tokio::test]
    async fn blank_add_neither_renders_nor_saves() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = local_session(dir.path());
        session.start().await;

        assert_eq!(session.add("   "), None);
        assert_eq!(session.renderer().frames.len(), 1);
        assert_eq!(session.state(), SyncState::Ready);
    }

    #[tokio::test]
    async fn mutations_before_start_are_deferred() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DeviceStore::new(dir.path().to_path_buf());
        store
            .set_item("todos", r#"[{"id":1,"text":"stored","completed":false}]"#)
            .expect("seed");

        let mut session = local_session(dir.path());
        assert_eq!(session.add("early"), None);
        assert!(!session.toggle(1));
        assert!(session.renderer().frames.is_empty());

        session.start().await;
        let tasks = session.tasks().tasks();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].text, "stored");
        assert!(tasks[0].completed);
        assert_eq!(tasks[1].text, "early");
        assert_eq!(session.renderer().frames.len(), 1);

        session.flush().await;
        let raw = store.get_item("todos").expect("get").expect("saved");
        assert!(raw.contains("early"));
    }

    #[tokio::test]
    async fn flush_settles_saving_state() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = local_session(dir.path());
        session.start().await;

        session.add("one");
        session.flush().await;
        assert_eq!(session.state(), SyncState::Ready);
    }
}
