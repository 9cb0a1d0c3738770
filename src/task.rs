//! Task list model and mutations.
//!
//! A `TaskList` is the single in-memory collection owned by a session. It is
//! replaced wholesale on load and serialized wholesale on save; every mutation
//! here is synchronous and total.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A single to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Creation timestamp in milliseconds. Two adds in the same millisecond
    /// produce the same id.
    pub id: i64,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

impl Task {
    pub fn new(id: i64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            completed: false,
        }
    }
}

/// A mutation applied to a `TaskList`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Add(String),
    Toggle(i64),
    Delete(i64),
    ClearCompleted,
}

/// Ordered task collection in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Replace the whole collection, as done after a load.
    pub fn replace(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
    }

    /// Snapshot for persistence.
    pub fn snapshot(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    /// Append a task with the trimmed text. Empty or whitespace-only text is
    /// ignored and yields `None`.
    pub fn add(&mut self, text: &str) -> Option<i64> {
        self.add_at(text, Utc::now().timestamp_millis())
    }

    /// Append a task with an explicit id.
    pub fn add_at(&mut self, text: &str, id: i64) -> Option<i64> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.tasks.push(Task::new(id, text));
        Some(id)
    }

    /// Flip `completed` on the task with `id`. Returns whether a task matched.
    pub fn toggle(&mut self, id: i64) -> bool {
        let mut matched = false;
        for task in self.tasks.iter_mut().filter(|task| task.id == id) {
            task.completed = !task.completed;
            matched = true;
        }
        matched
    }

    /// Remove the task with `id`. Returns whether anything was removed.
    pub fn delete(&mut self, id: i64) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        self.tasks.len() != before
    }

    /// Remove every completed task. Returns how many were removed.
    pub fn clear_completed(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|task| !task.completed);
        before - self.tasks.len()
    }

    pub fn active_count(&self) -> usize {
        self.tasks.iter().filter(|task| !task.completed).count()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.len() - self.active_count()
    }

    /// Apply a mutation. Returns whether the collection changed.
    pub fn apply(&mut self, mutation: &Mutation) -> bool {
        match mutation {
            Mutation::Add(text) => self.add(text).is_some(),
            Mutation::Toggle(id) => self.toggle(*id),
            Mutation::Delete(id) => self.delete(*id),
            Mutation::ClearCompleted => self.clear_completed() > 0,
        }
    }
}
