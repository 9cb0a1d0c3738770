//! One-shot task commands: list, add, toggle, rm, clear.
//!
//! Each invocation is a full session: resolve identity, load, apply at most
//! one mutation, then wait for the save before reporting.

use serde::Serialize;

use crate::error::Result;
use crate::identity::UserIdentity;
use crate::output::{emit_success, format_task, HumanOutput};
use crate::plural::counter_label;
use crate::storage::BackendKind;
use crate::sync::{NullRenderer, Session};
use crate::task::{Task, TaskList};

use super::{guest_warning, Context};

#[derive(Serialize)]
struct TaskListReport {
    user: String,
    backend: BackendKind,
    tasks: Vec<Task>,
    active: usize,
    counter: String,
}

#[derive(Serialize)]
struct MutationReport {
    user: String,
    backend: BackendKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    changed: bool,
    active: usize,
    counter: String,
}

pub async fn run_list(context: &Context) -> Result<()> {
    let mut session = context.session(NullRenderer)?;
    let identity = session.start().await;
    let backend = session.backend_kind();
    let list = session.tasks().clone();
    session.shutdown().await;

    let report = TaskListReport {
        user: identity.to_string(),
        backend,
        tasks: list.snapshot(),
        active: list.active_count(),
        counter: counter_label(list.active_count() as u64),
    };

    let mut human = HumanOutput::new(format!("todosync list: {}", report.counter));
    for task in list.tasks() {
        human.push_detail(format_task(task));
    }
    push_context(&mut human, &identity, backend);
    if list.is_empty() {
        human.push_next_step("todosync add <text>");
    }

    emit_success(context.options, "list", &report, Some(&human))
}

pub async fn run_add(context: &Context, text: String) -> Result<()> {
    run_mutation(context, "add", |session| {
        let id = session.add(&text);
        (id, id.is_some())
    })
    .await
}

pub async fn run_toggle(context: &Context, id: i64) -> Result<()> {
    run_mutation(context, "toggle", |session| (Some(id), session.toggle(id))).await
}

pub async fn run_rm(context: &Context, id: i64) -> Result<()> {
    run_mutation(context, "rm", |session| (Some(id), session.delete(id))).await
}

pub async fn run_clear(context: &Context) -> Result<()> {
    run_mutation(context, "clear", |session| (None, session.clear_completed())).await
}

async fn run_mutation<F>(context: &Context, command: &str, apply: F) -> Result<()>
where
    F: FnOnce(&mut Session<NullRenderer>) -> (Option<i64>, bool),
{
    let mut session = context.session(NullRenderer)?;
    let identity = session.start().await;
    let backend = session.backend_kind();

    let before = session.tasks().len();
    let (id, changed) = apply(&mut session);
    let list: TaskList = session.tasks().clone();
    session.shutdown().await;

    let report = MutationReport {
        user: identity.to_string(),
        backend,
        id,
        changed,
        active: list.active_count(),
        counter: counter_label(list.active_count() as u64),
    };

    let header = match (command, changed) {
        ("add", true) => format!("todosync add: added {}", id.unwrap_or_default()),
        ("add", false) => "todosync add: nothing added".to_string(),
        ("clear", _) => format!(
            "todosync clear: removed {}",
            before.saturating_sub(list.len())
        ),
        (_, true) => format!("todosync {command}: {}", id.unwrap_or_default()),
        (_, false) => format!("todosync {command}: no change"),
    };

    let mut human = HumanOutput::new(header);
    if let Some(task) = id.and_then(|id| list.get(id)) {
        human.push_detail(format_task(task));
    }
    human.push_summary("active", report.counter.clone());
    push_context(&mut human, &identity, backend);
    match (command, changed) {
        ("add", false) => human.push_warning("task text is empty"),
        ("toggle", false) | ("rm", false) => {
            human.push_warning(format!("no task with id {}", id.unwrap_or_default()));
            human.push_next_step("todosync list");
        }
        _ => {}
    }

    emit_success(context.options, command, &report, Some(&human))
}

fn push_context(human: &mut HumanOutput, identity: &UserIdentity, backend: BackendKind) {
    human.push_summary("user", identity.to_string());
    human.push_summary("backend", backend.to_string());
    if let Some(warning) = guest_warning(identity, backend) {
        human.push_warning(warning);
    }
}
