//! todosync whoami: show the identity and backend a session would use.

use serde::Serialize;

use crate::error::Result;
use crate::identity;
use crate::output::{emit_success, HumanOutput};
use crate::storage::{self, BackendKind};

use super::{guest_warning, Context};

#[derive(Serialize)]
struct WhoamiReport {
    user: String,
    guest: bool,
    backend: BackendKind,
    host: bool,
}

pub async fn run(context: &Context) -> Result<()> {
    let host = context.host();
    let storage = storage::select_backend(&context.config.storage, host.as_ref())?;
    let identity = identity::resolve(host.as_ref()).await;

    let report = WhoamiReport {
        user: identity.to_string(),
        guest: identity.is_guest(),
        backend: storage.kind(),
        host: host.user().is_some(),
    };

    let mut human = HumanOutput::new(format!("todosync whoami: {identity}"));
    human.push_summary("user", identity.to_string());
    human.push_summary("backend", storage.kind().to_string());
    if identity.is_guest() {
        human.push_summary("guest", "yes (regenerated every session)");
        human.push_next_step("todosync --host-user-id <id> whoami");
    }
    if let Some(warning) = guest_warning(&identity, storage.kind()) {
        human.push_warning(warning);
    }

    emit_success(context.options, "whoami", &report, Some(&human))
}
