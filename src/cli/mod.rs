//! Command-line interface for todosync
//!
//! This module defines the CLI structure using clap derive macros.
//! Each subcommand is defined in its own submodule.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::host::{self, HostEnvironment};
use crate::identity::UserIdentity;
use crate::output::OutputOptions;
use crate::storage::{self, BackendKind};
use crate::sync::{Renderer, Session};

mod serve;
mod shell;
mod tasks;
mod whoami;

/// todosync - personal task list
///
/// Keeps a short task list on this device, in the host's cloud storage, or
/// on a remote todo server, and can run that server.
#[derive(Parser, Debug)]
#[command(name = "todosync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the config file (defaults to ./.todosync.toml)
    #[arg(long, global = true, env = "TODOSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Host user id; presence of a host user enables host identity
    #[arg(long, global = true, env = "TODOSYNC_HOST_USER_ID")]
    pub host_user_id: Option<i64>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the task list and active count
    List,

    /// Add a task
    Add {
        /// Task text (words are joined with spaces)
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Toggle completion of a task
    Toggle {
        /// Task id
        id: i64,
    },

    /// Delete a task
    Rm {
        /// Task id
        id: i64,
    },

    /// Delete all completed tasks
    Clear,

    /// Show the resolved identity and storage backend
    Whoami,

    /// Interactive session reading commands from stdin
    Shell,

    /// Run the remote todo API server
    Serve {
        /// Interface to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to bind
        #[arg(long, env = "PORT")]
        port: Option<u16>,
    },
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let config = Config::discover(self.config.as_deref())?;
        let options = OutputOptions {
            json: self.json,
            quiet: self.quiet,
        };
        let context = Context {
            config,
            host_user_id: self.host_user_id,
            options,
        };

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::OperationFailed(format!("failed to start runtime: {e}")))?;

        runtime.block_on(async move {
            match self.command {
                Commands::List => tasks::run_list(&context).await,
                Commands::Add { text } => tasks::run_add(&context, text.join(" ")).await,
                Commands::Toggle { id } => tasks::run_toggle(&context, id).await,
                Commands::Rm { id } => tasks::run_rm(&context, id).await,
                Commands::Clear => tasks::run_clear(&context).await,
                Commands::Whoami => whoami::run(&context).await,
                Commands::Shell => shell::run(&context).await,
                Commands::Serve { host, port } => {
                    serve::run(
                        &context,
                        serve::ServeOptions { host, port },
                    )
                    .await
                }
            }
        })
    }
}

/// Per-invocation settings shared by the subcommands.
pub(crate) struct Context {
    pub config: Config,
    pub host_user_id: Option<i64>,
    pub options: OutputOptions,
}

impl Context {
    pub fn host(&self) -> Arc<dyn HostEnvironment> {
        host::detect(&self.config.host, self.host_user_id)
    }

    /// Build a session over the backend selected for this invocation.
    pub fn session<R: Renderer>(&self, renderer: R) -> Result<Session<R>> {
        let host = self.host();
        let storage = storage::select_backend(&self.config.storage, host.as_ref())?;
        Ok(Session::new(host, storage, renderer))
    }
}

/// Warning for guest identities on backends that key data by identity.
pub(crate) fn guest_warning(identity: &UserIdentity, backend: BackendKind) -> Option<String> {
    if identity.is_guest() && backend.is_identity_scoped() {
        Some(format!(
            "guest identity {identity}: tasks saved to the {backend} backend will not be found by later sessions"
        ))
    } else {
        None
    }
}
