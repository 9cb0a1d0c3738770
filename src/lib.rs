//! todosync - personal task list with pluggable persistence
//!
//! This library provides the core functionality for the todosync CLI and
//! its remote todo server.
//!
//! # Core Concepts
//!
//! - **Tasks**: short text items with a completion flag, in insertion order
//! - **Identity**: per-user key from the host, or a per-session guest id
//! - **Backends**: device store, remote HTTP API, or host cloud storage
//! - **Sessions**: own the task list and sequence identity, load and saves
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `.todosync.toml`
//! - `error`: Error types and result aliases
//! - `task`: Task list model and mutations
//! - `plural`: Counter wording for the active-task line
//! - `host`: Host environment capabilities (user, cloud storage)
//! - `identity`: User identity resolution
//! - `storage`: Storage backends and backend selection
//! - `sync`: Session orchestration and save coalescing
//! - `api`: Wire types for the remote todo API
//! - `server`: The remote todo API server
//! - `lock`: File locking and atomic writes for on-disk stores
//! - `output`: Human and JSON output

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod identity;
pub mod lock;
pub mod output;
pub mod plural;
pub mod server;
pub mod storage;
pub mod sync;
pub mod task;

pub use error::{Error, Result};
