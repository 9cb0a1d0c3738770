//! Configuration loading and management
//!
//! Handles parsing of `.todosync.toml` configuration files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// File name looked up in the working directory when no path is given.
pub const CONFIG_FILENAME: &str = ".todosync.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Persistence configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Host environment configuration
    #[serde(default)]
    pub host: HostConfig,

    /// Remote server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

/// Backend selection policy, evaluated once per session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoragePolicy {
    /// Host cloud storage when the host provides it, device storage otherwise.
    #[default]
    Capability,
    /// Always the remote HTTP API.
    Remote,
}

/// Storage-related configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend selection policy
    #[serde(default)]
    pub policy: StoragePolicy,

    /// Directory of the device key-value store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_dir: Option<PathBuf>,

    /// Base URL of the remote todo API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,

    /// Request timeout for the remote API, unset means no timeout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_timeout_ms: Option<u64>,
}

impl StorageConfig {
    /// Device store directory, defaulting to the platform data directory.
    pub fn local_dir(&self) -> PathBuf {
        if let Some(dir) = &self.local_dir {
            return dir.clone();
        }
        directories::ProjectDirs::from("", "", "todosync")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".todosync"))
    }

    fn validate(&self) -> Result<()> {
        if let Some(url) = &self.remote_url {
            validate_url(url, "storage.remote_url")?;
        }
        if self.policy == StoragePolicy::Remote && self.remote_url.is_none() {
            return Err(Error::InvalidConfig(
                "storage.remote_url is required when storage.policy = \"remote\"".to_string(),
            ));
        }
        if self.remote_timeout_ms == Some(0) {
            return Err(Error::InvalidConfig(
                "storage.remote_timeout_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Host environment configuration
///
/// A host is considered present only when a user id is set here or passed on
/// the command line. `cloud_dir` is ignored without one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostConfig {
    /// Numeric id of the host user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,

    /// Directory backing the host cloud-storage facility
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_dir: Option<PathBuf>,
}

impl HostConfig {
    fn validate(&self) -> Result<()> {
        if self
            .cloud_dir
            .as_ref()
            .is_some_and(|dir| dir.as_os_str().is_empty())
        {
            return Err(Error::InvalidConfig(
                "host.cloud_dir cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Remote server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_server_host")]
    pub host: String,

    /// Port to bind
    #[serde(default = "default_server_port")]
    pub port: u16,
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

impl ServerConfig {
    fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "server.host cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn validate_url(url: &str, field: &str) -> Result<()> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidConfig(format!("{field} cannot be empty")));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(Error::InvalidConfig(format!(
            "{field}: expected an http:// or https:// URL, got '{trimmed}'"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from a `.todosync.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `.todosync.toml` from `dir`, or return defaults when it is absent
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILENAME);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve the configuration for a CLI invocation: an explicit path must
    /// exist, otherwise the working directory is searched.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
                Self::load_from_dir(&cwd)
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.storage.validate()?;
        self.host.validate()?;
        self.server.validate()?;
        Ok(())
    }
}
