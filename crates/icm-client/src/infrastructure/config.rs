//! TOML-based configuration for the ICM client.
//!
//! The config file is optional.  When present it lives at
//! `$XDG_CONFIG_HOME/icm/client.toml` (or `~/.config/icm/client.toml`):
//!
//! ```toml
//! socket_path = "/run/user/1000/icm.sock"
//! log_level = "debug"
//! ```
//!
//! # Where does the socket live? (for beginners)
//!
//! The compositor listens on a Unix domain socket, which is a file on disk
//! that two processes use to talk to each other.  The client looks for it in
//! this order:
//!
//! 1. `socket_path` from the config, if set;
//! 2. `$XDG_RUNTIME_DIR/icm.sock` (the per-user runtime directory that login
//!    sessions create, usually `/run/user/<uid>`);
//! 3. `/tmp/icm.sock`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name of the compositor socket inside the runtime directory.
pub const SOCKET_FILE_NAME: &str = "icm.sock";

/// Socket used when no runtime directory is available.
pub const FALLBACK_SOCKET_PATH: &str = "/tmp/icm.sock";

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Config schema ─────────────────────────────────────────────────────────────

/// Client settings.  Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// Explicit compositor socket; overrides the runtime-directory lookup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket_path: Option<PathBuf>,
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            socket_path: None,
            log_level: default_log_level(),
        }
    }
}

impl ClientConfig {
    /// Config pointing at an explicit socket, everything else default.
    pub fn with_socket_path(path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: Some(path.into()),
            ..Self::default()
        }
    }

    /// The socket this config connects to, given the current environment.
    pub fn resolved_socket_path(&self) -> PathBuf {
        resolve_socket_path(
            self.socket_path.as_deref(),
            std::env::var_os("XDG_RUNTIME_DIR"),
        )
    }
}

// ── Path resolution ───────────────────────────────────────────────────────────

/// Picks the compositor socket: explicit path, then the runtime directory,
/// then [`FALLBACK_SOCKET_PATH`].  An empty runtime directory counts as unset.
pub fn resolve_socket_path(explicit: Option<&Path>, runtime_dir: Option<OsString>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match runtime_dir {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir).join(SOCKET_FILE_NAME),
        _ => PathBuf::from(FALLBACK_SOCKET_PATH),
    }
}

/// Resolves the config file path, or `None` when neither `XDG_CONFIG_HOME`
/// nor `HOME` is set.
pub fn config_file_path() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
    Some(base.join("icm").join("client.toml"))
}

/// Loads the config from the default location, falling back to defaults.
///
/// # Errors
///
/// See [`load_config_from`].
pub fn load_config() -> Result<ClientConfig, ConfigError> {
    match config_file_path() {
        Some(path) => load_config_from(&path),
        None => Ok(ClientConfig::default()),
    }
}

/// Loads `ClientConfig` from `path`, returning `ClientConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<ClientConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ClientConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
