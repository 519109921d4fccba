//! Scout configuration loading
//!
//! The config is a JSON file with a top-level `"scout"` object, discovered
//! at the host-provided path or, failing that, `scout.conf` in the same
//! directory. Loaded once at startup and immutable afterward.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ScoutError;

const CACHE_DIR_NAME: &str = "scout_cache";
const DEFAULT_CACHE_WINDOW_SECONDS: u64 = 3600;
const DEFAULT_EXEC_TIMEOUT_SECONDS: u64 = 60;

/// Process-wide configuration, threaded through constructors rather than
/// held in a global.
#[derive(Debug, Clone)]
pub struct ScoutConfig {
    /// Base URL of the content server, trailing slashes stripped
    pub server_url: String,
    /// PEM-encoded SubjectPublicKeyInfo wrapping an RSA key
    pub public_key: String,
    /// Maximum age a cached entry may reach before the server must be
    /// consulted for its current hash. Zero means always stale.
    pub cache_window: Duration,
    /// Default wall-clock deadline for script execution
    pub exec_timeout: Duration,
    /// Where cache artifacts live
    pub cache_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ScoutSection {
    script_server_url: String,
    public_key: String,
    #[serde(default = "default_cache_window")]
    cache_window_seconds: u64,
    #[serde(default = "default_exec_timeout")]
    exec_timeout_seconds: u64,
    #[serde(default)]
    cache_dir: Option<String>,
}

fn default_cache_window() -> u64 {
    DEFAULT_CACHE_WINDOW_SECONDS
}

fn default_exec_timeout() -> u64 {
    DEFAULT_EXEC_TIMEOUT_SECONDS
}

impl ScoutConfig {
    /// Load configuration from `path`, falling back to `scout.conf` next to
    /// it when the file is unreadable or carries no `scout` section.
    pub fn load(path: &Path) -> Result<Self, ScoutError> {
        let section = read_scout_section(path)?;

        let cache_dir = match section.cache_dir {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(CACHE_DIR_NAME),
        };

        let config = ScoutConfig {
            server_url: section.script_server_url.trim_end_matches('/').to_string(),
            public_key: section.public_key,
            cache_window: Duration::from_secs(section.cache_window_seconds),
            exec_timeout: Duration::from_secs(section.exec_timeout_seconds),
            cache_dir,
        };

        info!(
            server_url = %config.server_url,
            cache_dir = %config.cache_dir.display(),
            "loaded scout configuration"
        );

        Ok(config)
    }
}

fn read_scout_section(path: &Path) -> Result<ScoutSection, ScoutError> {
    match read_section_from_file(path) {
        Ok(section) => Ok(section),
        Err(err) => {
            // The host's own config may be unreadable or may simply not
            // carry a scout section; a sibling scout.conf covers both.
            let sibling = path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join("scout.conf");
            debug!(
                "config at {} unusable ({}), trying {}",
                path.display(),
                err,
                sibling.display()
            );
            read_section_from_file(&sibling).map_err(|_| err)
        }
    }
}

fn read_section_from_file(path: &Path) -> Result<ScoutSection, ScoutError> {
    let data = std::fs::read_to_string(path).map_err(|source| ScoutError::ConfigMissing {
        path: path.to_path_buf(),
        source,
    })?;

    let root: serde_json::Value = serde_json::from_str(&data)
        .map_err(|e| ScoutError::ConfigParse(format!("{}: {e}", path.display())))?;

    let section = root
        .get("scout")
        .cloned()
        .ok_or_else(|| ScoutError::ConfigParse(format!("no 'scout' section in {}", path.display())))?;

    serde_json::from_value(section)
        .map_err(|e| ScoutError::ConfigParse(format!("{}: {e}", path.display())))
}
