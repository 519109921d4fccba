//! On-disk script cache
//!
//! Each entry is a triple of co-located artifacts keyed by the hex SHA-256
//! of the full script URL: the raw payload (`K.script`), a JSON metadata
//! record (`K.script.meta`), and the detached signature received at fetch
//! time (`K.script.sig`). The three are present together or treated as
//! absent together; any inconsistency is a miss and triggers a re-fetch.
//!
//! The store owns its mutex. Every public operation acquires it, and
//! `save` performs its remove-then-write sequence under a single
//! acquisition so a concurrent reader never observes a partial entry.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::ScoutError;
use crate::script::Script;

/// Metadata record stored beside each cached payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMeta {
    /// Hex SHA-256 of the payload at save time
    pub script_hash: String,
    /// Carried for reporting; the cache key derives from the URL only
    pub script_name: String,
    /// Wall clock at save, RFC 3339
    pub cache_time: DateTime<Utc>,
}

/// Derive the cache key for a full script URL.
pub fn cache_key(url: &str) -> String {
    hex::encode(Sha256::digest(url.as_bytes()))
}

/// Durable mapping from URL-derived keys to `(payload, metadata, signature)`
/// triples.
#[derive(Debug)]
pub struct CacheStore {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        CacheStore {
            dir: dir.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn payload_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.script"))
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.script.meta"))
    }

    fn signature_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.script.sig"))
    }

    /// Load the payload and metadata for `key`.
    ///
    /// Does not verify the signature and does not recompute the hash;
    /// callers recompute before trusting the bytes.
    pub fn load(&self, key: &str) -> Result<(Vec<u8>, CacheMeta), ScoutError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        let payload = std::fs::read(self.payload_path(key)).map_err(ScoutError::CacheMiss)?;
        let meta_raw = std::fs::read(self.meta_path(key)).map_err(ScoutError::CacheMiss)?;
        let meta: CacheMeta = serde_json::from_slice(&meta_raw)
            .map_err(|e| ScoutError::CacheCorrupt(format!("malformed metadata: {e}")))?;

        Ok((payload, meta))
    }

    /// Load the detached signature for `key`.
    pub fn load_signature(&self, key: &str) -> Result<Vec<u8>, ScoutError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        std::fs::read(self.signature_path(key)).map_err(ScoutError::CacheMiss)
    }

    /// Replace the entry for `key` with `script` and its signature.
    ///
    /// Any pre-existing artifacts are removed first; repeated saves with
    /// different content replace, never coexist.
    pub fn save(&self, key: &str, script: &Script, signature: &[u8]) -> Result<(), ScoutError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        if !self.dir.exists() {
            create_dir_0755(&self.dir)?;
        }

        self.remove_locked(key);

        write_restricted(&self.payload_path(key), &script.contents)?;

        let meta = CacheMeta {
            script_hash: script.hash.clone(),
            script_name: script.name.clone(),
            cache_time: Utc::now(),
        };
        let meta_raw = serde_json::to_vec(&meta)
            .map_err(|e| ScoutError::CacheCorrupt(format!("failed to encode metadata: {e}")))?;
        write_restricted(&self.meta_path(key), &meta_raw)?;

        write_restricted(&self.signature_path(key), signature)?;

        debug!(key, name = %script.name, "cached script");
        Ok(())
    }

    /// Best-effort removal of all three artifacts; missing files are fine.
    pub fn remove(&self, key: &str) {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.remove_locked(key);
    }

    fn remove_locked(&self, key: &str) {
        let _ = std::fs::remove_file(self.payload_path(key));
        let _ = std::fs::remove_file(self.meta_path(key));
        let _ = std::fs::remove_file(self.signature_path(key));
    }
}

fn create_dir_0755(dir: &Path) -> Result<(), ScoutError> {
    std::fs::create_dir_all(dir)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}

/// Write `data` readable and writable by the owner only.
fn write_restricted(path: &Path, data: &[u8]) -> Result<(), ScoutError> {
    std::fs::write(path, data)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}
