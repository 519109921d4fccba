//! Read-only cache enumeration
//!
//! Backs the host's "what's cached" table. Each metadata file in the
//! cache directory yields one row; the reported hash is recomputed from
//! the payload on disk, not taken from metadata. Unreadable entries are
//! skipped with a logged warning.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::cache::CacheMeta;
use crate::project::Row;

const META_SUFFIX: &str = ".meta";

/// Enumerate the cache directory into table rows.
pub fn enumerate(cache_dir: &Path) -> Result<Vec<Row>> {
    if !cache_dir.exists() {
        std::fs::create_dir_all(cache_dir)
            .with_context(|| format!("failed to create cache directory {}", cache_dir.display()))?;
    }

    let entries = std::fs::read_dir(cache_dir)
        .with_context(|| format!("failed to read cache directory {}", cache_dir.display()))?;

    let mut rows = Vec::new();

    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !file_name.ends_with(META_SUFFIX) {
            continue;
        }

        let meta: CacheMeta = match std::fs::read(&path)
            .map_err(anyhow::Error::from)
            .and_then(|raw| serde_json::from_slice(&raw).map_err(anyhow::Error::from))
        {
            Ok(meta) => meta,
            Err(err) => {
                warn!(path = %path.display(), %err, "skipping unreadable cache metadata");
                continue;
            }
        };

        // Sibling payload: the metadata path minus its ".meta" suffix.
        let payload_name = file_name.strip_suffix(META_SUFFIX).unwrap_or(file_name);
        let payload_path = cache_dir.join(payload_name);
        let hash = match std::fs::read(&payload_path) {
            Ok(payload) => hex::encode(Sha256::digest(&payload)),
            Err(err) => {
                warn!(path = %payload_path.display(), %err, "skipping cache entry without payload");
                continue;
            }
        };

        let last_updated = entry
            .metadata()
            .and_then(|m| m.modified())
            .map(|mtime| DateTime::<Utc>::from(mtime).to_rfc3339())
            .unwrap_or_default();

        let mut row = Row::new();
        row.insert("name".into(), meta.script_name);
        row.insert("description".into(), String::new());
        row.insert("hash".into(), hash);
        row.insert("last_updated".into(), last_updated);
        row.insert("cache".into(), "true".to_string());
        row.insert("path".into(), path.display().to_string());
        rows.push(row);
    }

    Ok(rows)
}
