//! Reserved execution-history store
//!
//! The `execution_cache` table is created at startup and carried for a
//! future scheduled-execution feature. Nothing in the query-time path
//! reads or writes it.

use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::debug;

const DB_FILE: &str = "scout_cache.db";

/// Ensure the history database and its table exist under `cache_dir`.
pub fn ensure_history_db(cache_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(cache_dir)
        .with_context(|| format!("failed to create cache directory {}", cache_dir.display()))?;

    let db_path = cache_dir.join(DB_FILE);
    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open history database {}", db_path.display()))?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS execution_cache (
            job_id TEXT PRIMARY KEY,
            script_name TEXT,
            args TEXT,
            console_out TEXT,
            error_out TEXT,
            execution_time TEXT,
            duration TEXT,
            script_hash TEXT,
            from_cache TEXT,
            status TEXT
        )",
    )
    .context("failed to create execution_cache table")?;

    debug!(path = %db_path.display(), "history database ready");
    Ok(())
}
