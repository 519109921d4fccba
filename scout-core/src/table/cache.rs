//! The `scout_cache` table
//!
//! Read-only view over the cache directory. No constraints are honored.

use std::sync::Arc;

use anyhow::Result;

use crate::config::ScoutConfig;
use crate::inspect;
use crate::project::Row;

use super::QueryContext;

pub struct ScoutCacheTable {
    config: Arc<ScoutConfig>,
}

impl ScoutCacheTable {
    pub fn new(config: Arc<ScoutConfig>) -> Self {
        ScoutCacheTable { config }
    }

    pub fn generate(&self, _context: &QueryContext) -> Result<Vec<Row>> {
        inspect::enumerate(&self.config.cache_dir)
    }
}
