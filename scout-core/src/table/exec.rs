//! The `scout_exec` table
//!
//! One `generate` call resolves exactly one script, executes it under the
//! configured deadline, and projects its output into rows. Constraints
//! recognized: `script_name` (required, exactly one), `args` (zero or
//! more, joined in order), `from_cache` (optional boolean).

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::config::ScoutConfig;
use crate::error::ScoutError;
use crate::exec;
use crate::project::{project_rows, Row};
use crate::resolver::Resolver;

use super::{bool_constraint, QueryContext};

pub struct ScoutExecTable {
    config: Arc<ScoutConfig>,
    resolver: Resolver,
}

impl ScoutExecTable {
    pub fn new(config: Arc<ScoutConfig>) -> Result<Self, ScoutError> {
        let resolver = Resolver::new(config.clone())?;
        Ok(ScoutExecTable { config, resolver })
    }

    pub async fn generate(&self, context: &QueryContext) -> Result<Vec<Row>> {
        let names = context.equality("script_name");
        if names.is_empty() {
            bail!("no script specified in the query");
        }
        if names.len() > 1 {
            bail!("only one script can be executed at a time");
        }
        let script_name = &names[0];

        let args = context.equality("args").join(" ");
        let use_cache = context
            .equality("from_cache")
            .first()
            .map(|value| bool_constraint(value))
            .unwrap_or(false);

        let script = self
            .resolver
            .get(script_name, use_cache)
            .await
            .context("failed to get script")?;

        info!(script_name = %script_name, args = %args, "executing script");
        let result = exec::execute(&script, &args, self.config.exec_timeout.as_secs())
            .await
            .context("failed to execute script")?;

        Ok(project_rows(&result))
    }
}
