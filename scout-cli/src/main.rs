//! Scout — remote script execution for the endpoint agent
//!
//! Drives the two table surfaces from the command line: `exec` resolves,
//! verifies, and runs a named script and prints its projected rows as
//! JSON lines; `cache` prints the cached-script inventory.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use scout_core::table::{QueryContext, ScoutCacheTable, ScoutExecTable};
use scout_core::{history, ScoutConfig};

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "scout",
    about = "Fetch, verify, and execute scripts from a trusted content server",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Path to the scout config file
    #[clap(long, global = true)]
    scout_config: Option<PathBuf>,

    /// Set log level (RUST_LOG overrides)
    #[clap(long, default_value = "info", global = true)]
    log_level: LogLevel,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve and execute a script, printing one JSON row per line
    Exec {
        /// Script name as served by the content server
        #[clap(long)]
        script: String,

        /// Argument to pass through (repeatable)
        #[clap(long)]
        args: Vec<String>,

        /// Accept a cached copy when it passes every gate
        #[clap(long)]
        use_cache: bool,
    },

    /// List the scripts currently held in the on-disk cache
    Cache,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.to_filter_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let Some(config_path) = cli.scout_config else {
        bail!("--scout-config is required");
    };
    let config = Arc::new(ScoutConfig::load(&config_path)?);

    std::fs::create_dir_all(&config.cache_dir).with_context(|| {
        format!(
            "failed to create cache directory {}",
            config.cache_dir.display()
        )
    })?;
    history::ensure_history_db(&config.cache_dir)?;

    match cli.command {
        Command::Exec {
            script,
            args,
            use_cache,
        } => {
            let mut context = QueryContext::new();
            context.add_equality("script_name", &script);
            for arg in &args {
                context.add_equality("args", arg);
            }
            if use_cache {
                context.add_equality("from_cache", "true");
            }
            debug!(script = %script, ?args, use_cache, "running exec table");

            let table = ScoutExecTable::new(config)?;
            let rows = table.generate(&context).await?;
            for row in rows {
                println!("{}", serde_json::to_string(&row)?);
            }
        }
        Command::Cache => {
            let table = ScoutCacheTable::new(config);
            for row in table.generate(&QueryContext::new())? {
                println!("{}", serde_json::to_string(&row)?);
            }
        }
    }

    Ok(())
}
