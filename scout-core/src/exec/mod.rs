//! Bounded script execution
//!
//! The verified script is materialized to a temporary file (removed on
//! every exit path), handed to the interpreter selected for its kind on
//! this host, and run under a wall-clock deadline. Stdout and stderr are
//! drained concurrently with the wait so a child that fills a pipe buffer
//! cannot deadlock.

pub mod args;
pub mod kind;

use std::io::Write;
use std::process::Stdio;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::ScoutError;
use crate::platform::HostOs;
use crate::script::Script;

use self::kind::ScriptKind;

const JOB_ID_QUICK_EXEC: &str = "quick_exec";
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const TIMEOUT_MARKER: &str = "script execution timed out";

/// Terminal state of one execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Timeout,
}

impl ExecStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ExecStatus::Pending => "pending",
            ExecStatus::Running => "running",
            ExecStatus::Completed => "completed",
            ExecStatus::Failed => "failed",
            ExecStatus::Timeout => "timeout",
        }
    }
}

/// Captured outcome of one execution, consumed by the row projector.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub job_id: String,
    pub script_name: String,
    /// The raw argument string as the operator supplied it
    pub args: String,
    pub console_out: String,
    pub error_out: String,
    /// Start timestamp, RFC 3339
    pub execution_time: String,
    /// Human-readable elapsed time
    pub duration: String,
    pub script_hash: String,
    pub from_cache: bool,
    pub status: ExecStatus,
}

/// Run `script` with `args` under a wall-clock deadline of `timeout_s`
/// seconds (30 when zero).
///
/// Timeout is a terminal status, not an error: the child is killed and a
/// result with `status == Timeout` is returned. Errors are reserved for
/// cases where no child ran at all (unsupported kind or host, spawn
/// failure).
pub async fn execute(
    script: &Script,
    args: &str,
    timeout_s: u64,
) -> Result<ExecutionResult, ScoutError> {
    let script_kind = ScriptKind::classify(&script.name);
    let invocation = kind::invocation(HostOs::current(), script_kind, &script.name)?;

    // The temp file keeps the kind's canonical extension so interpreters
    // that sniff suffixes behave. NamedTempFile removes it on drop.
    let mut tmp = tempfile::Builder::new()
        .prefix("remote_script_")
        .suffix(script_kind.extension())
        .tempfile()?;
    tmp.as_file_mut().write_all(&script.contents)?;
    tmp.as_file_mut().flush()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(tmp.path(), std::fs::Permissions::from_mode(0o700))?;
    }

    let argv = args::parse_args(args);
    debug!(
        name = %script.name,
        program = invocation.program,
        ?argv,
        "executing script"
    );

    let mut result = ExecutionResult {
        job_id: JOB_ID_QUICK_EXEC.to_string(),
        script_name: script.name.clone(),
        args: args.to_string(),
        console_out: String::new(),
        error_out: String::new(),
        execution_time: String::new(),
        duration: String::new(),
        script_hash: script.hash.clone(),
        from_cache: script.from_cache,
        status: ExecStatus::Running,
    };

    let timeout = if timeout_s == 0 {
        DEFAULT_TIMEOUT_SECONDS
    } else {
        timeout_s
    };

    let mut command = Command::new(invocation.program);
    command
        .args(invocation.pre_args)
        .arg(tmp.path())
        .args(&argv)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    // The child leads its own process group so the deadline path can
    // signal everything it spawned, not just the interpreter.
    #[cfg(unix)]
    command.process_group(0);

    let mut child = command.spawn().map_err(ScoutError::SpawnFailed)?;

    let stdout_task = child.stdout.take().map(read_pipe);
    let stderr_task = child.stderr.take().map(read_pipe);

    let started_at = Utc::now();
    let started = Instant::now();

    match tokio::time::timeout(Duration::from_secs(timeout), child.wait()).await {
        Err(_elapsed) => {
            warn!(name = %script.name, timeout, "execution deadline expired, killing child");
            kill_tree(&mut child).await;
            result.status = ExecStatus::Timeout;
            result.error_out = TIMEOUT_MARKER.to_string();
        }
        Ok(Err(err)) => return Err(ScoutError::Io(err)),
        Ok(Ok(exit)) => {
            result.console_out = drain(stdout_task).await;
            result.error_out = drain(stderr_task).await;
            if exit.success() {
                result.status = ExecStatus::Completed;
            } else {
                result.status = ExecStatus::Failed;
                result
                    .error_out
                    .push_str(&format!("\nscript execution failed: {exit}"));
            }
        }
    }

    result.execution_time = started_at.to_rfc3339();
    result.duration = format!("{:?}", started.elapsed());

    Ok(result)
}

#[cfg(unix)]
async fn kill_tree(child: &mut tokio::process::Child) {
    if let Some(pid) = child.id() {
        // process_group(0) made the child the leader of group `pid`
        unsafe {
            libc::kill(-(pid as i32), libc::SIGKILL);
        }
    }
    let _ = child.kill().await;
}

#[cfg(not(unix))]
async fn kill_tree(child: &mut tokio::process::Child) {
    let _ = child.kill().await;
}

fn read_pipe<R>(mut pipe: R) -> JoinHandle<Vec<u8>>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf).await;
        buf
    })
}

async fn drain(task: Option<JoinHandle<Vec<u8>>>) -> String {
    match task {
        Some(handle) => String::from_utf8_lossy(&handle.await.unwrap_or_default()).into_owned(),
        None => String::new(),
    }
}
