//! Running saved scripts under a wall-clock timeout

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{info, trace, warn};

use crate::config::FunctionConfig;
use crate::metrics::{SCRIPT_EXECUTIONS_TOTAL, SCRIPT_EXECUTION_DURATION};

/// stderr text reported when a script runs past its timeout
pub const TIMEOUT_MESSAGE: &str = "Execution timed out";

/// Most of a script that is ever copied into the logs
const LOG_PREVIEW_BYTES: u64 = 2048;

/// How scripts are launched
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    /// Interpreter binary, e.g. "python3"
    pub interpreter: String,
    pub timeout: Duration,
}

impl ExecutionConfig {
    pub fn from_config(config: &FunctionConfig) -> Self {
        Self {
            interpreter: config.interpreter.clone(),
            timeout: config.execution_timeout(),
        }
    }
}

/// Outcome of one script run
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub return_code: i32,
    pub success: bool,
}

impl ExecutionResult {
    fn failed(stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            return_code: -1,
            success: false,
        }
    }
}

/// Run the script at `path` and capture its output
///
/// Never fails: a timeout or a launch error comes back as a result with
/// `return_code == -1` and the reason in `stderr`. On timeout the child is
/// killed.
pub async fn execute_generated_code(path: &Path, config: &ExecutionConfig) -> ExecutionResult {
    let start = Instant::now();

    // Scripts embed the device auth token, so they only reach trace output
    if tracing::enabled!(tracing::Level::TRACE) {
        if let Some(preview) = preview(path).await {
            trace!(path = %path.display(), code = %preview, "Executing script");
        }
    }

    let mut cmd = Command::new(&config.interpreter);
    cmd.arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    // Let the script import siblings from its own directory
    if let Some(dir) = path.parent() {
        cmd.env("PYTHONPATH", dir);
    }

    let (result, outcome) = match timeout(config.timeout, cmd.output()).await {
        Ok(Ok(output)) => {
            let return_code = output.status.code().unwrap_or(-1);
            let result = ExecutionResult {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                return_code,
                success: return_code == 0,
            };
            let outcome = if result.success { "success" } else { "failure" };
            (result, outcome)
        }
        Ok(Err(e)) => {
            warn!(interpreter = %config.interpreter, error = %e, "Error executing code");
            (ExecutionResult::failed(e.to_string()), "launch_error")
        }
        Err(_) => {
            warn!(timeout = ?config.timeout, "Code execution timed out");
            (ExecutionResult::failed(TIMEOUT_MESSAGE), "timeout")
        }
    };

    let elapsed = start.elapsed();
    SCRIPT_EXECUTIONS_TOTAL.with_label_values(&[outcome]).inc();
    SCRIPT_EXECUTION_DURATION
        .with_label_values(&[outcome])
        .observe(elapsed.as_secs_f64());

    info!(
        return_code = result.return_code,
        duration_ms = elapsed.as_secs_f64() * 1000.0,
        outcome,
        "Code execution completed"
    );
    result
}

/// The first `LOG_PREVIEW_BYTES` of the script, read without blocking
async fn preview(path: &Path) -> Option<String> {
    let file = tokio::fs::File::open(path).await.ok()?;
    let mut head = Vec::new();
    file.take(LOG_PREVIEW_BYTES)
        .read_to_end(&mut head)
        .await
        .ok()?;
    Some(String::from_utf8_lossy(&head).into_owned())
}
