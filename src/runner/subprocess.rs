//! `sh -c` spawning with a per-command timeout.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::error::RunnerError;

/// Exit code recorded when a command timed out or could not be spawned.
pub const EXIT_EXECUTION_FAILED: i32 = -1;

/// Exit code recorded when a command was rejected before execution.
pub const EXIT_MALFORMED: i32 = -2;

/// What happened when a command was handed to the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckExecution {
    /// The process ran to completion.
    ///
    /// Processes terminated by a signal report [`EXIT_EXECUTION_FAILED`].
    Completed { exit_code: i32, output: String },
    /// The process was killed after exceeding the timeout.
    TimedOut { timeout: Duration },
    /// The shell could not be started.
    SpawnFailed { message: String },
}

impl CheckExecution {
    /// Exit code to record for this execution.
    pub fn exit_code(&self) -> i32 {
        match self {
            CheckExecution::Completed { exit_code, .. } => *exit_code,
            CheckExecution::TimedOut { .. } | CheckExecution::SpawnFailed { .. } => {
                EXIT_EXECUTION_FAILED
            }
        }
    }

    /// Captured output, or the failure description when nothing ran.
    pub fn output(&self) -> String {
        match self {
            CheckExecution::Completed { output, .. } => output.clone(),
            _ => self.failure_message().unwrap_or_default(),
        }
    }

    /// Message describing why the command produced no usable result.
    pub fn failure_message(&self) -> Option<String> {
        match self {
            CheckExecution::Completed { .. } => None,
            CheckExecution::TimedOut { timeout } => Some(format!(
                "Command timed out after {}",
                format_timeout(*timeout)
            )),
            CheckExecution::SpawnFailed { message } => Some(message.clone()),
        }
    }
}

/// Whole seconds as `30s`, anything finer as `250ms`.
fn format_timeout(timeout: Duration) -> String {
    if timeout.subsec_millis() == 0 && timeout.as_secs() > 0 {
        format!("{}s", timeout.as_secs())
    } else {
        format!("{}ms", timeout.as_millis())
    }
}

/// Trait for executing verification commands.
///
/// This abstraction allows mocking the shell in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run `command` and report what happened. Never fails.
    async fn execute(&self, command: &str, timeout: Duration) -> CheckExecution;
}

/// Executor that runs commands through `sh -c` in a fixed directory.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    working_dir: PathBuf,
}

impl ShellExecutor {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }
}

#[async_trait]
impl CommandExecutor for ShellExecutor {
    async fn execute(&self, command: &str, timeout_duration: Duration) -> CheckExecution {
        debug!("Running check command: {}", command);

        // Dropping the output future on timeout drops the child, which kills it.
        let result = timeout(
            timeout_duration,
            Command::new("sh")
                .arg("-c")
                .arg(command)
                .current_dir(&self.working_dir)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output(),
        )
        .await;

        match result {
            Err(_) => {
                debug!("Check command timed out after {:?}: {}", timeout_duration, command);
                CheckExecution::TimedOut {
                    timeout: timeout_duration,
                }
            }
            Ok(Err(e)) => CheckExecution::SpawnFailed {
                message: format!("Failed to spawn shell: {}", e),
            },
            Ok(Ok(output)) => {
                let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
                combined.push_str(&String::from_utf8_lossy(&output.stderr));
                CheckExecution::Completed {
                    exit_code: output.status.code().unwrap_or(EXIT_EXECUTION_FAILED),
                    output: combined,
                }
            }
        }
    }
}

/// Check that a POSIX shell is available to run checks.
///
/// Uses the `which` crate for cross-platform executable detection.
pub fn check_shell_available() -> Result<(), RunnerError> {
    which::which("sh").map_err(|_| RunnerError::ShellNotInstalled)?;
    Ok(())
}
