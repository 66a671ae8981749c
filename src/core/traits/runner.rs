use std::time::Duration;

use crate::constants::{RUNNER_FAILURE_EXIT_CODE, TIMEOUT_EXIT_CODE};
use crate::core::domain::{ExecutionLimits, RunDirectory, RunState};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunResult {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
    pub execution_time_ms: u64,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum RunError {
    #[error("execution exceeded {}s", limit.as_secs())]
    TimedOut { result: RunResult, limit: Duration },
    #[error("{msg}")]
    FailedToLaunch { msg: String },
}

#[mockall::automock]
#[async_trait::async_trait]
pub trait Runner: std::fmt::Debug + Send + Sync {
    /// Runs `code` with `workdir` as the working directory. Blocks until the
    /// child exits or `limits.timeout` elapses.
    async fn run(
        &self,
        code: &str,
        workdir: &RunDirectory,
        limits: &ExecutionLimits,
    ) -> Result<RunResult, RunError>;
}

/// Stdout, stderr and exit status of a finished run, with runner-level
/// conditions folded into sentinel exit codes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    pub stdout: String,
    pub stderr: String,
    pub returncode: i32,
    pub execution_time_ms: u64,
    pub state: RunState,
}

impl From<Result<RunResult, RunError>> for RunReport {
    fn from(result: Result<RunResult, RunError>) -> Self {
        match result {
            Ok(result) => RunReport {
                stdout: result.stdout,
                stderr: result.stderr,
                returncode: result.status,
                execution_time_ms: result.execution_time_ms,
                state: RunState::Completed,
            },
            Err(RunError::TimedOut { result, limit }) => RunReport {
                stdout: result.stdout,
                stderr: format!(
                    "{}\n[timeout] Execution exceeded {}s",
                    result.stderr,
                    limit.as_secs()
                ),
                returncode: TIMEOUT_EXIT_CODE,
                execution_time_ms: result.execution_time_ms,
                state: RunState::TimedOut,
            },
            Err(RunError::FailedToLaunch { msg }) => RunReport {
                stdout: String::new(),
                stderr: format!("[runner error] {}", msg),
                returncode: RUNNER_FAILURE_EXIT_CODE,
                execution_time_ms: 0,
                state: RunState::SetupFailed,
            },
        }
    }
}
