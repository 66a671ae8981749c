use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, timeout};

use crate::constants::READER_GRACE_MS;
use crate::core::{
    domain::{ExecutionLimits, RunDirectory},
    traits::runner::{RunError, RunResult, Runner},
};

/// Environment overlay applied to every child on top of the inherited one.
const CHILD_ENV: &[(&str, &str)] = &[("MPLBACKEND", "Agg"), ("PYTHONUNBUFFERED", "1")];

/// Runs code through an interpreter (`<program> <args...> <code>`), one
/// process group per run.
#[derive(Clone, Debug)]
pub struct ProcessRunner {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ProcessRunner {
    pub fn new<T, I, S>(program: T, args: I) -> Self
    where
        T: AsRef<Path>,
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        ProcessRunner {
            program: program.as_ref().into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn python<T: AsRef<Path>>(python_path: T) -> Self {
        Self::new(python_path, ["-c"])
    }

    fn command(&self, code: &str, workdir: &RunDirectory) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(code)
            .current_dir(&workdir.path)
            .envs(CHILD_ENV.iter().copied())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);
        cmd
    }
}

#[async_trait::async_trait]
impl Runner for ProcessRunner {
    #[tracing::instrument(skip(self, code), fields(program = %self.program.display()))]
    async fn run(
        &self,
        code: &str,
        workdir: &RunDirectory,
        limits: &ExecutionLimits,
    ) -> Result<RunResult, RunError> {
        let start_time = Instant::now();

        let mut child = self
            .command(code, workdir)
            .spawn()
            .map_err(|e| RunError::FailedToLaunch {
                msg: format!("Failed to spawn {}: {}", self.program.display(), e),
            })?;
        // Captured now: id() is gone once the child is reaped, but the group
        // outlives it while any member is still running.
        let pgid = child.id();

        let (stdout_task, mut stdout_rx) = forward(child.stdout.take());
        let (stderr_task, mut stderr_rx) = forward(child.stderr.take());
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        // The deadline covers the child and EOF on both pipes, so a
        // background grandchild holding stdout open counts as still running.
        let finished = timeout(limits.timeout, async {
            let (status, _, _) = tokio::join!(
                child.wait(),
                collect_into(&mut stdout_rx, &mut stdout),
                collect_into(&mut stderr_rx, &mut stderr),
            );
            status
        })
        .await;

        match finished {
            Ok(Ok(status)) => Ok(RunResult {
                status: exit_code(status),
                stdout: String::from_utf8_lossy(&stdout).into_owned(),
                stderr: String::from_utf8_lossy(&stderr).into_owned(),
                execution_time_ms: start_time.elapsed().as_millis() as u64,
            }),
            Ok(Err(e)) => {
                kill_process_group(&mut child, pgid).await;
                Err(RunError::FailedToLaunch {
                    msg: format!("Failed to wait for process: {}", e),
                })
            }
            Err(_) => {
                tracing::warn!("Execution exceeded {:?}, killing process group", limits.timeout);
                kill_process_group(&mut child, pgid).await;

                let grace = Duration::from_millis(READER_GRACE_MS);
                let readers_done = timeout(grace, async {
                    tokio::join!(
                        collect_into(&mut stdout_rx, &mut stdout),
                        collect_into(&mut stderr_rx, &mut stderr),
                    )
                })
                .await;
                if readers_done.is_err() {
                    tracing::warn!("Output pipes still open after kill, dropping readers");
                    stdout_task.abort();
                    stderr_task.abort();
                    drain_into(&mut stdout_rx, &mut stdout);
                    drain_into(&mut stderr_rx, &mut stderr);
                }

                Err(RunError::TimedOut {
                    result: RunResult {
                        status: -1,
                        stdout: String::from_utf8_lossy(&stdout).into_owned(),
                        stderr: String::from_utf8_lossy(&stderr).into_owned(),
                        execution_time_ms: start_time.elapsed().as_millis() as u64,
                    },
                    limit: limits.timeout,
                })
            }
        }
    }
}

/// Copies a pipe into a channel chunk by chunk. Chunks already sent stay
/// readable after the reader task is aborted.
fn forward<R>(pipe: Option<R>) -> (JoinHandle<()>, UnboundedReceiver<Vec<u8>>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = unbounded_channel();
    let task = tokio::spawn(async move {
        let Some(mut pipe) = pipe else {
            return;
        };
        let mut buf = vec![0u8; 8192];
        loop {
            match pipe.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!("Pipe read failed: {}", e);
                    break;
                }
            }
        }
    });
    (task, rx)
}

async fn collect_into(rx: &mut UnboundedReceiver<Vec<u8>>, buf: &mut Vec<u8>) {
    while let Some(chunk) = rx.recv().await {
        buf.extend_from_slice(&chunk);
    }
}

fn drain_into(rx: &mut UnboundedReceiver<Vec<u8>>, buf: &mut Vec<u8>) {
    while let Ok(chunk) = rx.try_recv() {
        buf.extend_from_slice(&chunk);
    }
}

/// Signal deaths map to `128 + signo`, as shells report them.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

/// Kills the child and every process left in its group. The child leads
/// its group, so its pid is the pgid.
async fn kill_process_group(child: &mut Child, pgid: Option<u32>) {
    #[cfg(unix)]
    {
        if let Some(pgid) = pgid {
            // SAFETY: killpg has no memory-safety preconditions.
            unsafe {
                libc::killpg(pgid as libc::pid_t, libc::SIGKILL);
            }
        }
    }
    let _ = child.kill().await;
}
