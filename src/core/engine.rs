use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::constants::AUTOSAVE_NOTE;
use crate::core::{
    allocator::RunDirectoryAllocator,
    collector,
    domain::{ArtifactRecord, ExecutionLimits, ExecutionResult, RunDirectory, RunState},
    errors::SandboxError,
    shim,
    traits::runner::{RunReport, Runner},
};

#[derive(Clone, Debug)]
pub struct SandboxSettings {
    pub timeout: Duration,
    pub autosave: bool,
}

/// Allocate, wrap, run, collect. Safe to share between concurrent requests:
/// every call gets its own run directory and its own process group.
#[derive(Clone, Debug)]
pub struct Sandbox {
    allocator: RunDirectoryAllocator,
    runner: Arc<dyn Runner>,
    settings: SandboxSettings,
}

impl Sandbox {
    pub fn new(
        artifact_root: impl AsRef<Path>,
        runner: Arc<dyn Runner>,
        settings: SandboxSettings,
    ) -> Self {
        Self {
            allocator: RunDirectoryAllocator::new(artifact_root),
            runner,
            settings,
        }
    }

    pub fn artifact_root(&self) -> &Path {
        self.allocator.root()
    }

    /// Only workspace setup can fail here. Timeouts, launch failures and
    /// non-zero exits are all reported inside the result.
    #[tracing::instrument(skip(self, code), fields(code_len = code.len()))]
    pub async fn execute(&self, code: &str) -> Result<ExecutionResult, SandboxError> {
        let workdir = self.allocator.allocate().await.inspect_err(|e| {
            tracing::error!("Workspace setup failed: {}", e);
        })?;
        tracing::debug!("Run {}: {:?}", workdir.id, RunState::Pending);

        let wrapped = shim::wrap(code, self.settings.autosave);
        let limits = ExecutionLimits {
            timeout: self.settings.timeout,
        };

        tracing::debug!("Run {}: {:?}", workdir.id, RunState::Running);
        let report: RunReport = self.runner.run(&wrapped, &workdir, &limits).await.into();
        debug_assert!(report.state.is_terminal());
        tracing::debug!(
            "Run {}: {:?}, returncode={}, took {}ms",
            workdir.id,
            report.state,
            report.returncode,
            report.execution_time_ms
        );

        let mut artifacts = self.collect(&workdir).await;
        if self.settings.autosave {
            annotate_autosaved(&mut artifacts, &workdir.id);
        }

        tracing::info!(
            "Run {} finished with {} artifact(s)",
            workdir.id,
            artifacts.len()
        );

        Ok(ExecutionResult {
            stdout: report.stdout,
            stderr: report.stderr,
            returncode: report.returncode,
            artifacts,
            state: report.state,
        })
    }

    async fn collect(&self, workdir: &RunDirectory) -> Vec<ArtifactRecord> {
        let path = workdir.path.clone();
        let root: PathBuf = self.artifact_root().into();

        tokio::task::spawn_blocking(move || collector::collect(&path, &root))
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Artifact collection aborted: {}", e);
                Vec::new()
            })
    }
}

/// Marks top-level `figure_N.png` files, the names the autosave shim writes.
fn annotate_autosaved(artifacts: &mut [ArtifactRecord], run_id: &str) {
    for artifact in artifacts.iter_mut() {
        let is_autosaved = artifact
            .filename
            .strip_prefix(run_id)
            .and_then(|rest| rest.strip_prefix("/figure_"))
            .and_then(|rest| rest.strip_suffix(".png"))
            .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()));

        if is_autosaved {
            artifact.note = Some(AUTOSAVE_NOTE.to_string());
        }
    }
}
