use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::core::{domain::RunDirectory, errors::SandboxError};

#[derive(Clone, Debug)]
pub struct RunDirectoryAllocator {
    root: PathBuf,
}

impl RunDirectoryAllocator {
    pub fn new<T: AsRef<Path>>(root: T) -> Self {
        RunDirectoryAllocator {
            root: root.as_ref().into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates a fresh run directory such as `<root>/20250921-123456-abc123`.
    #[tracing::instrument]
    pub async fn allocate(&self) -> Result<RunDirectory, SandboxError> {
        self.allocate_with_id(new_run_id()).await
    }

    async fn allocate_with_id(&self, id: String) -> Result<RunDirectory, SandboxError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|source| SandboxError::Workspace {
                path: self.root.clone(),
                source,
            })?;

        let path = self.root.join(&id);
        // Not create_dir_all: an existing directory must be an error.
        fs::create_dir(&path)
            .await
            .map_err(|source| SandboxError::Workspace {
                path: path.clone(),
                source,
            })?;

        tracing::debug!("Allocated run directory: {}", path.display());
        Ok(RunDirectory { id, path })
    }
}

fn new_run_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}",
        chrono::Utc::now().format("%Y%m%d-%H%M%S"),
        &suffix[..6]
    )
}
