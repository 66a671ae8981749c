use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize)]
pub struct RunRequest {
    pub code: String,
}

/// Workspace owned by exactly one invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunDirectory {
    pub id: String,
    pub path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct ExecutionLimits {
    pub timeout: Duration,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunState {
    #[default]
    Pending,
    Running,
    Completed,
    TimedOut,
    SetupFailed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Completed | RunState::TimedOut | RunState::SetupFailed
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRecord {
    /// Path relative to the artifact root, `/`-separated, run id first.
    pub filename: String,
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub returncode: i32,
    pub artifacts: Vec<ArtifactRecord>,
    #[serde(skip)]
    pub state: RunState,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LinkMode {
    /// Files under `/files`, plus an HTML viewer under `/view`.
    #[default]
    Rest,
    /// Files served directly from the base URL, no viewer.
    Plain,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedArtifact {
    #[serde(flatten)]
    pub record: ArtifactRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iframe_url: Option<String>,
}
