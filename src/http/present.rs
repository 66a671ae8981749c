use serde::Serialize;

use crate::core::{
    domain::{ExecutionResult, LinkMode, LinkedArtifact},
    links::resolve_links,
    sanitizer::sanitize,
};

#[derive(Clone, Debug)]
pub struct LinkSettings {
    pub base_url: String,
    pub mode: LinkMode,
}

#[derive(Clone, Debug, Serialize)]
pub struct ToolResponse {
    pub result: ToolResult,
}

#[derive(Clone, Debug, Serialize)]
pub struct ToolResult {
    pub stdout: String,
    pub stderr: String,
    pub returncode: i32,
    pub artifacts: Vec<LinkedArtifact>,
}

/// Shapes an engine result for a tool-calling consumer: sanitized streams,
/// absolute links, and a pointer to the first artifact when stdout is blank.
pub fn present(result: ExecutionResult, links: &LinkSettings) -> ToolResponse {
    let artifacts: Vec<LinkedArtifact> = result
        .artifacts
        .into_iter()
        .map(|record| resolve_links(record, links.mode, &links.base_url))
        .collect();

    let mut stdout = sanitize(&result.stdout);
    if stdout.trim().is_empty() {
        if let Some(first) = artifacts.first() {
            stdout = match first.url.as_ref().or(first.iframe_url.as_ref()) {
                Some(link) => format!("Generated image(s). Example: {}", link),
                None => "Generated image(s).".to_string(),
            };
        }
    }

    ToolResponse {
        result: ToolResult {
            stdout,
            stderr: sanitize(&result.stderr),
            returncode: result.returncode,
            artifacts,
        },
    }
}
