use std::path::Path;

use itertools::Itertools;
use walkdir::WalkDir;

use crate::constants::{ARTIFACT_EXTENSIONS, FALLBACK_CONTENT_TYPE};
use crate::core::domain::ArtifactRecord;

/// Lists the exposable files under `workdir`, relative to `artifact_root`.
///
/// Unreadable entries are skipped with a warning; the walk never aborts.
/// Symlinks are not followed and never reported.
#[tracing::instrument]
pub fn collect(workdir: &Path, artifact_root: &Path) -> Vec<ArtifactRecord> {
    WalkDir::new(workdir)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let extension = artifact_extension(entry.path())?;
            match entry.path().strip_prefix(artifact_root) {
                Ok(relative) => Some((relative.to_path_buf(), extension)),
                Err(_) => {
                    tracing::warn!(
                        "Skipping {} outside artifact root {}",
                        entry.path().display(),
                        artifact_root.display()
                    );
                    None
                }
            }
        })
        // Component-wise, so `a/b.png` comes before `a-b/x.png`.
        .sorted_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(relative, extension)| ArtifactRecord {
            filename: relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .join("/"),
            content_type: content_type(&extension).to_string(),
            note: None,
        })
        .collect()
}

fn artifact_extension(path: &Path) -> Option<String> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    ARTIFACT_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}

fn content_type(extension: &str) -> &'static str {
    match extension {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "pdf" => "application/pdf",
        _ => FALLBACK_CONTENT_TYPE,
    }
}

/// Content type for an arbitrary served file, used by the viewer.
pub fn guess_content_type(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| content_type(&ext.to_ascii_lowercase()))
        .unwrap_or(FALLBACK_CONTENT_TYPE)
}
