use std::path::{Component, Path, PathBuf};

use crate::core::{collector::guess_content_type, sanitizer::escape_html};

/// Resolves `relpath` under `root`, refusing anything that escapes it, passes
/// through a symlink or is not a regular file.
pub async fn resolve_safe(root: &Path, relpath: &str) -> Option<PathBuf> {
    let relative = Path::new(relpath);
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return None;
    }

    let base = tokio::fs::canonicalize(root).await.ok()?;
    let candidate = tokio::fs::canonicalize(base.join(relative)).await.ok()?;
    let metadata = tokio::fs::metadata(&candidate).await.ok()?;

    // Canonical form differs from the plain join only if a symlink was crossed.
    (candidate == base.join(relative) && metadata.is_file()).then_some(candidate)
}

pub fn render(rel_display: &str, file: &Path) -> String {
    let name = escape_html(rel_display);
    let file_url = format!("/files/{}", name);
    let content_type = guess_content_type(file);

    let body = if content_type.starts_with("image/") {
        format!(
            r#"<img src="{}" alt="{}" style="max-width:100%;height:auto" />"#,
            file_url, name
        )
    } else {
        format!(
            r#"<object data="{url}" type="{ctype}" width="100%" height="90vh"><a href="{url}">Open file</a></object>"#,
            url = file_url,
            ctype = content_type
        )
    };

    format!(
        r#"<!doctype html>
<html>
  <head>
    <meta charset="utf-8">
    <title>View: {name}</title>
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <style>body {{ font-family: system-ui, sans-serif; margin: 16px; }}</style>
  </head>
  <body>
    <h3>{name}</h3>
    {body}
  </body>
</html>"#
    )
}

pub const INDEX_PAGE: &str = r#"<!doctype html>
<html>
  <head><meta charset="utf-8"><title>Python Sandbox REST</title></head>
  <body style="font-family: system-ui, sans-serif; margin:16px">
    <h2>Python Sandbox REST</h2>
    <p>Use the <code>/execute</code> POST endpoint to run code. Generated files (per-run folders) are under <code>/files</code>.</p>
    <ul>
      <li><a href="/health">Health</a></li>
    </ul>
  </body>
</html>"#;

#[cfg(test)]
mod tests {
    use std::fs;

    use uuid::Uuid;

    use super::*;

    fn scratch_root() -> PathBuf {
        let root = std::env::temp_dir().join(format!("sandbox_{}", Uuid::new_v4()));
        fs::create_dir_all(root.join("run")).unwrap();
        fs::write(root.join("run/plot.png"), b"png").unwrap();
        root
    }

    #[tokio::test]
    async fn test_resolves_files_under_root() {
        let root = scratch_root();

        let resolved = resolve_safe(&root, "run/plot.png").await;

        assert_eq!(resolved, Some(fs::canonicalize(root.join("run/plot.png")).unwrap()));
    }

    #[tokio::test]
    async fn test_rejects_traversal_dirs_and_missing() {
        let root = scratch_root();

        assert!(resolve_safe(&root, "../etc/passwd").await.is_none());
        assert!(resolve_safe(&root, "run/../../x").await.is_none());
        assert!(resolve_safe(&root, "/etc/passwd").await.is_none());
        assert!(resolve_safe(&root, "run").await.is_none());
        assert!(resolve_safe(&root, "run/missing.png").await.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_rejects_symlink_out_of_root() {
        let root = scratch_root();
        std::os::unix::fs::symlink("/etc/hostname", root.join("run/leak.png")).unwrap();

        assert!(resolve_safe(&root, "run/leak.png").await.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_rejects_symlink_within_root() {
        let root = scratch_root();
        std::os::unix::fs::symlink(root.join("run/plot.png"), root.join("run/alias.png")).unwrap();
        std::os::unix::fs::symlink(root.join("run"), root.join("linked")).unwrap();

        assert!(resolve_safe(&root, "run/alias.png").await.is_none());
        assert!(resolve_safe(&root, "linked/plot.png").await.is_none());
        assert!(resolve_safe(&root, "./run/plot.png").await.is_some());
    }

    #[test]
    fn test_render_image_and_document() {
        let image = render("run/plot.png", Path::new("run/plot.png"));
        assert!(image.contains(r#"<img src="/files/run/plot.png""#));
        assert!(image.contains("<title>View: run/plot.png</title>"));

        let pdf = render("run/report.pdf", Path::new("run/report.pdf"));
        assert!(pdf.contains(r#"<object data="/files/run/report.pdf" type="application/pdf""#));
        assert!(pdf.contains("Open file"));
    }

    #[test]
    fn test_render_escapes_names() {
        let page = render("run/<b>.png", Path::new("run/<b>.png"));

        assert!(page.contains("run/&lt;b&gt;.png"));
        assert!(!page.contains("<b>"));
    }
}
