use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::constants::{AUTOSAVE_NOTE, TIMEOUT_EXIT_CODE};
use crate::core::domain::RunState;
use crate::core::engine::{Sandbox, SandboxSettings};
use crate::native::runner::ProcessRunner;

fn python_path() -> String {
    std::env::var("SANDBOX_PYTHON").unwrap_or_else(|_| "python3".to_string())
}

fn python_sandbox(timeout_secs: u64, autosave: bool) -> (Sandbox, PathBuf) {
    let root = std::env::temp_dir().join(format!("sandbox_{}", Uuid::new_v4()));
    let sandbox = Sandbox::new(
        &root,
        Arc::new(ProcessRunner::python(python_path())),
        SandboxSettings {
            timeout: Duration::from_secs(timeout_secs),
            autosave,
        },
    );
    (sandbox, root)
}

#[tokio::test]
async fn test_hello_world() {
    let (sandbox, _) = python_sandbox(10, false);

    let result = sandbox
        .execute("print('Hello, Integration Test!')")
        .await
        .expect("Execution should succeed");

    assert_eq!(result.returncode, 0);
    assert_eq!(result.stdout.trim(), "Hello, Integration Test!");
    assert!(result.stderr.is_empty(), "stderr: {}", result.stderr);
    assert_eq!(result.state, RunState::Completed);
}

#[tokio::test]
async fn test_written_file_round_trips_as_artifact() {
    let (sandbox, root) = python_sandbox(10, true);
    let code = r#"
import os
os.makedirs("charts", exist_ok=True)
with open("plot.png", "wb") as f:
    f.write(b"\x89PNG\r\n\x1a\n")
with open("charts/summary.pdf", "wb") as f:
    f.write(b"%PDF-1.4")
with open("data.tmp", "w") as f:
    f.write("scratch")
print("saved")
"#;

    let result = sandbox.execute(code).await.expect("Execution should succeed");

    assert_eq!(result.returncode, 0, "stderr: {}", result.stderr);
    let names: Vec<(&str, &str)> = result
        .artifacts
        .iter()
        .map(|a| {
            let (_, name) = a.filename.split_once('/').unwrap();
            (name, a.content_type.as_str())
        })
        .collect();
    assert_eq!(
        names,
        vec![
            ("charts/summary.pdf", "application/pdf"),
            ("plot.png", "image/png"),
        ]
    );
    for artifact in &result.artifacts {
        assert!(root.join(&artifact.filename).is_file());
    }
}

#[tokio::test]
async fn test_child_failure_passes_through() {
    let (sandbox, _) = python_sandbox(10, true);

    let result = sandbox
        .execute("import sys\nprint('partial')\nraise SystemExit(7)")
        .await
        .expect("Execution should succeed");

    assert_eq!(result.returncode, 7);
    assert_eq!(result.stdout, "partial\n");

    let result = sandbox
        .execute("1 / 0")
        .await
        .expect("Execution should succeed");

    assert_eq!(result.returncode, 1);
    assert!(result.stderr.contains("ZeroDivisionError"));
}

#[tokio::test]
async fn test_timeout_returns_within_bound() {
    let (sandbox, _) = python_sandbox(2, true);

    let started = Instant::now();
    let result = sandbox
        .execute("import time\nprint('before', flush=True)\ntime.sleep(10)")
        .await
        .expect("Execution should succeed");

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(result.returncode, TIMEOUT_EXIT_CODE);
    assert_eq!(result.state, RunState::TimedOut);
    assert_eq!(result.stdout, "before\n");
    assert!(result.stderr.contains("[timeout] Execution exceeded 2s"));
}

#[tokio::test]
async fn test_concurrent_runs_are_isolated() {
    let (sandbox, _) = python_sandbox(10, false);
    let code = r#"
import os
with open("out.png", "wb") as f:
    f.write(b"x")
print(sorted(os.listdir(".")))
"#;

    let results = futures::future::join_all((0..4).map(|_| sandbox.execute(code))).await;

    let mut prefixes = HashSet::new();
    for result in results {
        let result = result.expect("Execution should succeed");
        // Each run sees only its own file.
        assert_eq!(result.stdout.trim(), "['out.png']");
        assert_eq!(result.artifacts.len(), 1);
        let (prefix, _) = result.artifacts[0].filename.split_once('/').unwrap();
        assert!(prefixes.insert(prefix.to_string()));
    }
    assert_eq!(prefixes.len(), 4);
}

#[tokio::test]
async fn test_shim_is_harmless_without_figures() {
    let (sandbox, _) = python_sandbox(10, true);

    let result = sandbox
        .execute("import os\nprint(os.environ['MPLBACKEND'])")
        .await
        .expect("Execution should succeed");

    assert_eq!(result.returncode, 0, "stderr: {}", result.stderr);
    assert_eq!(result.stdout, "Agg\n");
    assert!(result.artifacts.is_empty());
}

#[tokio::test]
async fn test_open_figure_is_autosaved() {
    let (sandbox, root) = python_sandbox(30, true);

    let has_matplotlib = sandbox
        .execute("import matplotlib")
        .await
        .expect("Execution should succeed");
    if has_matplotlib.returncode != 0 {
        eprintln!("matplotlib not installed, skipping");
        return;
    }

    let result = sandbox
        .execute("import matplotlib.pyplot as plt\nplt.plot([1])")
        .await
        .expect("Execution should succeed");

    assert_eq!(result.returncode, 0, "stderr: {}", result.stderr);
    assert_eq!(result.artifacts.len(), 1);
    let figure = &result.artifacts[0];
    assert!(figure.filename.ends_with("/figure_1.png"));
    assert_eq!(figure.content_type, "image/png");
    assert_eq!(figure.note.as_deref(), Some(AUTOSAVE_NOTE));
    assert!(root.join(&figure.filename).is_file());
}
