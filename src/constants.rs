/// Exit status reported when the child outlives its deadline.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Exit status reported when the runner itself fails (spawn or wait).
/// Child statuses are 0..=255 and signal deaths map to 128 + signo,
/// so a negative value can never come from the child.
pub const RUNNER_FAILURE_EXIT_CODE: i32 = -1;

/// File extensions exposed as artifacts, lowercase, without the dot.
pub const ARTIFACT_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "svg", "webp", "bmp", "tiff", "tif", "pdf",
];

pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

pub const AUTOSAVE_NOTE: &str = "auto-saved matplotlib figure";

/// How long reader tasks get to hit EOF after the process group is killed.
pub const READER_GRACE_MS: u64 = 500;
