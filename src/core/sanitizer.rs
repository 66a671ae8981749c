//! Text cleanup applied to captured stdout/stderr before it reaches a
//! tool-calling consumer.
//!
//! Stripping runs before escaping; the reverse order is not idempotent.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static DATA_URI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)data:image/[a-zA-Z0-9.+-]+;base64,[A-Za-z0-9+/=\s]+")
        .expect("data uri pattern")
});

static TRAILING_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+(\r?\n)").expect("trailing whitespace pattern"));

static BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank run pattern"));

static CONTROL_MARKERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)</?\s*tool_call\b[^>]*>",
        r"(?i)</?\s*tool_result\b[^>]*>",
        r"(?i)</?\s*thinking\b[^>]*>",
        r"(?i)</?\s*think\b[^>]*>",
        r"(?i)<\s*https?://[^>]+>",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("control marker pattern"))
    .collect()
});

pub fn sanitize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let stripped = strip_data_uris(text);
    escape_control_markers(&stripped)
}

fn strip_data_uris(text: &str) -> String {
    // Removing one URI can join its neighbours into another.
    let mut text = text.to_string();
    while DATA_URI.is_match(&text) {
        text = DATA_URI.replace_all(&text, "").into_owned();
    }
    let text = TRAILING_WHITESPACE.replace_all(&text, "$1");
    BLANK_RUN.replace_all(&text, "\n\n").into_owned()
}

fn escape_control_markers(text: &str) -> String {
    let mut text = text.to_string();
    for marker in CONTROL_MARKERS.iter() {
        if marker.is_match(&text) {
            text = marker
                .replace_all(&text, |caps: &Captures| escape_html(&caps[0]))
                .into_owned();
        }
    }
    text
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }
    escaped
}
