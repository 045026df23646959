//! Distribution label from `/etc/os-release`, shown as the activity state.

use std::collections::HashMap;
use std::path::Path;

pub const OS_RELEASE: &str = "/etc/os-release";

/// `PRETTY_NAME`, else `NAME`, else the OS family (`linux`).
pub fn current_label() -> String {
    label_from(Path::new(OS_RELEASE))
}

fn label_from(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) => label(&content),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read os-release");
            std::env::consts::OS.to_string()
        }
    }
}

/// Pick the display label out of os-release content.
pub fn label(content: &str) -> String {
    let fields = parse(content);
    fields
        .get("PRETTY_NAME")
        .or_else(|| fields.get("NAME"))
        .filter(|v| !v.is_empty())
        .cloned()
        .unwrap_or_else(|| std::env::consts::OS.to_string())
}

/// `KEY=value` lines; values may be wrapped in single or double quotes.
/// Comments and malformed lines are skipped.
fn parse(content: &str) -> HashMap<&str, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim(), unquote(value.trim())))
        .collect()
}

fn unquote(value: &str) -> String {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner.replace("\\\"", "\"");
        }
    }
    value.to_string()
}
