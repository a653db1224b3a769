//! GitHub Actions workflow commands for violations
//!
//! When running inside Actions, every edit becomes an `::error` command so
//! the violation shows up inline on the pull request.

use std::path::{Path, PathBuf};

use crate::diff::myers::EditKind;
use crate::diff::unified::FileDiff;

/// Lines of replacement text included in a suggestion.
const MAX_SUGGESTION_LINES: usize = 20;

/// The Actions checkout directory, unless annotations are switched off.
#[must_use]
pub fn workspace() -> Option<PathBuf> {
    let skip = std::env::var("PADCELL_SKIP_GITHUB_ACTIONS")
        .is_ok_and(|v| v.eq_ignore_ascii_case("true"));
    if skip {
        return None;
    }
    std::env::var_os("GITHUB_WORKSPACE").map(PathBuf::from)
}

/// Prefix turning root-relative paths into workspace-relative ones.
///
/// Empty when `root` is the workspace itself. A root outside the workspace
/// yields its absolute path.
#[must_use]
pub fn workspace_prefix(root: &Path, workspace: &Path) -> String {
    let workspace = std::fs::canonicalize(workspace).unwrap_or_else(|_| workspace.to_path_buf());
    match root.strip_prefix(&workspace) {
        Ok(relative) => relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => root.to_string_lossy().replace('\\', "/"),
    }
}

/// Join a workspace prefix and a root-relative path.
#[must_use]
pub fn workspace_path(prefix: &str, path: &str) -> String {
    if prefix.is_empty() {
        path.to_string()
    } else {
        format!("{}/{path}", prefix.trim_end_matches('/'))
    }
}

/// One `::error file=..,line=..::message` command per edit.
#[must_use]
pub fn error_commands(path: &str, diff: &FileDiff<'_>) -> Vec<String> {
    diff.edits()
        .iter()
        .map(|edit| {
            let line = edit.begin_a + 1;
            let message = match edit.kind() {
                EditKind::Delete => format!(
                    "Remove {} line{}: {}..{}",
                    edit.len_a(),
                    plural(edit.len_a()),
                    edit.begin_a + 1,
                    edit.end_a
                ),
                EditKind::Insert => format!(
                    "Insert {} line{}:\n{}",
                    edit.len_b(),
                    plural(edit.len_b()),
                    suggestion(diff, edit.begin_b, edit.end_b)
                ),
                EditKind::Replace => format!(
                    "Replace {} line{} {}..{} with\n{}",
                    edit.len_b(),
                    plural(edit.len_b()),
                    edit.begin_a + 1,
                    edit.end_a,
                    suggestion(diff, edit.begin_b, edit.end_b)
                ),
            };
            format!(
                "::error file={},line={line}::{}",
                escape_property(path),
                escape_data(&message)
            )
        })
        .collect()
}

fn suggestion(diff: &FileDiff<'_>, begin: usize, end: usize) -> String {
    let len = end - begin;
    if len <= MAX_SUGGESTION_LINES {
        return diff.expected_text(begin, end);
    }
    let left = len - MAX_SUGGESTION_LINES;
    format!(
        "{}\n...{left} more line{}",
        diff.expected_text(begin, begin + MAX_SUGGESTION_LINES),
        plural(left)
    )
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

fn escape_data(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}
