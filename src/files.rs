//! File discovery and persistence
//!
//! Everything the collector deliberately doesn't do: walking the tree,
//! decoding files, writing fixes back atomically and dumping diagnostics.

use std::io::Write;
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context};
use glob::Pattern;
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::Result;
use crate::process::{DiagnosticFile, SourceFile};

/// Files larger than this are skipped to prevent memory exhaustion
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Include/exclude globs of one format, matched on root-relative paths.
#[derive(Debug, Clone, Default)]
pub struct FileSelector {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl FileSelector {
    #[must_use]
    pub fn new(include: Vec<Pattern>, exclude: Vec<Pattern>) -> Self {
        Self { include, exclude }
    }

    /// An empty include list selects every file.
    #[must_use]
    pub fn matches(&self, relative: &str) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|p| p.matches(relative));
        included && !is_excluded(Path::new(relative), &self.exclude)
    }
}

/// Collect every file under `inputs` (or `root` when empty), sorted
pub fn collect_files(root: &Path, inputs: &[PathBuf], exclude: &[Pattern]) -> Vec<PathBuf> {
    let defaults = [root.to_path_buf()];
    let inputs = if inputs.is_empty() { &defaults[..] } else { inputs };

    let mut files = Vec::new();
    for input in inputs {
        let input = if input.is_absolute() {
            input.clone()
        } else {
            root.join(input)
        };
        if input.is_file() {
            if !is_excluded(&input, exclude) {
                files.push(input);
            }
        } else if input.is_dir() {
            // WalkDir reports symlink loops as errors, which are skipped.
            for entry in WalkDir::new(&input)
                .follow_links(true)
                .max_depth(256)
                .into_iter()
                .filter_map(std::result::Result::ok)
            {
                let path = entry.path();
                let relative = path.strip_prefix(root).unwrap_or(path);
                if path.is_file() && !is_excluded(relative, exclude) {
                    files.push(path.to_path_buf());
                }
            }
        } else {
            warn!("{} does not exist", input.display());
        }
    }

    files.sort();
    files.dedup();
    files
}

/// Check if a path matches any exclusion pattern
#[must_use]
pub fn is_excluded(path: &Path, patterns: &[Pattern]) -> bool {
    if patterns.is_empty() {
        return false;
    }

    let path_str = path.to_string_lossy();

    for pattern in patterns {
        if pattern.matches(&path_str) {
            return true;
        }

        if let Some(file_name) = path.file_name() {
            if pattern.matches(&file_name.to_string_lossy()) {
                return true;
            }
        }

        // Directory patterns such as `target` match any component.
        for component in path.components() {
            if let Component::Normal(c) = component {
                if pattern.matches(&c.to_string_lossy()) {
                    return true;
                }
            }
        }
    }

    false
}

/// `path` relative to `root`, joined with `/` on every platform.
#[must_use]
pub fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Read a file as UTF-8 text for the collector.
pub fn read_source(root: &Path, path: &Path) -> Result<SourceFile> {
    let relative = relative_path(root, path)
        .with_context(|| format!("{} is outside of {}", path.display(), root.display()))?;

    let size = std::fs::metadata(path)
        .with_context(|| format!("failed to stat {relative}"))?
        .len();
    if size > DEFAULT_MAX_FILE_SIZE {
        bail!(
            "{relative} is {} MB, above the limit of {} MB",
            size / (1024 * 1024),
            DEFAULT_MAX_FILE_SIZE / (1024 * 1024)
        );
    }

    let bytes = std::fs::read(path).with_context(|| format!("failed to read {relative}"))?;
    let content =
        String::from_utf8(bytes).with_context(|| format!("{relative} is not valid UTF-8"))?;
    Ok(SourceFile::new(relative, content))
}

/// Replace `path` with `content` without ever leaving a partial file behind.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temporary file in {}", dir.display()))?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;
    if let Ok(metadata) = std::fs::metadata(path) {
        tmp.as_file().set_permissions(metadata.permissions())?;
    }
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    debug!("Wrote {}", path.display());
    Ok(())
}

/// Remove a diagnostics directory left over from an earlier run.
pub fn clear_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        std::fs::remove_dir_all(dir)
            .with_context(|| format!("failed to clear {}", dir.display()))?;
    }
    Ok(())
}

/// Persist orbit members under `dir`, creating subdirectories as needed.
pub fn write_diagnostics(dir: &Path, files: &[DiagnosticFile]) -> Result<()> {
    for file in files {
        let target = dir.join(&file.name);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(&target, &file.content)
            .with_context(|| format!("failed to write {}", target.display()))?;
    }
    if !files.is_empty() {
        debug!("Wrote {} diagnostic files to {}", files.len(), dir.display());
    }
    Ok(())
}
