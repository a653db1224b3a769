//! Bounded multi-file violation report
//!
//! Files are rendered in lexicographic path order. Each file falls into one
//! of three tiers as the report fills up:
//! 1. path plus (possibly truncated) diff body, while the line budget lasts
//!    and fewer than `max_files_to_list` files have been shown
//! 2. path only, under `Violations also present in:`
//! 3. a single count line, once even the path list would be too long
//!
//! Path lines and body lines count against `max_message_lines`; the
//! envelope, truncation markers and tier 2/3 lines do not.
//!
//! Bodies added with [`DiffReport::add_diff`] are only diffed once the file
//! is known to get a tier-1 section.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::OnceLock;

use crate::diff::unified;
use crate::diff::visible::Glyphs;

pub const DEFAULT_MAX_MESSAGE_LINES: usize = 50;
pub const DEFAULT_MAX_FILES_TO_LIST: usize = 10;

const NORMAL_INDENT: &str = "  ";
const DIFF_INDENT: &str = "    ";

pub const PREAMBLE: &str = "The following files have format violations:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportLimits {
    pub max_message_lines: usize,
    pub max_files_to_list: usize,
}

impl Default for ReportLimits {
    fn default() -> Self {
        Self {
            max_message_lines: DEFAULT_MAX_MESSAGE_LINES,
            max_files_to_list: DEFAULT_MAX_FILES_TO_LIST,
        }
    }
}

/// How one tier-1 file was rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<'r> {
    pub path: &'r str,
    pub body: Vec<&'r str>,
    pub withheld: usize,
}

/// Assignment of every file in the report to exactly one tier.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Layout<'r> {
    pub sections: Vec<Section<'r>>,
    pub named: Vec<&'r str>,
    pub counted: usize,
}

impl Layout<'_> {
    /// Budgeted lines actually emitted (path lines plus shown body lines).
    #[must_use]
    pub fn budget_used(&self) -> usize {
        self.sections.iter().map(|s| 1 + s.body.len()).sum()
    }

    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.counted > 0
            || !self.named.is_empty()
            || self.sections.iter().any(|s| s.withheld > 0)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    /// `(original, expected)` still waiting to be diffed.
    pending: Option<(String, String)>,
    body: OnceLock<String>,
}

impl Entry {
    fn body(&self, glyphs: &Glyphs) -> &str {
        self.body.get_or_init(|| match &self.pending {
            Some((original, expected)) => unified::render(original, expected, glyphs),
            None => String::new(),
        })
    }
}

/// Accumulates per-file bodies and renders them within the limits.
#[derive(Debug, Clone)]
pub struct DiffReport {
    limits: ReportLimits,
    glyphs: Glyphs,
    entries: BTreeMap<String, Entry>,
}

impl DiffReport {
    #[must_use]
    pub fn new(limits: ReportLimits) -> Self {
        Self {
            limits,
            glyphs: Glyphs::FANCY,
            entries: BTreeMap::new(),
        }
    }

    /// Glyphs used for bodies added with [`DiffReport::add_diff`].
    #[must_use]
    pub fn with_glyphs(mut self, glyphs: Glyphs) -> Self {
        self.glyphs = glyphs;
        self
    }

    /// Add a pre-rendered body for `path`. A later body for the same path wins.
    pub fn add(&mut self, path: impl Into<String>, body: impl Into<String>) {
        let entry = Entry {
            pending: None,
            body: OnceLock::from(body.into()),
        };
        self.entries.insert(path.into(), entry);
    }

    /// Add the unified diff between `original` and `expected`, computed
    /// only if `path` ends up with a diff body.
    pub fn add_diff(
        &mut self,
        path: impl Into<String>,
        original: impl Into<String>,
        expected: impl Into<String>,
    ) {
        let entry = Entry {
            pending: Some((original.into(), expected.into())),
            body: OnceLock::new(),
        };
        self.entries.insert(path.into(), entry);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Decide which tier every file lands in.
    #[must_use]
    pub fn layout(&self) -> Layout<'_> {
        let max_lines = self.limits.max_message_lines;
        let mut layout = Layout::default();
        let mut used = 0;
        let mut remaining = Vec::new();

        for (path, entry) in &self.entries {
            let has_room =
                used < max_lines && layout.sections.len() < self.limits.max_files_to_list;
            if !has_room || !remaining.is_empty() {
                remaining.push(path.as_str());
                continue;
            }
            used += 1;
            let body = entry.body(&self.glyphs);
            let lines: Vec<&str> = if body.is_empty() {
                Vec::new()
            } else {
                body.split('\n').collect()
            };
            let fit = lines.len().min(max_lines - used);
            used += fit;
            layout.sections.push(Section {
                path: path.as_str(),
                withheld: lines.len() - fit,
                body: lines[..fit].to_vec(),
            });
        }

        if remaining.len() >= self.limits.max_files_to_list {
            layout.counted = remaining.len();
        } else {
            layout.named = remaining;
        }
        layout
    }

    /// Render the full report, envelope included. Ends with a newline.
    #[must_use]
    pub fn render(&self) -> String {
        let layout = self.layout();
        let mut out = String::with_capacity(self.limits.max_message_lines * 64);
        out.push_str(PREAMBLE);
        out.push('\n');

        for section in &layout.sections {
            push_line(&mut out, NORMAL_INDENT, section.path);
            for line in &section.body {
                push_line(&mut out, DIFF_INDENT, line);
            }
            if section.withheld > 0 {
                let more = format!("... ({} more lines that didn't fit)", section.withheld);
                push_line(&mut out, NORMAL_INDENT, &more);
            }
        }

        if !layout.named.is_empty() {
            out.push_str("Violations also present in:\n");
            for path in &layout.named {
                push_line(&mut out, NORMAL_INDENT, path);
            }
        }
        if layout.counted > 0 {
            let _ = writeln!(out, "Violations also present in {} other files.", layout.counted);
        }
        if layout.is_truncated() {
            let _ = writeln!(
                out,
                "You might want to adjust --max-message-lines={} --max-files-to-list={} to see more violations",
                self.limits.max_message_lines, self.limits.max_files_to_list
            );
        }
        out.push_str("Run 'padcell apply' to fix these violations.\n");
        out
    }
}

fn push_line(out: &mut String, indent: &str, line: &str) {
    out.push_str(indent);
    out.push_str(line);
    out.push('\n');
}
