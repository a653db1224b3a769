//! Git-style unified diff rendering
//!
//! Lines are compared including their terminators, so a CRLF/LF change or a
//! missing final newline is a real difference. Context lines are printed
//! as-is; removed and added lines go through [`Glyphs::visualize`].

use crate::diff::myers::{self, Edit};
use crate::diff::visible::Glyphs;

/// Lines of unchanged context around each edit.
pub const CONTEXT_LINES: usize = 3;

/// Split text into lines, keeping each line's `\n`.
#[must_use]
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}

/// A computed line diff between two texts.
#[derive(Debug, Clone)]
pub struct FileDiff<'a> {
    a: Vec<&'a str>,
    b: Vec<&'a str>,
    edits: Vec<Edit>,
}

impl<'a> FileDiff<'a> {
    #[must_use]
    pub fn compute(original: &'a str, expected: &'a str) -> Self {
        let a = split_lines(original);
        let b = split_lines(expected);
        let edits = myers::diff(&a, &b);
        Self { a, b, edits }
    }

    #[must_use]
    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Lines `b[begin..end]` joined back together.
    #[must_use]
    pub fn expected_text(&self, begin: usize, end: usize) -> String {
        self.b[begin..end].concat()
    }

    /// Render all hunks. The result does not end with a newline.
    #[must_use]
    pub fn render(&self, glyphs: &Glyphs) -> String {
        let mut out = String::new();
        let edits = &self.edits;
        let mut i = 0;
        while i < edits.len() {
            let end_idx = combined_end(edits, i);
            let mut edit = edits[i];
            let last = edits[end_idx];

            let mut line_a = edit.begin_a.saturating_sub(CONTEXT_LINES);
            let mut line_b = edit.begin_b.saturating_sub(CONTEXT_LINES);
            let end_a = (last.end_a + CONTEXT_LINES).min(self.a.len());
            let end_b = (last.end_b + CONTEXT_LINES).min(self.b.len());

            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&header(line_a, end_a, line_b, end_b));

            while line_a < end_a || line_b < end_b {
                if line_a < edit.begin_a {
                    self.context_line(&mut out, line_a);
                    line_a += 1;
                    line_b += 1;
                } else if line_a < edit.end_a {
                    changed_line(&mut out, '-', self.a[line_a], glyphs);
                    line_a += 1;
                } else if line_b < edit.end_b {
                    changed_line(&mut out, '+', self.b[line_b], glyphs);
                    line_b += 1;
                } else {
                    self.context_line(&mut out, line_a);
                    line_a += 1;
                    line_b += 1;
                }
                if line_a == edit.end_a && line_b == edit.end_b && i < end_idx {
                    i += 1;
                    edit = edits[i];
                }
            }
            i += 1;
        }
        out
    }

    fn context_line(&self, out: &mut String, line: usize) {
        out.push('\n');
        out.push(' ');
        out.push_str(self.a[line].trim_end_matches(['\n', '\r']));
    }
}

/// Render the diff between two texts with the given glyphs.
#[must_use]
pub fn render(original: &str, expected: &str, glyphs: &Glyphs) -> String {
    FileDiff::compute(original, expected).render(glyphs)
}

fn changed_line(out: &mut String, prefix: char, line: &str, glyphs: &Glyphs) {
    out.push('\n');
    out.push(prefix);
    out.push_str(&glyphs.visualize(line));
}

/// Index of the last edit that shares a hunk with `start`.
fn combined_end(edits: &[Edit], start: usize) -> usize {
    let mut i = start;
    while i + 1 < edits.len() {
        let current = edits[i];
        let next = edits[i + 1];
        if next.begin_a - current.end_a > 2 * CONTEXT_LINES + 1
            && next.begin_b - current.end_b > 2 * CONTEXT_LINES + 1
        {
            break;
        }
        i += 1;
    }
    i
}

fn header(line_a: usize, end_a: usize, line_b: usize, end_b: usize) -> String {
    format!(
        "@@ -{} +{} @@",
        range(line_a + 1, end_a - line_a),
        range(line_b + 1, end_b - line_b)
    )
}

fn range(begin: usize, length: usize) -> String {
    match length {
        0 => format!("{},0", begin - 1),
        1 => begin.to_string(),
        _ => format!("{begin},{length}"),
    }
}
