//! Visible whitespace for changed diff lines
//!
//! Trailing spaces and CRLF-vs-LF changes are invisible in a terminal, so
//! changed lines are rendered with a glyph for every whitespace character.

/// Replacement text for each whitespace character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyphs {
    pub space: &'static str,
    pub tab: &'static str,
    pub cr: &'static str,
    pub lf: &'static str,
}

impl Glyphs {
    /// `·`, `⇥`, `␍`, `␊`
    pub const FANCY: Glyphs = Glyphs {
        space: "\u{00b7}",
        tab: "\u{21e5}",
        cr: "\u{240d}",
        lf: "\u{240a}",
    };

    /// ASCII escapes for consoles that can't render the fancy glyphs.
    pub const SIMPLE: Glyphs = Glyphs {
        space: " ",
        tab: "\\t",
        cr: "\\r",
        lf: "\\n",
    };

    /// Fancy glyphs unless running on Windows or `PADCELL_SIMPLE_GLYPHS` is set.
    #[must_use]
    pub fn detect() -> Glyphs {
        if cfg!(windows) || std::env::var_os("PADCELL_SIMPLE_GLYPHS").is_some() {
            Glyphs::SIMPLE
        } else {
            Glyphs::FANCY
        }
    }

    /// Render `line` (including its terminator, if any) with visible whitespace.
    #[must_use]
    pub fn visualize(&self, line: &str) -> String {
        let mut out = String::with_capacity(line.len() + 8);
        for c in line.chars() {
            match c {
                ' ' => out.push_str(self.space),
                '\t' => out.push_str(self.tab),
                '\r' => out.push_str(self.cr),
                '\n' => out.push_str(self.lf),
                other => out.push(other),
            }
        }
        out
    }

    /// Inverse of [`Glyphs::visualize`] for the fancy set.
    ///
    /// Ambiguous when the text itself contains glyph characters; intended for
    /// tests and tooling that consume reports.
    #[must_use]
    pub fn devisualize(&self, line: &str) -> String {
        line.replace(self.space, " ")
            .replace(self.tab, "\t")
            .replace(self.cr, "\r")
            .replace(self.lf, "\n")
    }
}

impl Default for Glyphs {
    fn default() -> Self {
        Glyphs::FANCY
    }
}
