//! Built-in, language-agnostic formatting steps
//!
//! Steps are described by [`StepSpec`] in configuration and turned into live
//! [`FormattingStep`]s by [`StepSpec::build`]. There is no runtime discovery:
//! every capability is listed here.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::StepCause;
use crate::step::chain::FormattingStep;

static TRAILING_WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)[ \t]+$").unwrap());

static LEADING_WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[ \t]+").unwrap());

fn default_indent_width() -> usize {
    4
}

/// Serializable description of one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum StepSpec {
    TrimTrailingWhitespace,
    EndWithNewline,
    ReplaceRegex {
        name: String,
        pattern: String,
        replacement: String,
    },
    Indent {
        #[serde(default)]
        style: IndentStyle,
        #[serde(default = "default_indent_width")]
        width: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IndentStyle {
    #[default]
    Spaces,
    Tabs,
}

impl StepSpec {
    /// The name reported in errors and matched by exemptions.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            StepSpec::TrimTrailingWhitespace => "trim-trailing-whitespace",
            StepSpec::EndWithNewline => "end-with-newline",
            StepSpec::ReplaceRegex { name, .. } => name,
            StepSpec::Indent { .. } => "indent",
        }
    }

    pub fn build(&self) -> Result<Arc<dyn FormattingStep>, regex::Error> {
        let step: Arc<dyn FormattingStep> = match self {
            StepSpec::TrimTrailingWhitespace => Arc::new(TrimTrailingWhitespace),
            StepSpec::EndWithNewline => Arc::new(EndWithNewline),
            StepSpec::ReplaceRegex {
                name,
                pattern,
                replacement,
            } => Arc::new(ReplaceRegex::new(name, pattern, replacement)?),
            StepSpec::Indent { style, width } => Arc::new(Indent {
                style: *style,
                width: (*width).max(1),
            }),
        };
        Ok(step)
    }
}

/// Removes spaces and tabs at the end of every line.
#[derive(Debug, Clone, Copy)]
pub struct TrimTrailingWhitespace;

impl FormattingStep for TrimTrailingWhitespace {
    fn name(&self) -> &str {
        "trim-trailing-whitespace"
    }

    fn format(&self, input: &str) -> Result<String, StepCause> {
        Ok(TRAILING_WS_RE.replace_all(input, "").into_owned())
    }
}

/// Ensures the text ends with exactly one newline.
#[derive(Debug, Clone, Copy)]
pub struct EndWithNewline;

impl FormattingStep for EndWithNewline {
    fn name(&self) -> &str {
        "end-with-newline"
    }

    fn format(&self, input: &str) -> Result<String, StepCause> {
        let mut out = input.trim_end().to_string();
        out.push('\n');
        Ok(out)
    }
}

/// Multi-line regex replace-all. `$1`-style group references are supported.
#[derive(Debug, Clone)]
pub struct ReplaceRegex {
    name: String,
    regex: Regex,
    replacement: String,
}

impl ReplaceRegex {
    pub fn new(name: &str, pattern: &str, replacement: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.to_string(),
            regex: Regex::new(&format!("(?m){pattern}"))?,
            replacement: replacement.to_string(),
        })
    }
}

impl FormattingStep for ReplaceRegex {
    fn name(&self) -> &str {
        &self.name
    }

    fn format(&self, input: &str) -> Result<String, StepCause> {
        Ok(self
            .regex
            .replace_all(input, self.replacement.as_str())
            .into_owned())
    }
}

/// Rewrites leading indentation to tabs or to `width` spaces per level.
#[derive(Debug, Clone, Copy)]
pub struct Indent {
    style: IndentStyle,
    width: usize,
}

impl Indent {
    fn reindent(&self, leading: &str) -> String {
        // Column of the first non-blank character, tabs stop at `width`.
        let mut column = 0;
        for c in leading.chars() {
            if c == '\t' {
                column += self.width - column % self.width;
            } else {
                column += 1;
            }
        }
        match self.style {
            IndentStyle::Spaces => " ".repeat(column),
            IndentStyle::Tabs => {
                let mut out = "\t".repeat(column / self.width);
                out.push_str(&" ".repeat(column % self.width));
                out
            }
        }
    }
}

impl FormattingStep for Indent {
    fn name(&self) -> &str {
        "indent"
    }

    fn format(&self, input: &str) -> Result<String, StepCause> {
        Ok(LEADING_WS_RE
            .replace_all(input, |caps: &regex::Captures| self.reindent(&caps[0]))
            .into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Asserts `before` becomes `after` and that `after` is left alone.
    fn check(step: &dyn FormattingStep, before: &str, after: &str) {
        let actual = step.format(before).unwrap();
        assert_eq!(actual, after, "before: [{before:?}]");
        unaffected(step, after);
    }

    fn unaffected(step: &dyn FormattingStep, text: &str) {
        let actual = step.format(text).unwrap();
        assert_eq!(actual, text, "step should be idempotent on [{text:?}]");
    }

    #[test]
    fn test_trim_trailing_whitespace() {
        let step = TrimTrailingWhitespace;
        unaffected(&step, "");
        unaffected(&step, "\n");
        unaffected(&step, "\n\n\n");
        unaffected(&step, "   preceding");

        check(&step, "trailing  ", "trailing");
        check(&step, "trailing  \n", "trailing\n");
        check(&step, "trailing\t", "trailing");
        check(&step, "trailing\t\n", "trailing\n");
        check(&step, "\t  trailing  \n", "\t  trailing\n");

        unaffected(&step, "Line\nLine");
        check(&step, "Line  \nLine", "Line\nLine");
        check(&step, "  Line  \n  Line  ", "  Line\n  Line");
    }

    #[test]
    fn test_end_with_newline() {
        let step = EndWithNewline;
        check(&step, "", "\n");
        check(&step, "\n\n\n\n", "\n");
        check(&step, "line", "line\n");
        check(&step, "line\nline\n\n\n\n", "line\nline\n");
        unaffected(&step, "line\n");
    }

    #[test]
    fn test_replace_regex() {
        let step = ReplaceRegex::new("no-todo", r"^TODO\s*", "// TODO: ").unwrap();
        assert_eq!(step.name(), "no-todo");
        assert_eq!(
            step.format("a\nTODO fix\n").unwrap(),
            "a\n// TODO: fix\n"
        );
    }

    #[test]
    fn test_replace_regex_groups() {
        let step = ReplaceRegex::new("swap", r"(\w+)=(\w+)", "$2=$1").unwrap();
        assert_eq!(step.format("a=b").unwrap(), "b=a");
    }

    #[test]
    fn test_indent_tabs_to_spaces() {
        let step = Indent {
            style: IndentStyle::Spaces,
            width: 4,
        };
        check(&step, "\tx\n\t\ty\n", "    x\n        y\n");
        check(&step, "  \tx\n", "    x\n");
    }

    #[test]
    fn test_indent_spaces_to_tabs() {
        let step = Indent {
            style: IndentStyle::Tabs,
            width: 2,
        };
        check(&step, "    x\n   y\n", "\t\tx\n\t y\n");
    }

    #[test]
    fn test_spec_deserialize() {
        #[derive(Deserialize)]
        struct Wrapper {
            steps: Vec<StepSpec>,
        }
        let w: Wrapper = toml::from_str(
            r#"
            steps = [
                { kind = "trim-trailing-whitespace" },
                { kind = "replace-regex", name = "tabs", pattern = "\t", replacement = "  " },
                { kind = "indent", style = "tabs" },
            ]
            "#,
        )
        .unwrap();
        assert_eq!(w.steps[0], StepSpec::TrimTrailingWhitespace);
        assert_eq!(w.steps[1].name(), "tabs");
        assert_eq!(
            w.steps[2],
            StepSpec::Indent {
                style: IndentStyle::Tabs,
                width: 4
            }
        );
    }

    #[test]
    fn test_build_rejects_bad_regex() {
        let spec = StepSpec::ReplaceRegex {
            name: "bad".to_string(),
            pattern: "(".to_string(),
            replacement: String::new(),
        };
        assert!(spec.build().is_err());
    }
}
