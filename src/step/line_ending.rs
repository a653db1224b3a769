//! Line ending policies
//!
//! Steps always operate on `\n`-only text. The policy decides which ending is
//! written back once the chain has run.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineEnding {
    /// `\n`
    #[default]
    Unix,
    /// `\r\n`
    Windows,
    /// `\r\n` on Windows hosts, `\n` elsewhere
    PlatformNative,
    /// Whatever the input predominantly used
    Preserve,
}

impl LineEnding {
    /// The concrete ending to emit for `input`.
    #[must_use]
    pub fn ending_for(self, input: &str) -> &'static str {
        match self {
            LineEnding::Unix => "\n",
            LineEnding::Windows => "\r\n",
            LineEnding::PlatformNative => {
                if cfg!(windows) {
                    "\r\n"
                } else {
                    "\n"
                }
            }
            LineEnding::Preserve => detect(input),
        }
    }

    /// Convert `\n`-only text to this policy's ending.
    ///
    /// `original` is the text as read from disk and is only consulted by
    /// [`LineEnding::Preserve`].
    #[must_use]
    pub fn apply(self, unix: &str, original: &str) -> String {
        let ending = self.ending_for(original);
        if ending == "\n" {
            unix.to_string()
        } else {
            unix.replace('\n', ending)
        }
    }
}

/// Returns a string with exclusively unix line endings.
///
/// Text without any `\n` is returned untouched, so a lone `\r` survives.
#[must_use]
pub fn to_unix(input: &str) -> String {
    if input.contains('\n') {
        input.replace('\r', "")
    } else {
        input.to_string()
    }
}

fn detect(input: &str) -> &'static str {
    let lf = input.matches('\n').count();
    let crlf = input.matches("\r\n").count();
    if crlf * 2 > lf {
        "\r\n"
    } else {
        "\n"
    }
}
