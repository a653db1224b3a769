//! Error types and result aliases for padcell.
//!
//! This module defines the error handling infrastructure:
//! - [`Result<T>`]: Type alias for `anyhow::Result<T>` used by the binary and I/O layer
//! - [`StepError`]: A named formatting step failed on some input
//! - [`ConfigError`]: The configuration is structurally valid TOML but unusable

use anyhow::Result as AnyhowResult;

pub type Result<T> = AnyhowResult<T>;

/// Underlying cause carried by a [`StepError`].
pub type StepCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A formatting step failed while transforming a file.
///
/// The step name is always attached so the report can point at the rule
/// rather than at the whole chain.
#[derive(Debug, thiserror::Error)]
#[error("step '{step}' failed: {cause}")]
pub struct StepError {
    pub step: String,
    #[source]
    pub cause: StepCause,
}

impl StepError {
    pub fn new(step: impl Into<String>, cause: impl Into<StepCause>) -> Self {
        Self {
            step: step.into(),
            cause: cause.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be at least {min} (got {value})")]
    BelowMinimum {
        key: &'static str,
        min: usize,
        value: usize,
    },
    #[error("duplicate format name '{0}'")]
    DuplicateFormat(String),
    #[error("format '{0}' has no steps")]
    EmptyFormat(String),
    #[error("format '{format}': invalid glob '{pattern}': {source}")]
    InvalidGlob {
        format: String,
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("format '{format}': step '{step}' has an invalid pattern: {source}")]
    InvalidRegex {
        format: String,
        step: String,
        #[source]
        source: regex::Error,
    },
    #[error("unknown format '{0}'")]
    UnknownFormat(String),
    #[error("unsupported config version {0} (expected 1)")]
    UnsupportedVersion(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_error_names_the_step() {
        let err = StepError::new("trim", "boom");
        assert_eq!(err.to_string(), "step 'trim' failed: boom");
        assert!(std::error::Error::source(&err).is_some());
    }
}
