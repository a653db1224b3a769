//! padcell - Enforce formatting step chains on a source tree
//!
//! Applies named chains of text-rewriting steps to files, classifies steps
//! that fail to stabilize (converge, cycle, diverge) and renders bounded,
//! whitespace-visible diff reports of every violation.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod files;
pub mod process;
pub mod step;

// Re-export commonly used types
pub use cli::{build_cli, parse_args, parse_args_from, CliArgs};
pub use config::{Config, FormatConfig};
pub use diff::{DiffReport, Glyphs, ReportLimits};
pub use error::{ConfigError, Result, StepError};
pub use process::{
    probe, Classification, Exemptions, Mode, Probe, RunOutcome, Settings, SourceFile,
    ViolationCollector,
};
pub use step::{FnStep, Formatter, FormattingStep, LineEnding, StepChain, StepSpec};
