//! Formatting steps and chains.
//!
//! - [`chain`]: The [`FormattingStep`] trait, [`StepChain`] and the net [`Formatter`]
//! - [`generic`]: Built-in steps configurable from `padcell.toml`
//! - [`line_ending`]: Line ending policies applied after the chain runs

pub mod chain;
pub mod generic;
pub mod line_ending;

pub use chain::{FnStep, Formatter, FormattingStep, StepChain};
pub use generic::{IndentStyle, StepSpec};
pub use line_ending::{to_unix, LineEnding};
