//! Diff computation and violation reporting.
//!
//! - [`myers`]: Line diff producing [`Edit`] regions
//! - [`unified`]: Git-style hunks with visible whitespace on changed lines
//! - [`visible`]: Whitespace glyphs (`·`, `⇥`, `␍`, `␊`)
//! - [`report`]: The bounded multi-file [`DiffReport`]
//! - [`annotations`]: GitHub Actions `::error` commands

pub mod annotations;
pub mod myers;
pub mod report;
pub mod unified;
pub mod visible;

pub use myers::{Edit, EditKind};
pub use report::{DiffReport, Layout, ReportLimits, Section};
pub use unified::{render, FileDiff};
pub use visible::Glyphs;
