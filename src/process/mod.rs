//! Idempotency probing and violation collection.
//!
//! **Probing** ([`probe`]): repeatedly applies a formatter to one file's
//! content, classifies the orbit and picks a safe output.
//!
//! **Collecting** ([`ViolationCollector`]): probes a whole file set in
//! parallel, then decides per mode what gets reported, written back or
//! dumped for diagnosis.

pub mod collector;
pub mod probe;

pub use collector::{
    DiagnosticFile, Exemptions, FileOutcome, FileResult, Mode, RunOutcome, Settings, SourceFile,
    ViolationCollector,
};
pub use probe::{probe, Classification, Probe, DEFAULT_MAX_ITERATIONS, MIN_ITERATIONS};
