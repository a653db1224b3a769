//! Violation collection across a file set
//!
//! Every file is probed independently on the rayon pool; results are sorted
//! by path before anything is reported so output never depends on thread
//! scheduling. The collector is pure: it returns the writes, diagnostics and
//! report text and leaves all filesystem access to the caller.

use std::collections::HashSet;
use std::fmt::Write as _;

use glob::Pattern;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::DEFAULT_DIAGNOSE_DIR;
use crate::diff::{annotations, DiffReport, FileDiff, Glyphs, ReportLimits};
use crate::error::StepError;
use crate::process::probe::{probe, Classification, Probe, DEFAULT_MAX_ITERATIONS};
use crate::step::Formatter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Report violations, never write.
    Check,
    /// Produce the safe output for every violation.
    Apply,
}

/// One input file, already decoded by the I/O layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Root-relative path with `/` separators.
    pub path: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Per-(path, step) enforcement exemptions and error suppression.
#[derive(Debug, Clone, Default)]
pub struct Exemptions {
    skip_steps: HashSet<String>,
    skip_paths: Vec<Pattern>,
    skip_step_paths: Vec<(String, Pattern)>,
    ignore_error_steps: HashSet<String>,
    ignore_error_paths: Vec<Pattern>,
}

impl Exemptions {
    #[must_use]
    pub fn skip_step(mut self, step: impl Into<String>) -> Self {
        self.skip_steps.insert(step.into());
        self
    }

    #[must_use]
    pub fn skip_path(mut self, pattern: Pattern) -> Self {
        self.skip_paths.push(pattern);
        self
    }

    #[must_use]
    pub fn skip_step_for_path(mut self, step: impl Into<String>, pattern: Pattern) -> Self {
        self.skip_step_paths.push((step.into(), pattern));
        self
    }

    #[must_use]
    pub fn ignore_errors_for_step(mut self, step: impl Into<String>) -> Self {
        self.ignore_error_steps.insert(step.into());
        self
    }

    #[must_use]
    pub fn ignore_errors_for_path(mut self, pattern: Pattern) -> Self {
        self.ignore_error_paths.push(pattern);
        self
    }

    /// The whole file is exempt from every step.
    #[must_use]
    pub fn skips_path(&self, path: &str) -> bool {
        self.skip_paths.iter().any(|p| p.matches(path))
    }

    /// `step` must not run on `path`.
    #[must_use]
    pub fn skips_step(&self, step: &str, path: &str) -> bool {
        self.skip_steps.contains(step)
            || self
                .skip_step_paths
                .iter()
                .any(|(name, pattern)| name == step && pattern.matches(path))
    }

    /// A failure of `step` on `path` is tolerated.
    #[must_use]
    pub fn ignores_error(&self, step: &str, path: &str) -> bool {
        self.ignore_error_steps.contains(step)
            || self.ignore_error_paths.iter().any(|p| p.matches(path))
    }

    fn has_step_skips(&self) -> bool {
        !self.skip_steps.is_empty() || !self.skip_step_paths.is_empty()
    }
}

/// Tunables consumed by the collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub max_iterations: usize,
    pub padded_cell: bool,
    pub limits: ReportLimits,
    pub glyphs: Glyphs,
    /// Emit GitHub Actions `::error` commands for check-mode diffs, with
    /// paths under this workspace prefix (see [`annotations::workspace_prefix`]).
    pub annotations: Option<String>,
    /// Where diagnostics for this format end up, as shown to the user.
    pub diagnose_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            padded_cell: false,
            limits: ReportLimits::default(),
            glyphs: Glyphs::FANCY,
            annotations: None,
            diagnose_dir: DEFAULT_DIAGNOSE_DIR.to_string(),
        }
    }
}

/// Terminal state of one file.
#[derive(Debug)]
pub enum FileResult {
    /// Exempted by a path pattern.
    Skipped,
    Probed(Probe),
    Failed(StepError),
}

#[derive(Debug)]
pub struct FileOutcome {
    pub path: String,
    pub result: FileResult,
}

impl FileOutcome {
    #[must_use]
    pub fn probe(&self) -> Option<&Probe> {
        match &self.result {
            FileResult::Probed(p) => Some(p),
            _ => None,
        }
    }
}

/// An orbit member to persist for debugging a misbehaving rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticFile {
    /// `<path>.<format><index>`, index starting at 1.
    pub name: String,
    pub content: String,
}

/// Everything a run produced, in path order.
#[derive(Debug)]
pub struct RunOutcome {
    pub mode: Mode,
    pub format: String,
    pub files: Vec<FileOutcome>,
    /// Check mode: the rendered violation report, if anything is reported.
    pub report: Option<String>,
    /// Set when a cycling or diverging rule needs attention.
    pub misbehaving: Option<String>,
    /// Apply mode: `(path, safe output)` pairs to write back verbatim.
    pub writes: Vec<(String, String)>,
    pub diagnostics: Vec<DiagnosticFile>,
    pub annotations: Vec<String>,
    pub failed: bool,
}

impl RunOutcome {
    pub fn errors(&self) -> impl Iterator<Item = (&str, &StepError)> {
        self.files.iter().filter_map(|f| match &f.result {
            FileResult::Failed(err) => Some((f.path.as_str(), err)),
            _ => None,
        })
    }
}

/// Applies one formatter to many files and decides what to report or write.
#[derive(Debug, Clone)]
pub struct ViolationCollector<'f> {
    formatter: &'f Formatter,
    settings: Settings,
    exemptions: Exemptions,
}

impl<'f> ViolationCollector<'f> {
    #[must_use]
    pub fn new(formatter: &'f Formatter, settings: Settings) -> Self {
        Self {
            formatter,
            settings,
            exemptions: Exemptions::default(),
        }
    }

    #[must_use]
    pub fn with_exemptions(mut self, exemptions: Exemptions) -> Self {
        self.exemptions = exemptions;
        self
    }

    /// Probe a single file with exemptions applied.
    #[must_use]
    pub fn process_file(&self, file: &SourceFile) -> FileResult {
        let path = file.path.as_str();
        if self.exemptions.skips_path(path) {
            debug!("Skipping {path} (exempt)");
            return FileResult::Skipped;
        }
        debug!("Applying format '{}' to {path}", self.formatter.name());

        let narrowed;
        let formatter = if self.exemptions.has_step_skips() {
            narrowed = self
                .formatter
                .with_chain(
                    self.formatter
                        .chain()
                        .without(|step| self.exemptions.skips_step(step, path)),
                );
            &narrowed
        } else {
            self.formatter
        };

        let result = probe(&file.content, self.settings.max_iterations, |input| {
            formatter.compute_with(input, |err| {
                if self.exemptions.ignores_error(&err.step, path) {
                    warn!("Ignoring error in {path}: {err}");
                    Ok(())
                } else {
                    Err(err)
                }
            })
        });
        match result {
            Ok(p) => FileResult::Probed(p),
            Err(err) => FileResult::Failed(err),
        }
    }

    /// Probe every file in parallel and settle the run.
    #[must_use]
    pub fn run(&self, mode: Mode, files: &[SourceFile]) -> RunOutcome {
        let mut outcomes: Vec<FileOutcome> = files
            .par_iter()
            .map(|file| FileOutcome {
                path: file.path.clone(),
                result: self.process_file(file),
            })
            .collect();
        outcomes.sort_by(|a, b| a.path.cmp(&b.path));

        let mut run = RunOutcome {
            mode,
            format: self.formatter.name().to_string(),
            files: Vec::new(),
            report: None,
            misbehaving: None,
            writes: Vec::new(),
            diagnostics: Vec::new(),
            annotations: Vec::new(),
            failed: false,
        };

        let mut report = DiffReport::new(self.settings.limits).with_glyphs(self.settings.glyphs);
        let mut misbehaving: Vec<(&str, &Probe)> = Vec::new();
        let mut any_violation = false;
        let mut any_error = false;

        for outcome in &outcomes {
            let path = outcome.path.as_str();
            let probe = match &outcome.result {
                FileResult::Skipped => continue,
                FileResult::Failed(err) => {
                    warn!("Error formatting {path}: {err}");
                    any_error = true;
                    run.failed = true;
                    continue;
                }
                FileResult::Probed(p) if p.is_clean() => continue,
                FileResult::Probed(p) => p,
            };
            any_violation = true;
            debug!("{path}: {}", probe.classification());

            if self.settings.padded_cell && probe.is_misbehaved() {
                run.diagnostics.extend(self.diagnostics_for(path, probe));
                warn!(
                    "{path}: format '{}' {}",
                    self.formatter.name(),
                    probe.user_message()
                );
            }

            match mode {
                Mode::Apply => {
                    if probe.has_violation() {
                        run.writes
                            .push((path.to_string(), probe.safe_output().to_string()));
                    }
                    if !self.settings.padded_cell && is_unstable(probe) {
                        misbehaving.push((path, probe));
                    }
                }
                Mode::Check => {
                    if !self.settings.padded_cell && is_unstable(probe) {
                        misbehaving.push((path, probe));
                        continue;
                    }
                    if probe.has_violation() {
                        self.add_to_report(&mut report, &mut run.annotations, path, probe);
                        if !self.settings.padded_cell || !probe.is_misbehaved() {
                            run.failed = true;
                        }
                    }
                }
            }
        }

        if self.settings.padded_cell && !any_violation && !any_error {
            info!(
                "format '{}' is in padded-cell mode, but it doesn't need to be",
                self.formatter.name()
            );
        }
        if !report.is_empty() {
            run.report = Some(report.render());
        }
        if let Some((first_path, first)) = misbehaving.first() {
            run.failed = true;
            run.diagnostics = self.diagnostics_for(first_path, first);
            run.misbehaving = Some(self.misbehaving_message(mode, &misbehaving));
        }

        run.files = outcomes;
        run
    }

    fn add_to_report(
        &self,
        report: &mut DiffReport,
        commands: &mut Vec<String>,
        path: &str,
        probe: &Probe,
    ) {
        let Some(prefix) = &self.settings.annotations else {
            report.add_diff(path, probe.original(), probe.safe_output());
            return;
        };
        let diff = FileDiff::compute(probe.original(), probe.safe_output());
        let annotated = annotations::workspace_path(prefix, path);
        commands.extend(annotations::error_commands(&annotated, &diff));
        report.add(path, diff.render(&self.settings.glyphs));
    }

    fn diagnostics_for(&self, path: &str, probe: &Probe) -> Vec<DiagnosticFile> {
        probe
            .orbit()
            .iter()
            .enumerate()
            .map(|(i, content)| DiagnosticFile {
                name: format!("{path}.{}{}", self.formatter.name(), i + 1),
                content: content.clone(),
            })
            .collect()
    }

    fn misbehaving_message(&self, mode: Mode, files: &[(&str, &Probe)]) -> String {
        let (first_path, first) = files[0];
        let mut msg = String::new();
        msg.push_str("You have a misbehaving rule which can't make up its mind.\n");
        msg.push_str("This means that 'padcell check' will fail even after 'padcell apply' has run.\n\n");
        let _ = writeln!(msg, "The file in question is {first_path}");
        let _ = writeln!(
            msg,
            "Format '{}' {} ({})",
            self.formatter.name(),
            first.user_message(),
            first.classification()
        );
        if files.len() > 1 {
            let others: Vec<&str> = files[1..].iter().map(|(p, _)| *p).collect();
            let _ = writeln!(msg, "Also affected: {}", others.join(", "));
        }
        if mode == Mode::Apply {
            msg.push_str(
                "Cycling files were written with the first member of the cycle; \
                 diverging files were left unchanged.\n",
            );
        }
        let _ = writeln!(
            msg,
            "You can find intermediate results for {first_path} in {}",
            self.settings.diagnose_dir
        );
        msg.push('\n');
        msg.push_str("This is a bug in a formatting rule, not padcell itself, but padcell can work\n");
        msg.push_str("around it if you re-run with --padded-cell (or set `padded_cell = true` in\n");
        msg.push_str("padcell.toml).\n");
        msg
    }
}

/// Cycles and divergences can't be fixed by a single apply.
fn is_unstable(probe: &Probe) -> bool {
    matches!(
        probe.classification(),
        Classification::Cycle { .. } | Classification::Diverge
    )
}
