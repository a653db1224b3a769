//! Step chains and the net formatting transform
//!
//! A [`StepChain`] is an ordered list of [`FormattingStep`]s applied left to
//! right. A [`Formatter`] wraps a chain with a line ending policy and is the
//! function `F` that the padded-cell prober iterates.

use std::fmt;
use std::sync::Arc;

use crate::error::{StepCause, StepError};
use crate::step::line_ending::{to_unix, LineEnding};

/// A pure text transform with a stable name.
///
/// Implementations must not keep per-call state: the same step instance is
/// shared across every file of a run, possibly from several threads.
pub trait FormattingStep: Send + Sync {
    fn name(&self) -> &str;

    fn format(&self, input: &str) -> Result<String, StepCause>;
}

type StepFn = dyn Fn(&str) -> Result<String, StepCause> + Send + Sync;

/// A step backed by a closure.
pub struct FnStep {
    name: String,
    func: Box<StepFn>,
}

impl FnStep {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&str) -> Result<String, StepCause> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(func),
        }
    }

    /// Wrap a closure that cannot fail.
    pub fn infallible<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self::new(name, move |input| Ok(func(input)))
    }
}

impl FormattingStep for FnStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn format(&self, input: &str) -> Result<String, StepCause> {
        (self.func)(input)
    }
}

impl fmt::Debug for FnStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStep").field("name", &self.name).finish()
    }
}

/// Ordered, immutable list of steps. The empty chain is the identity.
#[derive(Clone, Default)]
pub struct StepChain {
    steps: Vec<Arc<dyn FormattingStep>>,
}

impl StepChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step (builder style).
    #[must_use]
    pub fn with_step(mut self, step: impl FormattingStep + 'static) -> Self {
        self.steps.push(Arc::new(step));
        self
    }

    pub fn push(&mut self, step: Arc<dyn FormattingStep>) {
        self.steps.push(step);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step_names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.name())
    }

    /// A copy of this chain without the steps for which `skip` returns true.
    #[must_use]
    pub fn without<F>(&self, mut skip: F) -> Self
    where
        F: FnMut(&str) -> bool,
    {
        Self {
            steps: self
                .steps
                .iter()
                .filter(|s| !skip(s.name()))
                .cloned()
                .collect(),
        }
    }

    /// Run every step in order, stopping at the first failure.
    pub fn apply(&self, input: &str) -> Result<String, StepError> {
        self.apply_with(input, Err)
    }

    /// Run every step in order, routing failures through `on_error`.
    ///
    /// If `on_error` returns `Ok(())` the failing step is treated as the
    /// identity and the chain continues with the step's input.
    pub fn apply_with<F>(&self, input: &str, mut on_error: F) -> Result<String, StepError>
    where
        F: FnMut(StepError) -> Result<(), StepError>,
    {
        let mut current = input.to_string();
        for step in &self.steps {
            match step.format(&current) {
                Ok(next) => current = next,
                Err(cause) => on_error(StepError::new(step.name(), cause))?,
            }
        }
        Ok(current)
    }
}

impl fmt::Debug for StepChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.step_names()).finish()
    }
}

/// A named chain plus line ending policy: the net transform `F`.
#[derive(Debug, Clone)]
pub struct Formatter {
    name: String,
    chain: StepChain,
    line_ending: LineEnding,
}

impl Formatter {
    pub fn new(name: impl Into<String>, chain: StepChain, line_ending: LineEnding) -> Self {
        Self {
            name: name.into(),
            chain,
            line_ending,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn chain(&self) -> &StepChain {
        &self.chain
    }

    #[must_use]
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Same formatter with a different chain (used for per-path exemptions).
    #[must_use]
    pub fn with_chain(&self, chain: StepChain) -> Self {
        Self {
            name: self.name.clone(),
            chain,
            line_ending: self.line_ending,
        }
    }

    pub fn compute(&self, input: &str) -> Result<String, StepError> {
        self.compute_with(input, Err)
    }

    /// Normalize to `\n`, run the chain, then restore the policy's ending.
    pub fn compute_with<F>(&self, input: &str, on_error: F) -> Result<String, StepError>
    where
        F: FnMut(StepError) -> Result<(), StepError>,
    {
        let unix = to_unix(input);
        let formatted = self.chain.apply_with(&unix, on_error)?;
        Ok(self.line_ending.apply(&formatted, input))
    }
}
