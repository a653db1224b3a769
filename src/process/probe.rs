//! Padded-cell idempotency probing
//!
//! A formatter `F` is expected to satisfy `F(F(x)) == F(x)`. When it does not,
//! the orbit `C1 = F(C0), C2 = F(C1), ...` is followed for a bounded number of
//! applications and classified, and a stable output is chosen:
//!
//! | classification | orbit recorded             | safe output         |
//! |----------------|----------------------------|---------------------|
//! | well-behaved   | `C1`                       | `C1`                |
//! | converge       | `C1 ..= Ck` (`Ck` fixed)   | `Ck`                |
//! | cycle          | the repeating block        | first cycle member  |
//! | diverge        | all computed values        | `C0` (unchanged)    |

use std::fmt;

/// Number of applications of `F` before giving up and calling it divergent.
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Smallest bound that can tell a fixed point from a change.
pub const MIN_ITERATIONS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// `F(C1) == C1`. Clean when additionally `C1 == C0`.
    WellBehaved,
    /// A fixed point was reached after at least two distinct outputs.
    Converge,
    /// The orbit revisits an earlier value; `len` members repeat.
    Cycle { len: usize },
    /// No fixed point or cycle within the iteration bound.
    Diverge,
}

impl Classification {
    #[must_use]
    pub fn is_misbehaved(self) -> bool {
        self != Classification::WellBehaved
    }

    /// Short lowercase label used in logs and summaries.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Classification::WellBehaved => "well-behaved",
            Classification::Converge => "converge",
            Classification::Cycle { .. } => "cycle",
            Classification::Diverge => "diverge",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Cycle { len } => write!(f, "cycle({len})"),
            other => f.write_str(other.label()),
        }
    }
}

/// Outcome of probing one original content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    original: String,
    classification: Classification,
    orbit: Vec<String>,
    safe_output: String,
}

impl Probe {
    #[must_use]
    pub fn classification(&self) -> Classification {
        self.classification
    }

    #[must_use]
    pub fn original(&self) -> &str {
        &self.original
    }

    /// The value to write back in apply mode.
    #[must_use]
    pub fn safe_output(&self) -> &str {
        &self.safe_output
    }

    /// Orbit members kept for diagnosis (empty for clean content).
    #[must_use]
    pub fn orbit(&self) -> &[String] {
        &self.orbit
    }

    /// The first application left the content untouched.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.orbit.is_empty()
    }

    #[must_use]
    pub fn is_misbehaved(&self) -> bool {
        self.classification.is_misbehaved()
    }

    /// The safe output differs from what is on disk.
    #[must_use]
    pub fn has_violation(&self) -> bool {
        self.safe_output != self.original
    }

    /// Human readable description, e.g. `cycles between 2 steps`.
    #[must_use]
    pub fn user_message(&self) -> String {
        let n = self.orbit.len();
        match self.classification {
            Classification::WellBehaved if self.is_clean() => "is clean".to_string(),
            Classification::WellBehaved => "converges after 1 step".to_string(),
            Classification::Converge => format!("converges after {n} steps"),
            Classification::Cycle { len } => format!("cycles between {len} steps"),
            Classification::Diverge => format!("diverges after {n} steps"),
        }
    }
}

/// Follow the orbit of `original` under `format` and classify it.
///
/// `format` is applied at most `max_iterations` times (clamped to
/// [`MIN_ITERATIONS`]). Errors from `format` are returned untouched; the
/// classification itself cannot fail.
pub fn probe<F, E>(original: &str, max_iterations: usize, mut format: F) -> Result<Probe, E>
where
    F: FnMut(&str) -> Result<String, E>,
{
    let max_iterations = max_iterations.max(MIN_ITERATIONS);

    let first = format(original)?;
    if first == original {
        return Ok(Probe {
            original: original.to_string(),
            classification: Classification::WellBehaved,
            orbit: Vec::new(),
            safe_output: first,
        });
    }

    let mut history = vec![first];
    for _ in 1..max_iterations {
        let current = history.last().map_or(original, String::as_str);
        let next = format(current)?;

        if next == current {
            let classification = if history.len() == 1 {
                Classification::WellBehaved
            } else {
                Classification::Converge
            };
            return Ok(Probe {
                original: original.to_string(),
                classification,
                safe_output: next,
                orbit: history,
            });
        }

        if let Some(start) = history.iter().position(|seen| *seen == next) {
            let cycle = history.split_off(start);
            return Ok(Probe {
                original: original.to_string(),
                classification: Classification::Cycle { len: cycle.len() },
                safe_output: cycle[0].clone(),
                orbit: cycle,
            });
        }

        history.push(next);
    }

    Ok(Probe {
        original: original.to_string(),
        classification: Classification::Diverge,
        orbit: history,
        safe_output: original.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;

    fn run(input: &str, f: impl Fn(&str) -> String) -> Probe {
        probe(input, DEFAULT_MAX_ITERATIONS, |s| Ok::<_, Infallible>(f(s))).unwrap()
    }

    #[test]
    fn test_identity_is_clean() {
        let p = run("CCC", str::to_string);
        assert_eq!(p.classification(), Classification::WellBehaved);
        assert!(p.is_clean());
        assert!(!p.has_violation());
        assert_eq!(p.safe_output(), "CCC");
    }

    #[test]
    fn test_constant_is_well_behaved_violation() {
        let p = run("CCC", |_| "A".to_string());
        assert_eq!(p.classification(), Classification::WellBehaved);
        assert!(!p.is_clean());
        assert!(p.has_violation());
        assert_eq!(p.orbit(), ["A"]);
        assert_eq!(p.safe_output(), "A");
    }

    #[test]
    fn test_ping_pong() {
        let p = run("CCC", |s| if s == "A" { "B" } else { "A" }.to_string());
        assert_eq!(p.classification(), Classification::Cycle { len: 2 });
        assert_eq!(p.orbit(), ["A", "B"]);
        assert_eq!(p.safe_output(), "A");
        assert_eq!(p.user_message(), "cycles between 2 steps");
    }

    #[test]
    fn test_four_state_cycle() {
        let p = run("CCC", |s| {
            match s {
                "A" => "B",
                "B" => "C",
                "C" => "D",
                _ => "A",
            }
            .to_string()
        });
        assert_eq!(p.classification(), Classification::Cycle { len: 4 });
        assert_eq!(p.orbit(), ["A", "B", "C", "D"]);
        assert_eq!(p.safe_output(), "A");
    }

    #[test]
    fn test_cycle_through_original_starts_at_first_output() {
        let p = run("CCC", |s| if s == "A" { "CCC" } else { "A" }.to_string());
        assert_eq!(p.classification(), Classification::Cycle { len: 2 });
        assert_eq!(p.orbit(), ["A", "CCC"]);
        assert_eq!(p.safe_output(), "A");
    }

    #[test]
    fn test_converging() {
        let p = run("CCC", |s| {
            let mut s = s.to_string();
            s.pop();
            s
        });
        assert_eq!(p.classification(), Classification::Converge);
        assert_eq!(p.orbit(), ["CC", "C", ""]);
        assert_eq!(p.safe_output(), "");
        assert_eq!(p.user_message(), "converges after 3 steps");
    }

    #[test]
    fn test_diverging() {
        let p = run("", |s| format!("{s} "));
        assert_eq!(p.classification(), Classification::Diverge);
        assert_eq!(p.orbit().len(), DEFAULT_MAX_ITERATIONS);
        assert_eq!(p.orbit()[0], " ");
        assert_eq!(p.orbit()[9], " ".repeat(10));
        assert_eq!(p.safe_output(), "");
        assert!(!p.has_violation());
        assert!(p.is_misbehaved());
    }

    #[test]
    fn test_iteration_bound_is_respected() {
        let mut calls = 0;
        let p = probe("x", 4, |s| {
            calls += 1;
            Ok::<_, Infallible>(format!("{s}x"))
        })
        .unwrap();
        assert_eq!(calls, 4);
        assert_eq!(p.classification(), Classification::Diverge);
    }

    #[test]
    fn test_bound_below_minimum_is_clamped() {
        let p = probe("CCC", 0, |_| Ok::<_, Infallible>("A".to_string())).unwrap();
        assert_eq!(p.classification(), Classification::WellBehaved);
    }

    #[test]
    fn test_format_errors_propagate() {
        let err = probe("x", 10, |_| Err::<String, _>("broken")).unwrap_err();
        assert_eq!(err, "broken");
    }
}
