//! The carrier every compilation step threads its diagnostics through.
//!
//! An [`Outcome`] couples a partial result with the diagnostics produced
//! while computing it. `Failed` short-circuits the branch it occurs in;
//! `Active` keeps the value moving while its errors accumulate, so one
//! run surfaces as many problems as possible.

use trellis_span::{Diagnostic, Errors};

/// Result of a compilation step.
///
/// Invariant: `Failed` always carries at least one diagnostic, while
/// `Active` may carry any number (partial success).
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Active(T, Errors<Diagnostic>),
    Failed(Errors<Diagnostic>),
}

use Outcome::{Active, Failed};

impl<T> Outcome<T> {
    /// A clean success.
    pub fn ok(value: T) -> Self {
        Active(value, Errors::new())
    }

    /// A success that still has something to report.
    pub fn with_errors(value: T, errors: impl Into<Errors<Diagnostic>>) -> Self {
        Active(value, errors.into())
    }

    /// A failure. Panics in debug builds if given no diagnostics, since a
    /// `Failed` without errors would be unreportable.
    pub fn failed(errors: impl Into<Errors<Diagnostic>>) -> Self {
        let errors = errors.into();
        debug_assert!(errors.has_errors(), "Failed outcome without diagnostics");
        Failed(errors)
    }

    /// A failure from a single diagnostic.
    pub fn error(diagnostic: Diagnostic) -> Self {
        Failed(Errors::from(diagnostic))
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Active(..))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Failed(_))
    }

    pub fn errors(&self) -> &Errors<Diagnostic> {
        match self {
            Active(_, errors) | Failed(errors) => errors,
        }
    }

    /// Appends a diagnostic without changing the state.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match self {
            Active(_, errors) | Failed(errors) => errors.push(diagnostic),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Active(value, errors) => Active(f(value), errors),
            Failed(errors) => Failed(errors),
        }
    }

    /// Monadic sequencing. A `Failed` short-circuits; an `Active` feeds
    /// its value forward and keeps its errors in front of whatever the
    /// continuation produces.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Outcome<U>) -> Outcome<U> {
        match self {
            Active(value, mut errors) => match f(value) {
                Active(next, rest) => {
                    errors.merge(rest);
                    Active(next, errors)
                }
                Failed(rest) => {
                    errors.merge(rest);
                    Failed(errors)
                }
            },
            Failed(errors) => Failed(errors),
        }
    }

    /// Converts `Failed` into `Active` around a fallback value.
    ///
    /// The fallback is only built when it is actually needed, so callers
    /// may pass a closure over expensive (or not-yet-available) state.
    pub fn recover(self, fallback: impl FnOnce() -> T) -> Outcome<T> {
        match self {
            active @ Active(..) => active,
            Failed(errors) => Active(fallback(), errors),
        }
    }

    /// Combines two outcomes, keeping the diagnostics of both sides even
    /// when one of them failed.
    pub fn both<U>(self, other: Outcome<U>) -> Outcome<(T, U)> {
        match (self, other) {
            (Active(a, mut errors), Active(b, rest)) => {
                errors.merge(rest);
                Active((a, b), errors)
            }
            (a, b) => {
                let mut errors = Errors::new();
                errors.merge(a.into_errors());
                errors.merge(b.into_errors());
                Failed(errors)
            }
        }
    }

    /// Runs every outcome, collecting the successes and *all* of the
    /// diagnostics. Never fails: siblings must not silence each other.
    pub fn do_all(outcomes: impl IntoIterator<Item = Outcome<T>>) -> Outcome<Vec<T>> {
        let mut values = Vec::new();
        let mut errors = Errors::new();
        for outcome in outcomes {
            match outcome {
                Active(value, rest) => {
                    values.push(value);
                    errors.merge(rest);
                }
                Failed(rest) => errors.merge(rest),
            }
        }
        Active(values, errors)
    }

    /// Drains the diagnostics into `report` and returns the value, if any.
    pub fn take(self, report: &mut Errors<Diagnostic>) -> Option<T> {
        match self {
            Active(value, errors) => {
                report.merge(errors);
                Some(value)
            }
            Failed(errors) => {
                report.merge(errors);
                None
            }
        }
    }

    fn into_errors(self) -> Errors<Diagnostic> {
        match self {
            Active(_, errors) | Failed(errors) => errors,
        }
    }
}
