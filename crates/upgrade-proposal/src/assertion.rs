//! Post-condition assertions collected during validation

use serde::{Deserialize, Serialize};
use std::fmt;
use upgrade_chain::Amount;

/// A predicate that did not hold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionFailure {
    /// Assertion name
    pub name: String,
    /// What was observed
    pub detail: String,
}

impl AssertionFailure {
    /// Create failure
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.detail)
    }
}

/// Assertion collector handed to validation
///
/// `check` assertions are independent: every one is evaluated and each
/// failure is recorded. A failed `require` halts the set; every later
/// assertion is skipped and counted, not evaluated.
#[derive(Debug, Clone, Default)]
pub struct AssertionSet {
    failures: Vec<AssertionFailure>,
    halted_by: Option<String>,
    evaluated: usize,
    skipped: usize,
}

impl AssertionSet {
    /// Create empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an independent assertion; returns whether it held
    pub fn check(&mut self, name: impl Into<String>, holds: bool) -> bool {
        self.record(name.into(), holds, || "predicate did not hold".to_string(), false)
    }

    /// Record an independent assertion with a failure detail
    pub fn check_with(
        &mut self,
        name: impl Into<String>,
        holds: bool,
        detail: impl FnOnce() -> String,
    ) -> bool {
        self.record(name.into(), holds, detail, false)
    }

    /// Record a gating assertion; on failure later assertions are skipped
    pub fn require(&mut self, name: impl Into<String>, holds: bool) -> bool {
        self.record(name.into(), holds, || "precondition did not hold".to_string(), true)
    }

    /// Assert equality
    pub fn eq<T: PartialEq + fmt::Debug>(&mut self, name: impl Into<String>, actual: T, expected: T) -> bool {
        let holds = actual == expected;
        self.check_with(name, holds, || format!("expected {expected:?}, got {actual:?}"))
    }

    /// Assert `min <= value <= max`
    pub fn within(&mut self, name: impl Into<String>, value: Amount, min: Amount, max: Amount) -> bool {
        let holds = (min..=max).contains(&value);
        self.check_with(name, holds, || format!("{value} outside [{min}, {max}]"))
    }

    /// Assert `|actual - expected| <= tolerance`
    pub fn approx(
        &mut self,
        name: impl Into<String>,
        actual: Amount,
        expected: Amount,
        tolerance: Amount,
    ) -> bool {
        let holds = actual.abs_diff(expected) <= tolerance;
        self.check_with(name, holds, || {
            format!("{actual} not within {tolerance} of {expected}")
        })
    }

    fn record(
        &mut self,
        name: String,
        holds: bool,
        detail: impl FnOnce() -> String,
        gating: bool,
    ) -> bool {
        if self.halted_by.is_some() {
            self.skipped += 1;
            return false;
        }
        self.evaluated += 1;
        if !holds {
            self.failures.push(AssertionFailure::new(name.clone(), detail()));
            if gating {
                self.halted_by = Some(name);
            }
        }
        holds
    }

    /// Failures so far
    #[inline]
    #[must_use]
    pub fn failures(&self) -> &[AssertionFailure] {
        &self.failures
    }

    /// Name of the failed `require` that halted the set
    #[inline]
    #[must_use]
    pub fn halted_by(&self) -> Option<&str> {
        self.halted_by.as_deref()
    }

    /// Assertions evaluated
    #[inline]
    #[must_use]
    pub fn evaluated(&self) -> usize {
        self.evaluated
    }

    /// Assertions skipped after a halt
    #[inline]
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Check that nothing failed
    #[inline]
    #[must_use]
    pub fn all_held(&self) -> bool {
        self.failures.is_empty()
    }

    /// Take the failures
    #[must_use]
    pub fn into_failures(self) -> Vec<AssertionFailure> {
        self.failures
    }
}
