use std::{
    fmt::Display,
    str::FromStr,
    time::{Duration, Instant},
};

use crate::formula::{Cnf, Model};

mod dp;
mod dpll;
mod resolution;

pub use dp::DpEngine;
pub use dpll::DpllEngine;
pub use resolution::ResolutionEngine;

/// The closed set of decision procedures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Dp,
    Dpll,
    Resolution,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [Algorithm::Dp, Algorithm::Dpll, Algorithm::Resolution];

    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Dp => "dp",
            Algorithm::Dpll => "dpll",
            Algorithm::Resolution => "resolution",
        }
    }
}

impl FromStr for Algorithm {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dp" => Ok(Algorithm::Dp),
            "dpll" => Ok(Algorithm::Dpll),
            "resolution" => Ok(Algorithm::Resolution),
            _ => Err(()),
        }
    }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A wall-clock budget for one engine invocation.
///
/// Engines poll `is_expired` once per step (branch, elimination,
/// resolution pair) and unwind with [`Interrupted`] when it trips,
/// which keeps abort points deterministic for a fixed input.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn new(budget: Duration) -> Self {
        Deadline {
            start: Instant::now(),
            budget,
        }
    }

    /// A deadline far enough away that it never trips in practice.
    pub fn unbounded() -> Self {
        Deadline::new(Duration::from_secs(u32::MAX as u64))
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn is_expired(&self) -> bool {
        self.start.elapsed() >= self.budget
    }

    /// Unwinds the current engine invocation if the budget is spent.
    pub fn check(&self) -> Result<(), Interrupted> {
        if self.is_expired() {
            Err(Interrupted)
        } else {
            Ok(())
        }
    }
}

/// Marker returned when an engine observed its deadline and gave up.
/// A timeout is an expected outcome of exponential search, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

/// Verdict of a completed engine invocation.
///
/// The model is present only when the engine constructs witnesses:
/// DPLL does, DP and resolution decide satisfiability without one.
#[derive(Debug)]
pub enum Outcome {
    Sat(Option<Model>),
    Unsat,
}

impl Outcome {
    pub fn is_sat(&self) -> bool {
        matches!(self, Outcome::Sat(_))
    }

    pub fn model(&self) -> Option<&Model> {
        match self {
            Outcome::Sat(model) => model.as_ref(),
            Outcome::Unsat => None,
        }
    }
}

pub trait Engine {
    /// Creates a new engine instance owning a private working copy
    /// of the formula.
    fn new(formula: Cnf) -> Self;

    /// Decides satisfiability of the formula, polling `deadline`
    /// between steps.
    fn solve(self, deadline: &Deadline) -> Result<Outcome, Interrupted>;
}

/// Runs the selected engine on `formula` under `deadline`.
pub fn solve(formula: Cnf, algorithm: Algorithm, deadline: &Deadline) -> Result<Outcome, Interrupted> {
    match algorithm {
        Algorithm::Dp => DpEngine::new(formula).solve(deadline),
        Algorithm::Dpll => DpllEngine::new(formula).solve(deadline),
        Algorithm::Resolution => ResolutionEngine::new(formula).solve(deadline),
    }
}
