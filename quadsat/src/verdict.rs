//! Solver verdicts.
use std::fmt;
use std::time::Duration;

use quadsat_formula::Lit;

/// The answer of a decision procedure.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// The formula has a model.
    Sat,
    /// The formula has no model.
    Unsat,
    /// The run was cancelled before reaching a verdict.
    Unknown,
}

impl Verdict {
    /// Whether the formula was actually decided.
    pub fn is_decided(self) -> bool {
        self != Verdict::Unknown
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Verdict::Sat => "SAT",
            Verdict::Unsat => "UNSAT",
            Verdict::Unknown => "UNKNOWN",
        };
        write!(f, "{}", name)
    }
}

/// The result of one solver run.
#[derive(Clone, Debug)]
pub struct Solution {
    /// The verdict for the formula.
    pub verdict: Verdict,
    /// A satisfying assignment, for engines that produce one on SAT.
    ///
    /// Variables missing from the model are unconstrained and can be set
    /// arbitrarily.
    pub model: Option<Vec<Lit>>,
    /// Wall-clock time of the decision procedure alone, excluding ingest.
    pub solve_time: Duration,
}
