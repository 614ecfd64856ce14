//! Top level solving interface.
use std::io;
use std::time::Instant;

use anyhow::Error;
use log::info;

use quadsat_dimacs::parse_dimacs;
use quadsat_formula::CnfFormula;

use crate::cancel::CancelToken;
use crate::cdcl;
use crate::config::{EngineKind, SolverConfig};
use crate::dp;
use crate::dpll;
use crate::resolution;
use crate::verdict::Solution;

/// A solver instance: a formula plus the configuration to decide it with.
#[derive(Default)]
pub struct Solver {
    formula: CnfFormula,
    config: SolverConfig,
    cancel: CancelToken,
}

impl Solver {
    /// A solver with the default configuration.
    pub fn new() -> Solver {
        Solver::default()
    }

    /// A solver with the given configuration.
    pub fn with_config(config: SolverConfig) -> Solver {
        Solver {
            config,
            ..Solver::default()
        }
    }

    /// Append a formula to the problem.
    pub fn add_formula(&mut self, formula: &CnfFormula) {
        self.formula.set_var_count(formula.var_count());
        for clause in formula.iter() {
            self.formula.add_clause(clause);
        }
    }

    /// Read and append a formula in DIMACS CNF format.
    pub fn add_dimacs_cnf(&mut self, input: impl io::Read) -> Result<(), Error> {
        let formula = parse_dimacs(input)?;
        info!(
            "parsed formula with {} variables and {} clauses",
            formula.var_count(),
            formula.len()
        );
        self.add_formula(&formula);
        Ok(())
    }

    /// A token that cancels a running [`solve`](Solver::solve), for handing
    /// to a watchdog thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Decide the current formula with the configured engine.
    ///
    /// The reported solve time covers the decision procedure only.
    pub fn solve(&mut self) -> Solution {
        let threads = match self.config.threads {
            0 => std::thread::available_parallelism()
                .map(|threads| threads.get())
                .unwrap_or(1),
            threads => threads,
        };

        let start = Instant::now();
        let (verdict, model) = match self.config.engine {
            EngineKind::Resolution if threads > 1 => (
                resolution::solve_parallel(&self.formula, threads, &self.cancel),
                None,
            ),
            EngineKind::Resolution => (resolution::solve(&self.formula, &self.cancel), None),
            EngineKind::DavisPutnam if threads > 1 => (
                dp::solve_parallel(&self.formula, threads, &self.cancel),
                None,
            ),
            EngineKind::DavisPutnam => (dp::solve(&self.formula, &self.cancel), None),
            EngineKind::Dpll => dpll::solve(&self.formula, &self.cancel),
            EngineKind::Cdcl => cdcl::solve(&self.formula, self.config.seed, &self.cancel),
        };
        let solve_time = start.elapsed();

        info!(
            "{:?} answered {} in {:.3} ms",
            self.config.engine,
            verdict,
            solve_time.as_secs_f64() * 1e3
        );

        Solution {
            verdict,
            model,
            solve_time,
        }
    }
}
