//! Solver configuration.
use std::str::FromStr;

/// Selects one of the four decision procedures.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EngineKind {
    /// Saturating binary resolution.
    Resolution,
    /// Davis-Putnam variable elimination.
    DavisPutnam,
    /// Backtracking search with unit propagation and pure literals.
    Dpll,
    /// Conflict driven clause learning.
    Cdcl,
}

impl Default for EngineKind {
    fn default() -> EngineKind {
        EngineKind::Cdcl
    }
}

impl FromStr for EngineKind {
    type Err = String;

    fn from_str(name: &str) -> Result<EngineKind, String> {
        match name {
            "resolution" => Ok(EngineKind::Resolution),
            "dp" => Ok(EngineKind::DavisPutnam),
            "dpll" => Ok(EngineKind::Dpll),
            "cdcl" => Ok(EngineKind::Cdcl),
            _ => Err(format!("unknown engine '{}'", name)),
        }
    }
}

/// Configurable parameters of a solver run.
#[derive(Clone, Debug)]
pub struct SolverConfig {
    /// Decision procedure to run. (Default: CDCL)
    pub engine: EngineKind,

    /// Worker threads for the parallel resolution and DP variants; 0 uses
    /// the available parallelism. (Default: 1)
    pub threads: usize,

    /// Seed for the CDCL branching RNG. Identical seeds give identical
    /// runs. (Default: 0)
    pub seed: u64,
}

impl Default for SolverConfig {
    fn default() -> SolverConfig {
        SolverConfig {
            engine: EngineKind::default(),
            threads: 1,
            seed: 0,
        }
    }
}
