//! Decision by saturating binary resolution.
//!
//! The reference procedure: resolve every clause pair until either the empty
//! clause appears (UNSAT) or a full pass adds nothing new (SAT). Complete but
//! exponential, so it serves as an oracle for small instances rather than a
//! production solver.

use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use log::debug;
use rustc_hash::FxHashSet;

use quadsat_formula::{Clause, CnfFormula};

use crate::cancel::CancelToken;
use crate::load::clause_set;
use crate::verdict::Verdict;

/// Decide a formula by saturation.
pub fn solve(formula: &CnfFormula, cancel: &CancelToken) -> Verdict {
    let mut known = clause_set(formula);
    if known.iter().any(|clause| clause.is_empty()) {
        return Verdict::Unsat;
    }

    loop {
        if cancel.is_cancelled() {
            return Verdict::Unknown;
        }

        let snapshot = sorted_snapshot(&known);
        let mut fresh = FxHashSet::default();

        for (first, clause) in snapshot.iter().enumerate() {
            for other in &snapshot[first + 1..] {
                match resolve_pair(clause, other, &known, &mut fresh) {
                    PairOutcome::Empty => return Verdict::Unsat,
                    PairOutcome::Continue => {}
                }
            }
        }

        debug!(
            "resolution pass over {} clauses derived {} new",
            snapshot.len(),
            fresh.len()
        );

        if fresh.is_empty() {
            return Verdict::Sat;
        }
        known.extend(fresh);
    }
}

/// Decide a formula by saturation with the pass fanned out over workers.
///
/// Each pass freezes the current clause set; workers resolve disjoint index
/// ranges of it against everything after them, collecting resolvents locally.
/// The pass barrier merges the local sets, so the verdict matches the
/// sequential procedure on every input.
pub fn solve_parallel(formula: &CnfFormula, threads: usize, cancel: &CancelToken) -> Verdict {
    debug_assert!(threads > 0);
    let mut known = clause_set(formula);
    if known.iter().any(|clause| clause.is_empty()) {
        return Verdict::Unsat;
    }

    loop {
        if cancel.is_cancelled() {
            return Verdict::Unknown;
        }

        let snapshot = sorted_snapshot(&known);
        let found_empty = AtomicBool::new(false);

        let chunk_size = snapshot.len() / threads + 1;
        let locals: Vec<FxHashSet<Clause>> = thread::scope(|scope| {
            let workers: Vec<_> = (0..threads)
                .map(|worker| {
                    let start = (worker * chunk_size).min(snapshot.len());
                    let end = (start + chunk_size).min(snapshot.len());
                    let snapshot = &snapshot;
                    let known = &known;
                    let found_empty = &found_empty;
                    scope.spawn(move || resolve_range(snapshot, start..end, known, found_empty))
                })
                .collect();
            workers
                .into_iter()
                .map(|worker| worker.join().expect("resolution worker panicked"))
                .collect()
        });

        if found_empty.into_inner() {
            return Verdict::Unsat;
        }

        let mut fresh = FxHashSet::default();
        for local in locals {
            fresh.extend(local.into_iter().filter(|clause| !known.contains(clause)));
        }

        debug!(
            "parallel resolution pass over {} clauses derived {} new",
            snapshot.len(),
            fresh.len()
        );

        if fresh.is_empty() {
            return Verdict::Sat;
        }
        known.extend(fresh);
    }
}

/// Resolve `snapshot[range]` against all later clauses into a local set.
///
/// The first derivation of the empty clause raises `found_empty` and stops
/// the worker; the remaining pairs do not matter at that point.
fn resolve_range(
    snapshot: &[Clause],
    range: Range<usize>,
    known: &FxHashSet<Clause>,
    found_empty: &AtomicBool,
) -> FxHashSet<Clause> {
    let mut local = FxHashSet::default();

    for first in range {
        if found_empty.load(Ordering::Relaxed) {
            break;
        }
        for other in &snapshot[first + 1..] {
            match resolve_pair(&snapshot[first], other, known, &mut local) {
                PairOutcome::Empty => {
                    found_empty.store(true, Ordering::Relaxed);
                    return local;
                }
                PairOutcome::Continue => {}
            }
        }
    }

    local
}

enum PairOutcome {
    /// The resolvent was the empty clause.
    Empty,
    Continue,
}

/// Resolve one clause pair, stashing a useful resolvent in `fresh`.
///
/// Pairs without complementary literals, tautological resolvents and clauses
/// already known are all skipped.
fn resolve_pair(
    clause: &Clause,
    other: &Clause,
    known: &FxHashSet<Clause>,
    fresh: &mut FxHashSet<Clause>,
) -> PairOutcome {
    if let Some(pivot) = clause.resolvable(other) {
        let resolvent = clause.resolve_on(other, pivot);
        if resolvent.is_empty() {
            return PairOutcome::Empty;
        }
        if !resolvent.is_tautology() && !known.contains(&resolvent) {
            fresh.insert(resolvent);
        }
    }
    PairOutcome::Continue
}

/// The clause set as a sorted list, fixing the pass iteration order.
fn sorted_snapshot(known: &FxHashSet<Clause>) -> Vec<Clause> {
    let mut snapshot: Vec<Clause> = known.iter().cloned().collect();
    snapshot.sort_unstable();
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use quadsat_formula::cnf::strategy::cnf_formula;
    use quadsat_formula::cnf_formula;

    use crate::test::brute_force_satisfiable;

    #[test]
    fn empty_formula_is_sat() {
        let formula = CnfFormula::new();
        assert_eq!(solve(&formula, &CancelToken::new()), Verdict::Sat);
    }

    #[test]
    fn empty_clause_is_unsat() {
        let formula = cnf_formula![
            1, 2;
            ;
        ];
        assert_eq!(solve(&formula, &CancelToken::new()), Verdict::Unsat);
    }

    #[test]
    fn contradictory_units_are_unsat() {
        let formula = cnf_formula![
            1;
            -1;
        ];
        assert_eq!(solve(&formula, &CancelToken::new()), Verdict::Unsat);
    }

    #[test]
    fn chained_implications_are_sat() {
        let formula = cnf_formula![
            1, 2;
            -1, 3;
            -2, -3;
        ];
        assert_eq!(solve(&formula, &CancelToken::new()), Verdict::Sat);
    }

    #[test]
    fn cancelled_runs_report_unknown() {
        let formula = cnf_formula![
            1, 2;
        ];
        let cancel = CancelToken::new();
        cancel.cancel();
        assert_eq!(solve(&formula, &cancel), Verdict::Unknown);
        assert_eq!(solve_parallel(&formula, 2, &cancel), Verdict::Unknown);
    }

    proptest! {
        #[test]
        fn agrees_with_brute_force(formula in cnf_formula(1..7usize, 0..12, 0..4)) {
            let expected = if brute_force_satisfiable(&formula) {
                Verdict::Sat
            } else {
                Verdict::Unsat
            };
            prop_assert_eq!(solve(&formula, &CancelToken::new()), expected);
        }

        #[test]
        fn parallel_matches_sequential(
            formula in cnf_formula(1..7usize, 0..12, 0..4),
            threads in 1..4usize,
        ) {
            prop_assert_eq!(
                solve_parallel(&formula, threads, &CancelToken::new()),
                solve(&formula, &CancelToken::new())
            );
        }
    }
}
