//! Decision by Davis-Putnam variable elimination.
//!
//! Variables are eliminated in numerical order. Each round first saturates
//! unit propagation, then splits the remaining clauses by their polarity on
//! the eliminated variable and replaces both sides with their pairwise
//! resolvents. The empty resolvent refutes the formula; surviving every
//! elimination proves it satisfiable.

use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use log::debug;
use rustc_hash::FxHashSet;

use quadsat_formula::{Clause, CnfFormula, Lit, Var};

use crate::assignment::Assignment;
use crate::cancel::CancelToken;
use crate::load::clause_set;
use crate::prop::propagate;
use crate::verdict::Verdict;

/// Decide a formula by ordered variable elimination.
pub fn solve(formula: &CnfFormula, cancel: &CancelToken) -> Verdict {
    run(formula, None, cancel)
}

/// Decide a formula by variable elimination with parallel resolvent passes.
///
/// Workers split the positive-occurrence clauses of the eliminated variable
/// into disjoint ranges and resolve each range against all negative
/// occurrences, merging the local resolvent sets at the end of the round.
/// The verdict matches the sequential procedure on every input.
pub fn solve_parallel(formula: &CnfFormula, threads: usize, cancel: &CancelToken) -> Verdict {
    debug_assert!(threads > 0);
    run(formula, Some(threads), cancel)
}

fn run(formula: &CnfFormula, threads: Option<usize>, cancel: &CancelToken) -> Verdict {
    let mut active = clause_set(formula);
    if active.iter().any(|clause| clause.is_empty()) {
        return Verdict::Unsat;
    }

    let mut assignment = Assignment::new(formula.var_count());

    for index in 0..formula.var_count() {
        if cancel.is_cancelled() {
            return Verdict::Unknown;
        }
        if active.is_empty() {
            break;
        }

        let mut clauses: Vec<Clause> = active.drain().collect();
        clauses.sort_unstable();

        if propagate(&clauses, &mut assignment).is_err() {
            return Verdict::Unsat;
        }

        let var = Var::from_index(index);
        let (pos, neg, rest) = partition(&clauses, var, &assignment);

        debug!(
            "eliminating {}: {} positive, {} negative, {} untouched clauses",
            var,
            pos.len(),
            neg.len(),
            rest.len()
        );

        active = rest;
        let outcome = match threads {
            Some(threads) if threads > 1 => {
                resolve_sides_parallel(&pos, &neg, threads, &mut active)
            }
            _ => resolve_sides(&pos, &neg, 0..pos.len(), &mut active),
        };
        if let SideOutcome::Empty = outcome {
            return Verdict::Unsat;
        }
    }

    Verdict::Sat
}

/// Split the clauses on their polarity at `var`, reduced by the assignment.
///
/// Satisfied clauses are dropped and false literals stripped; the returned
/// positive and negative sides already exclude the pivot literal itself.
fn partition(
    clauses: &[Clause],
    var: Var,
    assignment: &Assignment,
) -> (Vec<Clause>, Vec<Clause>, FxHashSet<Clause>) {
    let positive = Lit::from_var(var, true);

    let mut pos = vec![];
    let mut neg = vec![];
    let mut rest = FxHashSet::default();

    for clause in clauses {
        let mut satisfied = false;
        let mut has_pos = false;
        let mut has_neg = false;
        let mut reduced = vec![];

        for &lit in clause {
            match assignment.lit_value(lit) {
                Some(true) => {
                    satisfied = true;
                    break;
                }
                Some(false) => {}
                None if lit == positive => has_pos = true,
                None if lit == !positive => has_neg = true,
                None => reduced.push(lit),
            }
        }

        if satisfied {
            continue;
        }
        debug_assert!(
            !(has_pos && has_neg),
            "tautologies must not reach elimination"
        );

        let reduced = Clause::from_lits(reduced);
        if has_pos {
            pos.push(reduced);
        } else if has_neg {
            neg.push(reduced);
        } else {
            rest.insert(reduced);
        }
    }

    (pos, neg, rest)
}

enum SideOutcome {
    /// Some resolvent was the empty clause.
    Empty,
    Done,
}

/// Resolve `pos[range]` against every negative-side clause into `target`.
///
/// The sides arrive with the pivot already stripped, so a resolvent is a
/// plain union. Tautologies are dropped.
fn resolve_sides(
    pos: &[Clause],
    neg: &[Clause],
    range: Range<usize>,
    target: &mut FxHashSet<Clause>,
) -> SideOutcome {
    for first in range {
        for other in neg {
            let resolvent = Clause::from_lits(
                pos[first]
                    .lits()
                    .iter()
                    .chain(other.lits().iter())
                    .cloned(),
            );
            if resolvent.is_empty() {
                return SideOutcome::Empty;
            }
            if !resolvent.is_tautology() {
                target.insert(resolvent);
            }
        }
    }
    SideOutcome::Done
}

/// Fan [`resolve_sides`] out over worker threads with a merge barrier.
fn resolve_sides_parallel(
    pos: &[Clause],
    neg: &[Clause],
    threads: usize,
    target: &mut FxHashSet<Clause>,
) -> SideOutcome {
    let found_empty = AtomicBool::new(false);
    let chunk_size = pos.len() / threads + 1;

    let locals: Vec<FxHashSet<Clause>> = thread::scope(|scope| {
        let workers: Vec<_> = (0..threads)
            .map(|worker| {
                let start = (worker * chunk_size).min(pos.len());
                let end = (start + chunk_size).min(pos.len());
                let found_empty = &found_empty;
                scope.spawn(move || {
                    let mut local = FxHashSet::default();
                    for first in start..end {
                        if found_empty.load(Ordering::Relaxed) {
                            break;
                        }
                        if let SideOutcome::Empty =
                            resolve_sides(pos, neg, first..first + 1, &mut local)
                        {
                            found_empty.store(true, Ordering::Relaxed);
                            break;
                        }
                    }
                    local
                })
            })
            .collect();
        workers
            .into_iter()
            .map(|worker| worker.join().expect("elimination worker panicked"))
            .collect()
    });

    if found_empty.into_inner() {
        return SideOutcome::Empty;
    }

    for local in locals {
        target.extend(local);
    }
    SideOutcome::Done
}
