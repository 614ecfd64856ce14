//! Decision by DPLL backtracking search.
//!
//! Classic recursive search: saturate unit propagation, assign pure
//! literals, and branch on the first unassigned variable, trying `true`
//! before `false`. The state is the fixed clause list plus a growing partial
//! assignment; clauses are never rewritten.

use log::debug;

use quadsat_formula::{Clause, CnfFormula, Lit, Var};

use crate::assignment::Assignment;
use crate::cancel::CancelToken;
use crate::load::clause_list;
use crate::prop::propagate;
use crate::verdict::Verdict;

/// Decide a formula, returning a model on SAT.
///
/// The model covers the variables the search assigned; any others are
/// unconstrained.
pub fn solve(formula: &CnfFormula, cancel: &CancelToken) -> (Verdict, Option<Vec<Lit>>) {
    let clauses = clause_list(formula);
    if clauses.iter().any(|clause| clause.is_empty()) {
        return (Verdict::Unsat, None);
    }

    let mut assignment = Assignment::new(formula.var_count());
    match search(&clauses, &mut assignment, cancel) {
        Ok(true) => {
            debug!(
                "dpll found a model assigning {} of {} variables",
                assignment.assigned_count(),
                assignment.var_count()
            );
            (Verdict::Sat, Some(assignment.model()))
        }
        Ok(false) => (Verdict::Unsat, None),
        Err(Cancelled) => (Verdict::Unknown, None),
    }
}

/// Marker for a search abandoned through the cancel token.
struct Cancelled;

fn search(
    clauses: &[Clause],
    assignment: &mut Assignment,
    cancel: &CancelToken,
) -> Result<bool, Cancelled> {
    if cancel.is_cancelled() {
        return Err(Cancelled);
    }

    if propagate(clauses, assignment).is_err() {
        return Ok(false);
    }

    assign_pure_literals(clauses, assignment);

    let var = match branch_variable(clauses, assignment) {
        // Every clause is satisfied.
        None => return Ok(true),
        Some(var) => var,
    };

    for &value in &[true, false] {
        let mut child = assignment.clone();
        child.assign(Lit::from_var(var, value));
        if search(clauses, &mut child, cancel)? {
            *assignment = child;
            return Ok(true);
        }
    }

    Ok(false)
}

/// Assign every variable that occurs with a single polarity.
///
/// Occurrences are counted over the not yet satisfied clauses in one pass;
/// assignments made here do not trigger a recount, so a variable turned pure
/// by this very pass waits for the next recursion step.
fn assign_pure_literals(clauses: &[Clause], assignment: &mut Assignment) {
    let mut occurs = vec![false; 2 * assignment.var_count()];

    for clause in clauses {
        if clause.lits().iter().any(|&lit| assignment.lit_is_true(lit)) {
            continue;
        }
        for &lit in clause {
            if assignment.lit_value(lit).is_none() {
                occurs[lit.code()] = true;
            }
        }
    }

    for index in 0..assignment.var_count() {
        let var = Var::from_index(index);
        if assignment.var_value(var).is_some() {
            continue;
        }
        let positive = occurs[Lit::from_var(var, true).code()];
        let negative = occurs[Lit::from_var(var, false).code()];
        if positive != negative {
            assignment.assign(Lit::from_var(var, positive));
        }
    }
}

/// The first variable left undecided by clause-list iteration.
///
/// Scans the unsatisfied clauses in index order and picks the variable of
/// the first unassigned literal. `None` means every clause is satisfied:
/// unsatisfied clauses always hold an unassigned literal, falsified ones
/// having been caught by propagation.
fn branch_variable(clauses: &[Clause], assignment: &Assignment) -> Option<Var> {
    for clause in clauses {
        let mut satisfied = false;
        let mut unassigned = None;
        for &lit in clause {
            match assignment.lit_value(lit) {
                Some(true) => {
                    satisfied = true;
                    break;
                }
                Some(false) => {}
                None if unassigned.is_none() => unassigned = Some(lit.var()),
                None => {}
            }
        }
        if !satisfied {
            debug_assert!(unassigned.is_some(), "unsatisfied clause without candidates");
            return unassigned;
        }
    }
    None
}
