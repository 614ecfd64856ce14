//! Unit propagation and the assignment trail.
//!
//! All engines share the same propagation loop: scan the clause list in index
//! order, make the single unassigned literal of every unit clause true, and
//! repeat until a full pass changes nothing or a clause runs out of literals
//! to satisfy. The scan order is fixed, so identical inputs propagate
//! identically.

use quadsat_formula::{Clause, Lit, Var};

use crate::assignment::Assignment;

/// How a clause relates to a partial assignment.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClauseStatus {
    /// Some literal is true.
    Satisfied,
    /// No literal is true and exactly one is unassigned.
    Unit(Lit),
    /// No literal is true and at least two are unassigned.
    Unresolved,
    /// Every literal is false.
    Falsified,
}

/// Classify a clause under a partial assignment.
///
/// For unit clauses the returned literal is the last unassigned one in the
/// clause's literal order.
pub fn clause_status(clause: &Clause, assignment: &Assignment) -> ClauseStatus {
    let mut unassigned = None;
    let mut unassigned_count = 0;

    for &lit in clause {
        match assignment.lit_value(lit) {
            Some(true) => return ClauseStatus::Satisfied,
            Some(false) => {}
            None => {
                unassigned_count += 1;
                unassigned = Some(lit);
            }
        }
    }

    match (unassigned_count, unassigned) {
        (0, _) => ClauseStatus::Falsified,
        (1, Some(lit)) => ClauseStatus::Unit(lit),
        _ => ClauseStatus::Unresolved,
    }
}

/// A falsified clause, by index into the clause list.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Conflict(pub usize);

/// Propagate unit clauses until fixed point or conflict.
///
/// Calling this again on the result is a no-op.
pub fn propagate(clauses: &[Clause], assignment: &mut Assignment) -> Result<(), Conflict> {
    loop {
        let mut changed = false;
        for (index, clause) in clauses.iter().enumerate() {
            match clause_status(clause, assignment) {
                ClauseStatus::Falsified => return Err(Conflict(index)),
                ClauseStatus::Unit(lit) => {
                    assignment.assign(lit);
                    changed = true;
                }
                ClauseStatus::Satisfied | ClauseStatus::Unresolved => {}
            }
        }
        if !changed {
            return Ok(());
        }
    }
}

/// Why an assignment was made.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Reason {
    /// A branching decision; no antecedent.
    Decision,
    /// Forced by the clause with this index becoming unit.
    Propagated(usize),
}

/// Ordered record of assignments with decision levels and antecedents.
///
/// The implication graph stays implicit: an edge runs from every false
/// literal of a propagated clause to the literal it forced, and those edges
/// can be recovered from the per-variable antecedents alone.
pub struct Trail {
    entries: Vec<Lit>,
    /// Index into `entries` where each decision level above 0 begins.
    level_starts: Vec<usize>,
    /// Decision level per variable; stale while unassigned.
    level_of: Vec<usize>,
    /// Antecedent per variable; stale while unassigned.
    reason_of: Vec<Reason>,
}

impl Trail {
    /// An empty trail over `var_count` variables at decision level 0.
    pub fn new(var_count: usize) -> Trail {
        Trail {
            entries: vec![],
            level_starts: vec![],
            level_of: vec![0; var_count],
            reason_of: vec![Reason::Decision; var_count],
        }
    }

    /// The current decision level, 0 before any decision.
    pub fn current_level(&self) -> usize {
        self.level_starts.len()
    }

    /// Open the next decision level.
    pub fn new_level(&mut self) {
        self.level_starts.push(self.entries.len());
    }

    /// Record an assignment made at the current level.
    pub fn push(&mut self, lit: Lit, reason: Reason) {
        self.level_of[lit.index()] = self.current_level();
        self.reason_of[lit.index()] = reason;
        self.entries.push(lit);
    }

    /// Decision level of an assigned variable.
    pub fn level(&self, var: Var) -> usize {
        self.level_of[var.index()]
    }

    /// Antecedent of an assigned variable.
    pub fn reason(&self, var: Var) -> Reason {
        self.reason_of[var.index()]
    }

    /// Assigned literals in assignment order.
    pub fn entries(&self) -> &[Lit] {
        &self.entries
    }

    /// Undo every assignment above `level` and make it the current level.
    pub fn backtrack(&mut self, level: usize, assignment: &mut Assignment) {
        debug_assert!(level <= self.current_level());
        if level == self.current_level() {
            return;
        }

        let keep = self.level_starts[level];
        for &lit in &self.entries[keep..] {
            assignment.unassign(lit.var());
        }
        self.entries.truncate(keep);
        self.level_starts.truncate(level);
    }
}

/// Propagate like [`propagate`], recording levels and antecedents.
///
/// Every forced assignment lands on the trail at its current level with the
/// forcing clause as antecedent.
pub fn propagate_recording(
    clauses: &[Clause],
    assignment: &mut Assignment,
    trail: &mut Trail,
) -> Result<(), Conflict> {
    loop {
        let mut changed = false;
        for (index, clause) in clauses.iter().enumerate() {
            match clause_status(clause, assignment) {
                ClauseStatus::Falsified => return Err(Conflict(index)),
                ClauseStatus::Unit(lit) => {
                    assignment.assign(lit);
                    trail.push(lit, Reason::Propagated(index));
                    changed = true;
                }
                ClauseStatus::Satisfied | ClauseStatus::Unresolved => {}
            }
        }
        if !changed {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use quadsat_formula::{cnf::strategy::cnf_formula, lit, lits};

    use crate::load::clause_list;

    #[test]
    fn propagates_unit_chains() {
        let formula = quadsat_formula::cnf_formula![
            1;
            -1, 2;
            -2, 3;
        ];
        let clauses = clause_list(&formula);
        let mut assignment = Assignment::new(formula.var_count());

        assert_eq!(propagate(&clauses, &mut assignment), Ok(()));
        assert!(assignment.lit_is_true(lit!(1)));
        assert!(assignment.lit_is_true(lit!(2)));
        assert!(assignment.lit_is_true(lit!(3)));
    }

    #[test]
    fn detects_conflicts() {
        let formula = quadsat_formula::cnf_formula![
            1;
            -1;
        ];
        let clauses = clause_list(&formula);
        let mut assignment = Assignment::new(formula.var_count());

        assert!(propagate(&clauses, &mut assignment).is_err());
    }

    #[test]
    fn records_antecedents() {
        let formula = quadsat_formula::cnf_formula![
            1;
            -1, 2;
        ];
        let clauses = clause_list(&formula);
        let mut assignment = Assignment::new(formula.var_count());
        let mut trail = Trail::new(formula.var_count());

        assert_eq!(
            propagate_recording(&clauses, &mut assignment, &mut trail),
            Ok(())
        );
        assert_eq!(trail.entries(), &lits![1, 2][..]);
        assert_eq!(trail.level(lit!(1).var()), 0);
        match trail.reason(lit!(2).var()) {
            Reason::Propagated(index) => assert!(clauses[index].contains(lit!(2))),
            reason => panic!("unexpected reason {:?}", reason),
        }
    }

    #[test]
    fn backtrack_unassigns_above_the_target_level() {
        let formula = quadsat_formula::cnf_formula![
            -1, 2;
        ];
        let clauses = clause_list(&formula);
        let mut assignment = Assignment::new(formula.var_count());
        let mut trail = Trail::new(formula.var_count());

        trail.new_level();
        assignment.assign(lit!(1));
        trail.push(lit!(1), Reason::Decision);
        assert_eq!(
            propagate_recording(&clauses, &mut assignment, &mut trail),
            Ok(())
        );
        assert_eq!(assignment.assigned_count(), 2);

        trail.backtrack(0, &mut assignment);
        assert_eq!(assignment.assigned_count(), 0);
        assert_eq!(trail.current_level(), 0);
        assert!(trail.entries().is_empty());
    }

    proptest! {
        #[test]
        fn propagation_is_idempotent(formula in cnf_formula(1..20usize, 0..40, 0..5)) {
            let clauses = clause_list(&formula);
            let mut assignment = Assignment::new(formula.var_count());

            let first = propagate(&clauses, &mut assignment);
            let snapshot = assignment.model();

            let second = propagate(&clauses, &mut assignment);
            if first.is_ok() {
                prop_assert_eq!(first, second);
                prop_assert_eq!(snapshot, assignment.model());
            }
        }
    }
}
