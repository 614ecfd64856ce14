//! Decision by conflict driven clause learning.
//!
//! The search keeps a trail of assignments with decision levels and
//! antecedents. Every conflict is analyzed into a learned clause that is
//! appended to the clause database, the trail is rewound to the level where
//! that clause asserts, and propagation resumes. Branching blends a
//! frequency heuristic with occasional random picks.

mod analyze;

use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};

use quadsat_formula::{Clause, CnfFormula, Lit, Var};

use crate::assignment::Assignment;
use crate::cancel::CancelToken;
use crate::load::clause_list;
use crate::prop::{propagate_recording, Reason, Trail};
use crate::verdict::Verdict;

use self::analyze::analyze_conflict;

/// Halve the activity counters every this many picks per variable.
const DECAY_INTERVAL_FACTOR: u64 = 20;

/// Give up on random branching after this many tries per variable.
const RANDOM_RETRY_FACTOR: usize = 10;

/// Decide a formula, returning the full model on SAT.
///
/// Runs with the same seed are identical.
pub fn solve(
    formula: &CnfFormula,
    seed: u64,
    cancel: &CancelToken,
) -> (Verdict, Option<Vec<Lit>>) {
    let clauses = clause_list(formula);
    if clauses.iter().any(|clause| clause.is_empty()) {
        return (Verdict::Unsat, None);
    }

    let mut search = Search::new(formula.var_count(), clauses, seed);
    let verdict = search.run(cancel);
    let model = match verdict {
        Verdict::Sat => Some(search.assignment.model()),
        _ => None,
    };
    (verdict, model)
}

/// One in-flight CDCL search.
///
/// `clauses` starts out as the problem clauses and grows by one learned
/// clause per conflict; nothing is ever removed.
pub(crate) struct Search {
    pub(crate) clauses: Vec<Clause>,
    pub(crate) original_len: usize,
    pub(crate) assignment: Assignment,
    trail: Trail,
    activity: Activity,
    rng: StdRng,
    picks: u64,
}

impl Search {
    pub(crate) fn new(var_count: usize, clauses: Vec<Clause>, seed: u64) -> Search {
        let mut activity = Activity::new(var_count);
        activity.seed_with(&clauses);

        Search {
            original_len: clauses.len(),
            clauses,
            assignment: Assignment::new(var_count),
            trail: Trail::new(var_count),
            activity,
            rng: StdRng::seed_from_u64(seed),
            picks: 0,
        }
    }

    pub(crate) fn run(&mut self, cancel: &CancelToken) -> Verdict {
        // Facts forced by the problem clauses alone live at level 0.
        if propagate_recording(&self.clauses, &mut self.assignment, &mut self.trail).is_err() {
            return Verdict::Unsat;
        }

        while !self.assignment.is_total() {
            if cancel.is_cancelled() {
                return Verdict::Unknown;
            }

            let decision = self.pick_branching_lit();
            self.trail.new_level();
            self.assignment.assign(decision);
            self.trail.push(decision, Reason::Decision);

            while let Err(conflict) =
                propagate_recording(&self.clauses, &mut self.assignment, &mut self.trail)
            {
                if self.trail.current_level() == 0 {
                    return Verdict::Unsat;
                }

                let (learned, backtrack) =
                    analyze_conflict(&self.clauses, &self.trail, conflict.0);
                debug!(
                    "conflict at level {}, learned {:?}, backtracking to {}",
                    self.trail.current_level(),
                    learned,
                    backtrack
                );

                self.activity.bump_learned(&learned, &self.assignment);
                self.trail.backtrack(backtrack, &mut self.assignment);
                // The learned clause asserts its UIP literal on the next
                // propagation pass.
                self.clauses.push(learned);
            }
        }

        Verdict::Sat
    }

    /// Choose the next decision literal.
    ///
    /// Mostly the highest-activity unassigned variable; once at least half
    /// the variables are assigned, a biased coin sometimes swaps in a
    /// uniformly random one to diversify the search.
    fn pick_branching_lit(&mut self) -> Lit {
        self.picks += 1;
        let var_count = self.assignment.var_count();
        if self.picks % (DECAY_INTERVAL_FACTOR * var_count as u64) == 0 {
            self.activity.decay();
        }

        if self.rng.gen_range(1, 11) > 4
            || self.assignment.assigned_count() * 2 < var_count
        {
            self.max_activity_lit()
        } else {
            self.random_lit()
        }
    }

    fn max_activity_lit(&self) -> Lit {
        let mut best: Option<(u64, Var)> = None;
        for index in 0..self.assignment.var_count() {
            let var = Var::from_index(index);
            if self.assignment.var_value(var).is_some() {
                continue;
            }
            let frequency = self.activity.frequency(var);
            // Strict comparison keeps the smallest index on ties.
            if best.map_or(true, |(best_frequency, _)| frequency > best_frequency) {
                best = Some((frequency, var));
            }
        }

        let (_, var) = best.expect("branching with every variable assigned");
        Lit::from_var(var, self.activity.preferred_polarity(var))
    }

    fn random_lit(&mut self) -> Lit {
        let var_count = self.assignment.var_count();
        for _ in 0..RANDOM_RETRY_FACTOR * var_count {
            let var = Var::from_index(self.rng.gen_range(0, var_count));
            if self.assignment.var_value(var).is_none() {
                return Lit::from_var(var, self.activity.preferred_polarity(var));
            }
        }
        self.max_activity_lit()
    }
}

/// Per-variable branching state.
///
/// `frequency` counts appearances in the problem clauses and in learned
/// clauses; `polarity` sums the signs of those appearances and fixes the
/// phase of decisions on the variable. Periodic halving favours variables
/// from recent conflicts.
struct Activity {
    frequency: Vec<u64>,
    polarity: Vec<i64>,
}

impl Activity {
    fn new(var_count: usize) -> Activity {
        Activity {
            frequency: vec![0; var_count],
            polarity: vec![0; var_count],
        }
    }

    /// Count every literal of the problem clauses.
    fn seed_with(&mut self, clauses: &[Clause]) {
        for clause in clauses {
            for &lit in clause {
                self.frequency[lit.index()] += 1;
                self.polarity[lit.index()] += sign(lit);
            }
        }
    }

    /// Credit the literals of a learned clause.
    ///
    /// The frequency bump skips variables that are still assigned at
    /// learning time.
    fn bump_learned(&mut self, clause: &Clause, assignment: &Assignment) {
        for &lit in clause {
            self.polarity[lit.index()] += sign(lit);
            if assignment.var_value(lit.var()).is_none() {
                self.frequency[lit.index()] += 1;
            }
        }
    }

    /// Halve every counter, keeping signs.
    fn decay(&mut self) {
        for frequency in &mut self.frequency {
            *frequency /= 2;
        }
        for polarity in &mut self.polarity {
            *polarity /= 2;
        }
    }

    fn frequency(&self, var: Var) -> u64 {
        self.frequency[var.index()]
    }

    /// Phase for decisions on `var`: positive unless the negative
    /// appearances outweigh the positive ones.
    fn preferred_polarity(&self, var: Var) -> bool {
        self.polarity[var.index()] >= 0
    }
}

fn sign(lit: Lit) -> i64 {
    if lit.is_positive() {
        1
    } else {
        -1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    use proptest::prelude::*;

    use quadsat_formula::cnf::strategy::cnf_formula;
    use quadsat_formula::test::{parity_unsat_formula, pigeon_hole_formula, sat_formula};
    use quadsat_formula::{cnf_formula, lit, CnfFormula};

    use crate::test::brute_force_satisfiable;

    fn verdict(formula: &CnfFormula) -> Verdict {
        solve(formula, 0, &CancelToken::new()).0
    }

    #[test]
    fn empty_formula_is_sat() {
        assert_eq!(verdict(&CnfFormula::new()), Verdict::Sat);
    }

    #[test]
    fn empty_clause_is_unsat() {
        let formula = cnf_formula![
            1, 2;
            ;
        ];
        assert_eq!(verdict(&formula), Verdict::Unsat);
    }

    #[test]
    fn single_unit_assigns_it_true() {
        let formula = cnf_formula![
            1;
        ];
        let (verdict, model) = solve(&formula, 0, &CancelToken::new());
        assert_eq!(verdict, Verdict::Sat);
        assert!(model.unwrap().contains(&lit!(1)));
    }

    #[test]
    fn contradictory_units_are_unsat() {
        let formula = cnf_formula![
            1;
            -1;
        ];
        assert_eq!(verdict(&formula), Verdict::Unsat);
    }

    #[test]
    fn level_0_conflict_after_learning_is_unsat() {
        let formula = cnf_formula![
            1, 2, 3;
            -1;
            1, -2;
            2, -3;
        ];
        assert_eq!(verdict(&formula), Verdict::Unsat);
    }

    #[test]
    fn pigeon_hole_is_unsat() {
        assert_eq!(verdict(&pigeon_hole_formula(2)), Verdict::Unsat);
        assert_eq!(verdict(&pigeon_hole_formula(3)), Verdict::Unsat);
    }

    #[test]
    fn cancelled_runs_report_unknown() {
        let formula = cnf_formula![
            1, 2;
        ];
        let cancel = CancelToken::new();
        cancel.cancel();
        assert_eq!(solve(&formula, 0, &cancel).0, Verdict::Unknown);
    }

    #[test]
    fn seeds_reproduce_runs() {
        let formula = pigeon_hole_formula(3);
        let clauses = clause_list(&formula);

        let mut first = Search::new(formula.var_count(), clauses.clone(), 7);
        let mut second = Search::new(formula.var_count(), clauses, 7);
        assert_eq!(first.run(&CancelToken::new()), Verdict::Unsat);
        assert_eq!(second.run(&CancelToken::new()), Verdict::Unsat);
        assert_eq!(first.clauses.len(), second.clauses.len());
    }

    proptest! {
        #[test]
        fn agrees_with_brute_force(formula in cnf_formula(1..12usize, 0..30, 0..6)) {
            let expected = if brute_force_satisfiable(&formula) {
                Verdict::Sat
            } else {
                Verdict::Unsat
            };
            prop_assert_eq!(verdict(&formula), expected);
        }

        #[test]
        fn models_satisfy_the_formula(
            formula in sat_formula(4..20usize, 10..80usize, 1..6usize)
        ) {
            let (verdict, model) = solve(&formula, 0, &CancelToken::new());
            prop_assert_eq!(verdict, Verdict::Sat);

            let model: HashSet<Lit> = model.unwrap().into_iter().collect();
            for clause in formula.iter() {
                prop_assert!(clause.iter().any(|lit| model.contains(lit)));
            }
        }

        #[test]
        fn clashing_parities_are_unsat(formula in parity_unsat_formula(2..7usize)) {
            prop_assert_eq!(verdict(&formula), Verdict::Unsat);
        }

        #[test]
        fn learned_clauses_are_entailed(formula in cnf_formula(1..8usize, 1..16, 0..4)) {
            let clauses = clause_list(&formula);
            prop_assume!(!clauses.iter().any(|clause| clause.is_empty()));

            let mut search = Search::new(formula.var_count(), clauses, 0);
            let _ = search.run(&CancelToken::new());

            // Every model of the problem clauses satisfies every learned
            // clause, so learning preserved the answer.
            let originals = &search.clauses[..search.original_len];
            let learned = &search.clauses[search.original_len..];
            let var_count = formula.var_count();

            for bits in 0..1u32 << var_count {
                let satisfies = |clause: &Clause| {
                    clause
                        .lits()
                        .iter()
                        .any(|lit| (bits >> lit.index() & 1 == 1) == lit.is_positive())
                };
                if originals.iter().all(satisfies) {
                    prop_assert!(learned.iter().all(satisfies));
                }
            }
        }
    }
}
