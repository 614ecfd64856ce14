//! Canonicalizing formulas for the engines.
//!
//! Ingest keeps clauses verbatim; the engines want clause sets. Loading
//! canonicalizes every clause, drops tautologies and merges duplicates, so
//! all four procedures start from the same clause database for the same
//! input.

use rustc_hash::FxHashSet;

use quadsat_formula::{Clause, CnfFormula};

/// The canonical clause set of a formula.
pub(crate) fn clause_set(formula: &CnfFormula) -> FxHashSet<Clause> {
    formula
        .iter()
        .map(Clause::from)
        .filter(|clause| !clause.is_tautology())
        .collect()
}

/// The canonical clauses of a formula as a sorted list.
///
/// Engines that scan by clause index use this to make their iteration order a
/// function of the input alone.
pub(crate) fn clause_list(formula: &CnfFormula) -> Vec<Clause> {
    let mut clauses: Vec<Clause> = clause_set(formula).into_iter().collect();
    clauses.sort_unstable();
    clauses
}

#[cfg(test)]
mod tests {
    use super::*;

    use quadsat_formula::cnf_formula;

    #[test]
    fn deduplicates_and_drops_tautologies() {
        let formula = cnf_formula![
            1, 2;
            2, 1;
            1, -1, 3;
            -3;
        ];

        let clauses = clause_list(&formula);
        assert_eq!(clauses.len(), 2);
        assert!(clauses.iter().all(|clause| !clause.is_tautology()));
    }

    #[test]
    fn keeps_empty_clauses() {
        let formula = cnf_formula![
            1;
            ;
        ];

        let clauses = clause_list(&formula);
        assert!(clauses.iter().any(|clause| clause.is_empty()));
    }
}
