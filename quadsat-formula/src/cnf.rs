//! CNF formulas.
use std::cmp::max;
use std::fmt;
use std::iter::Extend;

use crate::lit::Lit;

/// A formula in conjunctive normal form.
///
/// Holds clauses the way the ingest produced them, duplicates and all.
/// Equivalent to a `Vec<Vec<Lit>>`, but all literals live in one buffer with
/// an offset table marking clause boundaries.
#[derive(Clone, Eq)]
pub struct CnfFormula {
    var_count: usize,
    literals: Vec<Lit>,
    /// Clause `i` occupies `literals[ends[i - 1]..ends[i]]` (from 0 for the
    /// first clause).
    ends: Vec<usize>,
}

impl Default for CnfFormula {
    fn default() -> CnfFormula {
        CnfFormula {
            var_count: 0,
            literals: vec![],
            ends: vec![],
        }
    }
}

impl CnfFormula {
    /// Create a formula without clauses or variables.
    pub fn new() -> CnfFormula {
        CnfFormula::default()
    }

    /// Number of variables in the formula.
    ///
    /// Counts gaps too: this is one more than the largest variable index
    /// present, or the explicitly declared count if that is larger. A vector
    /// of this length can be indexed by every variable of the formula.
    pub fn var_count(&self) -> usize {
        self.var_count
    }

    /// Declare variables up to `count`.
    ///
    /// Does nothing if the formula already has at least `count` variables.
    pub fn set_var_count(&mut self, count: usize) {
        self.var_count = max(self.var_count, count)
    }

    /// Number of clauses.
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    /// Whether the formula has no clauses.
    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    /// Append a clause, widening the variable count as needed.
    pub fn add_clause<L>(&mut self, literals: impl IntoIterator<Item = L>)
    where
        Vec<Lit>: Extend<L>,
    {
        let begin = self.literals.len();
        self.literals.extend(literals);

        for &lit in &self.literals[begin..] {
            self.var_count = max(lit.index() + 1, self.var_count);
        }

        self.ends.push(self.literals.len());
    }

    /// Iterate over the clauses as literal slices.
    pub fn iter(&self) -> impl Iterator<Item = &[Lit]> {
        let literals = &self.literals;
        let ends = &self.ends;
        ends.iter()
            .enumerate()
            .map(move |(i, &end)| &literals[if i == 0 { 0 } else { ends[i - 1] }..end])
    }
}

/// Collect any iterable of [`Lit`] iterables into a formula.
impl<F, I, L> From<F> for CnfFormula
where
    F: IntoIterator<Item = I>,
    I: IntoIterator<Item = L>,
    Vec<Lit>: Extend<L>,
{
    fn from(clauses: F) -> CnfFormula {
        let mut formula = CnfFormula::new();
        for clause in clauses {
            formula.add_clause(clause);
        }
        formula
    }
}

impl fmt::Debug for CnfFormula {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&self.var_count(), f)?;
        f.debug_list().entries(self.iter()).finish()
    }
}

impl PartialEq for CnfFormula {
    fn eq(&self, other: &CnfFormula) -> bool {
        self.var_count() == other.var_count()
            && self.len() == other.len()
            && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

#[cfg(any(test, feature = "proptest-strategies"))]
#[doc(hidden)]
pub mod strategy {
    use super::*;

    use proptest::{collection::SizeRange, prelude::*, *};

    use crate::lit::strategy::lit;

    /// Arbitrary formulas as nested vectors.
    pub fn vec_formula(
        vars: impl Strategy<Value = usize>,
        clauses: impl Into<SizeRange>,
        clause_len: impl Into<SizeRange>,
    ) -> impl Strategy<Value = Vec<Vec<Lit>>> {
        let clauses = clauses.into();
        let clause_len = clause_len.into();

        // ind_flat_map keeps shrinking affordable here
        vars.prop_ind_flat_map(move |vars| {
            collection::vec(
                collection::vec(lit(0..vars), clause_len.clone()),
                clauses.clone(),
            )
        })
    }

    /// Arbitrary [`CnfFormula`] values.
    pub fn cnf_formula(
        vars: impl Strategy<Value = usize>,
        clauses: impl Into<SizeRange>,
        clause_len: impl Into<SizeRange>,
    ) -> impl Strategy<Value = CnfFormula> {
        vec_formula(vars, clauses, clause_len)
            .prop_map(CnfFormula::from)
            .no_shrink()
    }
}
