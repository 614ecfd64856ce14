//! Clauses with set semantics.
use std::fmt;

use crate::lit::Lit;

/// A clause over [`Lit`]s, stored as a canonical literal set.
///
/// Literals are kept sorted and deduplicated, so two clauses built from the
/// same literals compare equal no matter the construction order, and the
/// derived total order makes clauses usable as members of clause sets. The
/// empty clause denotes unsatisfiability.
///
/// Clauses are immutable once built; simplification always produces new
/// clause values.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Clause {
    lits: Vec<Lit>,
}

impl Clause {
    /// Build a clause from arbitrary literals, sorting and deduplicating.
    ///
    /// Tautologies are not rejected here; check with
    /// [`is_tautology`](Clause::is_tautology) where they must be dropped.
    pub fn from_lits(lits: impl IntoIterator<Item = Lit>) -> Clause {
        let mut lits: Vec<Lit> = lits.into_iter().collect();
        lits.sort_unstable();
        lits.dedup();
        Clause { lits }
    }

    /// The empty clause.
    pub fn empty() -> Clause {
        Clause::default()
    }

    /// Whether the clause contains a literal and its negation.
    pub fn is_tautology(&self) -> bool {
        // Sorted by code, so the two polarities of a variable are adjacent.
        self.lits
            .windows(2)
            .any(|pair| pair[0].var() == pair[1].var())
    }

    /// Whether the given literal occurs in the clause.
    pub fn contains(&self, lit: Lit) -> bool {
        self.lits.binary_search(&lit).is_ok()
    }

    /// Number of distinct literals.
    pub fn len(&self) -> usize {
        self.lits.len()
    }

    /// Whether this is the empty clause.
    pub fn is_empty(&self) -> bool {
        self.lits.is_empty()
    }

    /// The literal of a unit clause.
    pub fn unit(&self) -> Option<Lit> {
        match self.lits[..] {
            [lit] => Some(lit),
            _ => None,
        }
    }

    /// The literals in sorted order.
    pub fn lits(&self) -> &[Lit] {
        &self.lits
    }

    /// First literal of this clause whose negation occurs in `other`.
    ///
    /// Returns the pivot on which the two clauses can be resolved. Scanning
    /// in sorted order keeps the choice deterministic.
    pub fn resolvable(&self, other: &Clause) -> Option<Lit> {
        self.lits.iter().cloned().find(|&lit| other.contains(!lit))
    }

    /// The resolvent of `self` and `other` on `pivot`.
    ///
    /// `pivot` must occur in `self` and its negation in `other`. The result
    /// is `(self \ {pivot}) ∪ (other \ {¬pivot})` and may be a tautology or
    /// the empty clause.
    pub fn resolve_on(&self, other: &Clause, pivot: Lit) -> Clause {
        debug_assert!(self.contains(pivot) && other.contains(!pivot));
        Clause::from_lits(
            self.lits
                .iter()
                .filter(|&&lit| lit != pivot)
                .chain(other.lits.iter().filter(|&&lit| lit != !pivot))
                .cloned(),
        )
    }
}

impl From<&[Lit]> for Clause {
    fn from(lits: &[Lit]) -> Clause {
        Clause::from_lits(lits.iter().cloned())
    }
}

impl<'a> IntoIterator for &'a Clause {
    type Item = &'a Lit;
    type IntoIter = std::slice::Iter<'a, Lit>;

    fn into_iter(self) -> Self::IntoIter {
        self.lits.iter()
    }
}

impl fmt::Debug for Clause {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.lits.iter()).finish()
    }
}
