//! Conflict analysis.
//!
//! The implication graph is never materialized; antecedent lookups on the
//! trail are enough to resolve a falsified clause back to a unique
//! implication point.

use quadsat_formula::Clause;

use crate::prop::{Reason, Trail};

/// Learn a clause from a falsified one.
///
/// While the clause holds more than one literal of the conflict level, it is
/// resolved against the antecedent of such a literal; the antecedents always
/// introduce literals assigned earlier, so this bottoms out with a single
/// conflict-level literal, the first UIP. Returns the learned clause and the
/// level to backtrack to: the highest level below the conflict level still
/// mentioned in the clause, or 0 for an asserting unit.
pub(super) fn analyze_conflict(
    clauses: &[Clause],
    trail: &Trail,
    conflict: usize,
) -> (Clause, usize) {
    let conflict_level = trail.current_level();
    debug_assert!(
        conflict_level > 0,
        "level 0 conflicts refute the formula without learning"
    );

    let mut learned = clauses[conflict].clone();

    loop {
        let mut at_level = 0;
        let mut pivot = None;

        for &lit in &learned {
            if trail.level(lit.var()) != conflict_level {
                continue;
            }
            at_level += 1;
            if pivot.is_none() {
                if let Reason::Propagated(antecedent) = trail.reason(lit.var()) {
                    pivot = Some((lit, antecedent));
                }
            }
        }

        if at_level <= 1 {
            break;
        }

        let (lit, antecedent) = match pivot {
            Some(found) => found,
            // Only the level's decision lacks an antecedent, and there is
            // one decision per level.
            None => unreachable!("multiple conflict level literals, none propagated"),
        };

        // The antecedent propagated ¬lit, so the two clauses resolve on
        // lit's variable; the resolvent is again falsified.
        learned = learned.resolve_on(&clauses[antecedent], lit);
    }

    let backtrack = learned
        .lits()
        .iter()
        .map(|lit| trail.level(lit.var()))
        .filter(|&level| level < conflict_level)
        .max()
        .unwrap_or(0);

    (learned, backtrack)
}
