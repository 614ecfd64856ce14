//! Partial assignments.
use quadsat_formula::{Lit, Var};

/// A partial mapping from variables to truth values.
///
/// Backed by a dense vector indexed by variable, with `None` marking
/// unassigned variables. The assignment is total once every variable is
/// mapped.
#[derive(Clone, Default)]
pub struct Assignment {
    values: Vec<Option<bool>>,
    assigned: usize,
}

impl Assignment {
    /// An empty assignment over `var_count` variables.
    pub fn new(var_count: usize) -> Assignment {
        Assignment {
            values: vec![None; var_count],
            assigned: 0,
        }
    }

    /// Number of variables covered, assigned or not.
    pub fn var_count(&self) -> usize {
        self.values.len()
    }

    /// Number of currently assigned variables.
    pub fn assigned_count(&self) -> usize {
        self.assigned
    }

    /// Whether every variable is assigned.
    pub fn is_total(&self) -> bool {
        self.assigned == self.values.len()
    }

    /// Value of a variable.
    pub fn var_value(&self, var: Var) -> Option<bool> {
        self.values[var.index()]
    }

    /// Value of a literal under the current assignment.
    pub fn lit_value(&self, lit: Lit) -> Option<bool> {
        self.values[lit.index()].map(|value| value ^ lit.is_negative())
    }

    /// Whether the literal is true under the current assignment.
    pub fn lit_is_true(&self, lit: Lit) -> bool {
        self.lit_value(lit) == Some(true)
    }

    /// Make a literal true.
    ///
    /// The literal's variable must be unassigned.
    pub fn assign(&mut self, lit: Lit) {
        debug_assert!(self.values[lit.index()].is_none());
        self.values[lit.index()] = Some(lit.is_positive());
        self.assigned += 1;
    }

    /// Remove a variable's value.
    pub fn unassign(&mut self, var: Var) {
        debug_assert!(self.values[var.index()].is_some());
        self.values[var.index()] = None;
        self.assigned -= 1;
    }

    /// The assigned variables as true literals.
    pub fn model(&self) -> Vec<Lit> {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(index, value)| value.map(|value| Lit::from_index(index, value)))
            .collect()
    }
}
