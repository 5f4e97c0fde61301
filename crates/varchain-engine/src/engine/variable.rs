//! Variable data structures for the chain.
//!
//! This module provides the core data types for representing variables:
//! - [`Value`] - The last computed result of a variable
//! - [`Variable`] - A variable with its formula, references, and cached value
//! - [`Chain`] - Insertion-ordered storage for variables, indexed by identifier

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::eval::Computed;
use super::ident::VarId;
use super::refs::extract_references;

/// The last computed value of a variable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Not computed since the variable was created.
    #[default]
    Unset,
    Number(f64),
    /// The engine could not resolve the formula (unknown name, bad syntax,
    /// non-numeric result, or an unresolved precedent).
    Unresolved,
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<Computed> for Value {
    fn from(computed: Computed) -> Self {
        match computed {
            Computed::Number(n) => Value::Number(n),
            Computed::Unresolved => Value::Unresolved,
        }
    }
}

/// A named variable in the chain.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Variable {
    pub id: VarId,
    pub formula: String,
    /// Identifiers referenced by `formula`, in first-occurrence order.
    pub depends_on: Vec<VarId>,
    pub value: Value,
    /// Set when an edit upstream made `value` stale.
    #[serde(skip)]
    pub dirty: bool,
}

impl Variable {
    /// Create a new variable. References are extracted from the formula.
    pub fn new(id: VarId, formula: &str) -> Variable {
        Variable {
            id,
            depends_on: extract_references(formula),
            formula: formula.to_string(),
            value: Value::Unset,
            dirty: true,
        }
    }

    /// Replace the formula and re-extract references. The value is kept
    /// until the next recomputation.
    pub fn set_formula(&mut self, formula: &str) {
        self.formula = formula.to_string();
        self.depends_on = extract_references(formula);
        self.dirty = true;
    }

    pub fn references(&self, id: &VarId) -> bool {
        self.depends_on.contains(id)
    }
}

/// Insertion-ordered variable storage with identifier lookup.
#[derive(Clone, Debug, Default)]
pub struct Chain {
    entries: Vec<Variable>,
    index: HashMap<VarId, usize>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &VarId) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &VarId) -> Option<&Variable> {
        self.index.get(id).map(|&pos| &self.entries[pos])
    }

    pub fn get_mut(&mut self, id: &VarId) -> Option<&mut Variable> {
        let pos = *self.index.get(id)?;
        self.entries.get_mut(pos)
    }

    /// Zero-based insertion position of `id`.
    pub fn position(&self, id: &VarId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn at(&self, pos: usize) -> Option<&Variable> {
        self.entries.get(pos)
    }

    pub fn at_mut(&mut self, pos: usize) -> Option<&mut Variable> {
        self.entries.get_mut(pos)
    }

    /// Iterate variables in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Variable> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Variable> {
        self.entries.iter_mut()
    }

    /// Append a variable. Returns the variable back if the identifier is
    /// already present.
    pub fn push(&mut self, variable: Variable) -> Result<(), Variable> {
        if self.index.contains_key(&variable.id) {
            return Err(variable);
        }
        self.index.insert(variable.id.clone(), self.entries.len());
        self.entries.push(variable);
        Ok(())
    }

    /// Remove a variable, shifting later positions down by one.
    pub fn remove(&mut self, id: &VarId) -> Option<Variable> {
        let pos = self.index.remove(id)?;
        let removed = self.entries.remove(pos);
        for slot in self.index.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    /// Change the identifier of a variable in place (its position is kept).
    /// Returns false if `from` is absent or `to` is taken.
    pub fn rekey(&mut self, from: &VarId, to: &VarId) -> bool {
        if self.index.contains_key(to) {
            return false;
        }
        let Some(pos) = self.index.remove(from) else {
            return false;
        };
        self.entries[pos].id = to.clone();
        self.index.insert(to.clone(), pos);
        true
    }

    /// Variables whose formula references `id`, in insertion order.
    pub fn referencing(&self, id: &VarId) -> Vec<VarId> {
        self.entries
            .iter()
            .filter(|v| &v.id != id && v.references(id))
            .map(|v| v.id.clone())
            .collect()
    }

    /// Reverse reference map: identifier -> variables that reference it.
    pub fn dependents(&self) -> HashMap<VarId, Vec<VarId>> {
        let mut map: HashMap<VarId, Vec<VarId>> = HashMap::new();
        for variable in &self.entries {
            for dep in &variable.depends_on {
                map.entry(dep.clone()).or_default().push(variable.id.clone());
            }
        }
        map
    }
}

impl<'a> IntoIterator for &'a Chain {
    type Item = &'a Variable;
    type IntoIter = std::slice::Iter<'a, Variable>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
