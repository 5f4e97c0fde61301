use super::VariableStore;
use super::state::{existing_id, parse_id};
use crate::error::{Result, VarchainError};
use std::collections::HashSet;
use varchain_engine::engine::{
    Value, VarId, Variable, affected_by, find_cycle, rename_references,
};

impl VariableStore {
    /// Mark every identifier in `ids` as stale.
    fn mark_dirty(&mut self, ids: &HashSet<VarId>) {
        for id in ids {
            if let Some(variable) = self.chain.get_mut(id) {
                variable.dirty = true;
            }
        }
    }

    /// Reject `formula` for `id` if it would close a cycle.
    fn check_cycle(&self, id: &VarId, formula: &str) -> Result<()> {
        if let Some(path) = find_cycle(id, formula, &self.chain) {
            log::debug!("rejected formula for {}: cycle through {:?}", id, path);
            return Err(VarchainError::CircularReference {
                id: id.clone(),
                path,
            });
        }
        Ok(())
    }

    /// Append a new variable with an unset value.
    pub fn insert(&mut self, identifier: &str, formula: &str) -> Result<VarId> {
        let id = parse_id(identifier)?;
        if self.chain.contains(&id) {
            return Err(VarchainError::DuplicateIdentifier(id));
        }
        // Existing formulas may already mention the new identifier.
        self.check_cycle(&id, formula)?;

        self.chain
            .push(Variable::new(id.clone(), formula))
            .map_err(|v| VarchainError::DuplicateIdentifier(v.id))?;

        let affected = affected_by(&id, &self.chain);
        self.mark_dirty(&affected);
        self.modified = true;
        Ok(id)
    }

    /// Rename a variable in place and rewrite every formula referencing it.
    pub fn rename(&mut self, old_id: &str, new_id: &str) -> Result<VarId> {
        let from = existing_id(&self.chain, old_id)?;
        let to = parse_id(new_id)?;
        if from == to {
            return Ok(to);
        }
        if self.chain.contains(&to) {
            return Err(VarchainError::DuplicateIdentifier(to));
        }

        // Formulas that already mention `to` will start pointing at the
        // renamed variable.
        let own_formula = self
            .chain
            .get(&from)
            .map(|v| v.formula.clone())
            .unwrap_or_default();
        self.check_cycle(&to, &own_formula)?;

        for referrer in self.chain.referencing(&from) {
            if let Some(variable) = self.chain.get_mut(&referrer) {
                let rewritten = rename_references(&variable.formula, &from, &to);
                let dirty = variable.dirty;
                variable.set_formula(&rewritten);
                variable.dirty = dirty;
            }
        }
        self.chain.rekey(&from, &to);

        let affected = affected_by(&to, &self.chain);
        self.mark_dirty(&affected);
        self.modified = true;
        Ok(to)
    }

    /// Replace a variable's formula.
    ///
    /// Returns the identifiers that need recomputation (the variable itself
    /// and everything depending on it). Their stored values are kept, and
    /// flagged dirty, until the next recompute.
    pub fn update_formula(&mut self, identifier: &str, formula: &str) -> Result<HashSet<VarId>> {
        let id = existing_id(&self.chain, identifier)?;
        self.check_cycle(&id, formula)?;

        if let Some(variable) = self.chain.get_mut(&id) {
            variable.set_formula(formula);
        }

        let affected = affected_by(&id, &self.chain);
        self.mark_dirty(&affected);
        self.modified = true;
        Ok(affected)
    }

    /// Delete a variable that no other formula references.
    pub fn remove(&mut self, identifier: &str) -> Result<Variable> {
        let id = existing_id(&self.chain, identifier)?;
        let by = self.chain.referencing(&id);
        if !by.is_empty() {
            return Err(VarchainError::ReferencedElsewhere { id, by });
        }

        let removed = self
            .chain
            .remove(&id)
            .ok_or_else(|| VarchainError::NotFound(id.clone()))?;
        self.modified = true;
        Ok(removed)
    }

    /// Ordered `(identifier, formula)` pairs, for handoff to the engine.
    pub fn snapshot(&self) -> Vec<(VarId, String)> {
        self.chain
            .iter()
            .map(|v| (v.id.clone(), v.formula.clone()))
            .collect()
    }

    /// Record a computed value for a variable.
    pub fn set_value(&mut self, identifier: &str, value: Value) -> Result<()> {
        let id = existing_id(&self.chain, identifier)?;
        if let Some(variable) = self.chain.get_mut(&id) {
            variable.value = value;
            variable.dirty = false;
        }
        Ok(())
    }
}
