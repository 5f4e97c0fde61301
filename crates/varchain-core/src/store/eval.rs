use super::VariableStore;
use super::state::existing_id;
use crate::error::Result;
use std::collections::HashSet;
use varchain_engine::engine::{Computed, Value, VarId, affected_in_order, build_batch, to_engine_formula};

impl VariableStore {
    /// Recompute every variable from the current chain and store the results.
    pub fn recompute_all(&mut self) {
        let batch = build_batch(&self.chain);
        let results = self.engine.evaluate(&batch);
        log::debug!("recomputed {} variables", results.len());

        for (variable, computed) in self.chain.iter_mut().zip(results) {
            variable.value = Value::from(computed);
            variable.dirty = false;
        }
    }

    /// Recompute `identifier` and everything depending on it. Other stored
    /// values are left untouched. Returns the recomputed identifiers.
    pub fn recompute_from(&mut self, identifier: &str) -> Result<HashSet<VarId>> {
        let id = existing_id(&self.chain, identifier)?;
        let ordered = affected_in_order(&id, &self.chain);
        let positions: Vec<usize> = ordered
            .iter()
            .filter_map(|affected| self.chain.position(affected))
            .collect();

        let batch = build_batch(&self.chain);
        let results = self.engine.evaluate_positions(&batch, &positions);
        log::debug!("recomputed {} variables from {}", results.len(), id);

        for (pos, computed) in results {
            if let Some(variable) = self.chain.at_mut(pos) {
                variable.value = Value::from(computed);
                variable.dirty = false;
            }
        }
        Ok(ordered.into_iter().collect())
    }

    /// Replace a formula and immediately recompute what it affects.
    pub fn set_formula(&mut self, identifier: &str, formula: &str) -> Result<HashSet<VarId>> {
        self.update_formula(identifier, formula)?;
        self.recompute_from(identifier)
    }

    /// Evaluate an ad-hoc formula against the current chain without storing it.
    pub fn evaluate(&self, formula: &str) -> Computed {
        let batch = build_batch(&self.chain);
        let entry = to_engine_formula(formula, |id| self.chain.position(id));
        self.engine.evaluate_entry(&batch, &entry)
    }

    /// Identifiers whose stored value is stale.
    pub fn dirty(&self) -> Vec<VarId> {
        self.chain
            .iter()
            .filter(|v| v.dirty)
            .map(|v| v.id.clone())
            .collect()
    }
}
