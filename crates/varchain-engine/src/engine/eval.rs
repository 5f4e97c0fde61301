//! Formula engine boundary and the Rhai-backed implementation.
//!
//! A [`FormulaEngine`] takes an ordered batch of formula strings (see
//! [`build_batch`](super::build_batch)) and returns, per position, a number
//! or the unresolved marker. The result depends only on the batch passed in.
//!
//! [`RhaiEngine`] evaluates `=expr` entries with Rhai after rewriting `$n`
//! addresses into `CELL(n - 1)` calls. Positions are evaluated precedents
//! first, so nested evaluation only happens for references the ordering
//! could not see; that nesting is bounded by [`MAX_EVAL_DEPTH`].

use dashmap::DashMap;
use rhai::{Dynamic, Engine};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::preprocess::{EXPRESSION_PREFIX, preprocess_with_precedents};

/// Maximum nesting of on-demand position evaluation.
pub const MAX_EVAL_DEPTH: usize = 32;

/// Result of evaluating one batch position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Computed {
    Number(f64),
    /// The engine's error marker: unknown name, bad syntax, non-numeric
    /// result, or a reference to another unresolved position.
    Unresolved,
}

/// External formula evaluator addressed by batch position.
pub trait FormulaEngine {
    /// Evaluate every position of the batch.
    fn evaluate(&self, batch: &[String]) -> Vec<Computed>;

    /// Evaluate only `positions` (plus whatever they need). Results are
    /// returned in the order requested.
    fn evaluate_positions(&self, batch: &[String], positions: &[usize]) -> Vec<(usize, Computed)> {
        let all = self.evaluate(batch);
        positions
            .iter()
            .map(|&pos| (pos, all.get(pos).copied().unwrap_or(Computed::Unresolved)))
            .collect()
    }

    /// Evaluate an extra entry against the batch without storing it.
    fn evaluate_entry(&self, batch: &[String], entry: &str) -> Computed {
        let mut extended = batch.to_vec();
        extended.push(entry.to_string());
        let pos = extended.len() - 1;
        self.evaluate_positions(&extended, &[pos])
            .pop()
            .map(|(_, computed)| computed)
            .unwrap_or(Computed::Unresolved)
    }
}

/// A loaded batch entry.
#[derive(Clone, Debug)]
pub(crate) enum Slot {
    Literal(f64),
    Script { script: String, precedents: Vec<usize> },
    /// Empty or non-numeric text: nothing to compute.
    Blank,
}

impl Slot {
    fn parse(entry: &str) -> Slot {
        let trimmed = entry.trim();
        if let Some(expr) = trimmed.strip_prefix(EXPRESSION_PREFIX) {
            let (script, precedents) = preprocess_with_precedents(expr);
            return Slot::Script { script, precedents };
        }
        match trimmed.parse::<f64>() {
            Ok(n) => Slot::Literal(n),
            Err(_) => Slot::Blank,
        }
    }

    fn precedents(&self) -> &[usize] {
        match self {
            Slot::Script { precedents, .. } => precedents,
            _ => &[],
        }
    }
}

/// Per-batch state shared with the `CELL` builtin.
/// DashMap is internally sharded, clones of the Arc are cheap.
#[derive(Default)]
pub(crate) struct BatchState {
    pub(crate) slots: DashMap<usize, Slot>,
    pub(crate) values: DashMap<usize, Computed>,
    pub(crate) depth: AtomicUsize,
}

impl BatchState {
    fn load(&self, batch: &[String]) {
        self.slots.clear();
        self.values.clear();
        self.depth.store(0, Ordering::SeqCst);
        for (pos, entry) in batch.iter().enumerate() {
            self.slots.insert(pos, Slot::parse(entry));
        }
    }

    fn precedents_of(&self, pos: usize) -> Vec<usize> {
        self.slots
            .get(&pos)
            .map(|slot| slot.precedents().to_vec())
            .unwrap_or_default()
    }

    /// Post-order over precedents of `wanted`: every position appears after
    /// the positions it reads. Cycles are cut at the first repeat.
    fn evaluation_order(&self, wanted: &[usize]) -> Vec<usize> {
        let mut order = Vec::new();
        let mut seen: HashSet<usize> = HashSet::new();

        for &root in wanted {
            if !seen.insert(root) {
                continue;
            }
            let mut stack: Vec<(usize, Vec<usize>, usize)> =
                vec![(root, self.precedents_of(root), 0)];
            while let Some((pos, precedents, next)) = stack.last_mut() {
                if let Some(&child) = precedents.get(*next) {
                    *next += 1;
                    if seen.insert(child) {
                        let grandchildren = self.precedents_of(child);
                        stack.push((child, grandchildren, 0));
                    }
                } else {
                    order.push(*pos);
                    stack.pop();
                }
            }
        }

        order
    }
}

/// Resolve one position, evaluating it on demand if needed.
pub(crate) fn resolve(engine: &Engine, state: &BatchState, pos: usize) -> Computed {
    if let Some(cached) = state.values.get(&pos) {
        return *cached;
    }

    let slot = match state.slots.get(&pos) {
        Some(slot) => slot.clone(),
        None => return Computed::Unresolved,
    };

    let computed = match slot {
        Slot::Literal(n) => Computed::Number(n),
        Slot::Blank => Computed::Unresolved,
        Slot::Script { script, .. } => {
            if state.depth.load(Ordering::SeqCst) >= MAX_EVAL_DEPTH {
                log::debug!("position {} exceeds evaluation depth {}", pos, MAX_EVAL_DEPTH);
                return Computed::Unresolved;
            }
            // Placeholder so a cycle inside the batch reads as unresolved.
            state.values.insert(pos, Computed::Unresolved);
            state.depth.fetch_add(1, Ordering::SeqCst);
            let result = engine.eval::<Dynamic>(&script);
            state.depth.fetch_sub(1, Ordering::SeqCst);
            match result {
                Ok(value) => to_computed(&value),
                Err(e) => {
                    log::debug!("position {} unresolved: {}", pos, e);
                    Computed::Unresolved
                }
            }
        }
    };

    state.values.insert(pos, computed);
    computed
}

fn to_computed(value: &Dynamic) -> Computed {
    if let Ok(n) = value.as_float() {
        Computed::Number(n)
    } else if let Ok(n) = value.as_int() {
        Computed::Number(n as f64)
    } else {
        Computed::Unresolved
    }
}

/// Rhai-backed [`FormulaEngine`].
pub struct RhaiEngine {
    engine: Engine,
    state: Arc<BatchState>,
}

impl RhaiEngine {
    /// Create a Rhai engine with built-ins registered.
    pub fn new() -> Self {
        let state = Arc::new(BatchState::default());
        let mut engine = Engine::new();
        crate::builtins::register_builtins(&mut engine, state.clone());
        RhaiEngine { engine, state }
    }
}

impl Default for RhaiEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FormulaEngine for RhaiEngine {
    fn evaluate(&self, batch: &[String]) -> Vec<Computed> {
        let positions: Vec<usize> = (0..batch.len()).collect();
        self.evaluate_positions(batch, &positions)
            .into_iter()
            .map(|(_, computed)| computed)
            .collect()
    }

    fn evaluate_positions(&self, batch: &[String], positions: &[usize]) -> Vec<(usize, Computed)> {
        self.state.load(batch);
        for pos in self.state.evaluation_order(positions) {
            resolve(&self.engine, &self.state, pos);
        }
        positions
            .iter()
            .map(|&pos| (pos, resolve(&self.engine, &self.state, pos)))
            .collect()
    }
}
