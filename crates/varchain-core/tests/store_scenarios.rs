//! End-to-end edit and recompute scenarios for the variable store.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::HashSet;
use varchain_core::{Value, VarId, VarchainError, VariableStore};

fn id(name: &str) -> VarId {
    VarId::from_str(name).unwrap()
}

fn three_var_store() -> VariableStore {
    let mut store = VariableStore::new();
    store.insert("VAR_1", "1").unwrap();
    store.insert("VAR_2", "2").unwrap();
    store.insert("VAR_3", "VAR_1 + VAR_2").unwrap();
    store.recompute_all();
    store
}

#[test]
fn seeded_chain_evaluates_in_order() {
    let mut store = VariableStore::fibonacci_chain(1000, "VAR_").unwrap();
    store.recompute_all();

    let values: Vec<f64> = store
        .iter()
        .take(6)
        .map(|v| v.value.as_number().unwrap())
        .collect();
    assert_eq!(values, vec![1.0, 2.0, 3.0, 5.0, 8.0, 13.0]);
    assert!(store.value("VAR_1000").and_then(Value::as_number).is_some());
}

#[test]
fn editing_the_head_of_a_seeded_chain_reaches_the_tail() {
    let mut store = VariableStore::fibonacci_chain(1000, "VAR_").unwrap();
    store.recompute_all();

    // VAR_2 is a literal; everything from VAR_3 on reads VAR_1.
    let affected = store.update_formula("VAR_1", "0").unwrap();
    assert_eq!(affected.len(), 999);
    assert!(!affected.contains(&id("VAR_2")));

    let recomputed = store.recompute_from("VAR_1").unwrap();
    assert_eq!(recomputed, affected);
    assert_eq!(store.value("VAR_3"), Some(&Value::Number(2.0)));
}

#[test]
fn update_then_recompute_leaves_unrelated_values() {
    let mut store = three_var_store();
    store.insert("OTHER", "VAR_2 * 100").unwrap();
    store.recompute_all();

    store.set_formula("VAR_1", "10").unwrap();

    assert_eq!(store.value("VAR_3"), Some(&Value::Number(12.0)));
    assert_eq!(store.value("OTHER"), Some(&Value::Number(200.0)));
}

#[test]
fn circular_edit_is_rejected_without_changes() {
    let mut store = three_var_store();
    let before = store.snapshot();

    let err = store.update_formula("VAR_1", "VAR_3").unwrap_err();
    assert!(matches!(err, VarchainError::CircularReference { .. }));
    assert_eq!(err.to_string(), "Circular reference: VAR_1 -> VAR_3 -> VAR_1");
    assert_eq!(store.snapshot(), before);
    assert_eq!(store.value("VAR_1"), Some(&Value::Number(1.0)));
}

#[test]
fn referenced_variable_cannot_be_removed() {
    let mut store = VariableStore::new();
    store.insert("VAR_1", "1").unwrap();
    store.insert("VAR_2", "VAR_1").unwrap();

    let err = store.remove("VAR_1").unwrap_err();
    assert_eq!(err.to_string(), "Variable VAR_1 is referenced by VAR_2");
    assert_eq!(store.len(), 2);
}

#[test]
fn snapshot_preserves_insertion_order_after_edits() {
    let mut store = VariableStore::new();
    for (name, formula) in [("C", "1"), ("A", "C"), ("B", "A + C")] {
        store.insert(name, formula).unwrap();
    }
    store.update_formula("C", "5").unwrap();
    store.rename("A", "MIDDLE").unwrap();

    let order: Vec<VarId> = store.snapshot().into_iter().map(|(id, _)| id).collect();
    assert_eq!(order, vec![id("C"), id("MIDDLE"), id("B")]);
    assert_eq!(store.formula("B"), Some("MIDDLE + C"));
}

/// Build a store where variable `i` reads some of the variables before it.
fn acyclic_store(picks: &[Vec<prop::sample::Index>]) -> VariableStore {
    let mut store = VariableStore::new();
    for (i, refs) in picks.iter().enumerate() {
        let formula = if i == 0 || refs.is_empty() {
            format!("{}", i + 1)
        } else {
            refs.iter()
                .map(|ix| format!("V_{}", ix.index(i)))
                .collect::<Vec<_>>()
                .join(" + ")
        };
        store.insert(&format!("V_{}", i), &formula).unwrap();
    }
    store
}

proptest! {
    #[test]
    fn update_formula_returns_exactly_the_dependents(
        picks in prop::collection::vec(prop::collection::vec(any::<prop::sample::Index>(), 0..3), 1..30),
        target in any::<prop::sample::Index>(),
    ) {
        let mut store = acyclic_store(&picks);
        let name = format!("V_{}", target.index(picks.len()));
        let affected = store.update_formula(&name, "42").unwrap();

        // Every affected variable is the target or reads an affected one.
        let target_id = id(&name);
        prop_assert!(affected.contains(&target_id));
        for variable in store.iter() {
            let reads_affected = variable.depends_on.iter().any(|d| affected.contains(d));
            if variable.id != target_id {
                prop_assert_eq!(affected.contains(&variable.id), reads_affected);
            }
        }
    }

    #[test]
    fn recompute_from_matches_full_recompute(
        picks in prop::collection::vec(prop::collection::vec(any::<prop::sample::Index>(), 0..3), 1..30),
        target in any::<prop::sample::Index>(),
        literal in -1000i32..1000,
    ) {
        let mut incremental = acyclic_store(&picks);
        incremental.recompute_all();
        let mut full = acyclic_store(&picks);

        let name = format!("V_{}", target.index(picks.len()));
        incremental.set_formula(&name, &literal.to_string()).unwrap();
        full.update_formula(&name, &literal.to_string()).unwrap();
        full.recompute_all();

        let a: Vec<Value> = incremental.iter().map(|v| v.value.clone()).collect();
        let b: Vec<Value> = full.iter().map(|v| v.value.clone()).collect();
        prop_assert_eq!(a, b);
        let dirty: HashSet<VarId> = incremental.dirty().into_iter().collect();
        prop_assert!(dirty.is_empty());
    }
}
