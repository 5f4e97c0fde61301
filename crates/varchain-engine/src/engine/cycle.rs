//! Circular reference detection for proposed formulas.
//!
//! Before a formula is committed we must verify it doesn't create a cycle
//! (e.g., A references B, B references C, C references A). The check walks
//! the current reference graph depth first with an explicit stack, so it
//! terminates on arbitrarily deep chains and on graphs that are already
//! cyclic.

use std::collections::HashSet;

use super::ident::VarId;
use super::refs::extract_references;
use super::variable::Chain;

/// Whether giving `id` the formula `formula` would create a cycle.
pub fn would_create_cycle(id: &VarId, formula: &str, chain: &Chain) -> bool {
    find_cycle(id, formula, chain).is_some()
}

/// Find the cycle that giving `id` the formula `formula` would create.
///
/// Returns the path starting and ending at `id` (or, for a graph that is
/// already cyclic, ending at the first node seen twice on the walk path).
/// `id` does not need to exist in the chain yet.
pub fn find_cycle(id: &VarId, formula: &str, chain: &Chain) -> Option<Vec<VarId>> {
    let mut done: HashSet<VarId> = HashSet::new();

    for root in extract_references(formula) {
        if let Some(mut path) = walk(id, &root, chain, &mut done) {
            path.insert(0, id.clone());
            return Some(path);
        }
    }
    None
}

/// Walk everything reachable from `root`. `done` carries fully explored
/// nodes across roots so shared sub-graphs are visited once.
fn walk(
    target: &VarId,
    root: &VarId,
    chain: &Chain,
    done: &mut HashSet<VarId>,
) -> Option<Vec<VarId>> {
    if root == target {
        return Some(vec![root.clone()]);
    }
    if done.contains(root) {
        return None;
    }

    let mut stack: Vec<(VarId, usize)> = vec![(root.clone(), 0)];
    let mut on_path: HashSet<VarId> = HashSet::from([root.clone()]);

    loop {
        let Some(top) = stack.last_mut() else {
            break;
        };
        let node = top.0.clone();
        let next = top.1;
        top.1 += 1;

        let children: &[VarId] = chain
            .get(&node)
            .map(|v| v.depends_on.as_slice())
            .unwrap_or(&[]);

        let Some(child) = children.get(next) else {
            stack.pop();
            on_path.remove(&node);
            done.insert(node);
            continue;
        };

        if child == target || on_path.contains(child) {
            let mut path: Vec<VarId> = stack.iter().map(|(n, _)| n.clone()).collect();
            path.push(child.clone());
            return Some(path);
        }
        if done.contains(child) {
            continue;
        }

        on_path.insert(child.clone());
        stack.push((child.clone(), 0));
    }

    None
}
