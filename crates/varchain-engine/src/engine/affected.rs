//! Affected-set computation for incremental recomputation.

use std::collections::HashSet;

use super::ident::VarId;
use super::variable::Chain;

/// Identifiers whose value depends, directly or transitively, on `start`,
/// plus `start` itself.
///
/// Uses a work list over the reverse reference map; every identifier is
/// expanded at most once, so this terminates even if the graph is cyclic.
pub fn affected_by(start: &VarId, chain: &Chain) -> HashSet<VarId> {
    let dependents = chain.dependents();
    let mut affected = HashSet::new();
    let mut to_process = vec![start.clone()];

    while let Some(current) = to_process.pop() {
        if !affected.insert(current.clone()) {
            continue;
        }
        if let Some(deps) = dependents.get(&current) {
            to_process.extend(deps.iter().filter(|d| !affected.contains(*d)).cloned());
        }
    }

    affected
}

/// Affected identifiers ordered by chain position. Identifiers that are not
/// in the chain sort last.
pub fn affected_in_order(start: &VarId, chain: &Chain) -> Vec<VarId> {
    let mut ordered: Vec<VarId> = affected_by(start, chain).into_iter().collect();
    ordered.sort_by_key(|id| chain.position(id).unwrap_or(usize::MAX));
    ordered
}
