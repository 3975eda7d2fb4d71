//! Graph algorithms over the cells of a sheet.
//!
//! Edges live on the cells themselves (`references` outgoing, `dependents`
//! incoming) and are keyed by [`Position`]. Every traversal here runs on an
//! explicit work list, so chain length never translates into stack depth.
//!
//! # Invariants
//!
//! 1. **Bidirectional consistency:** `X ∈ A.references` iff `A ∈ X.dependents`.
//! 2. **Acyclic:** [`would_create_cycle`] is consulted before any edge is added.
//! 3. **Materialized targets:** every position in some `references` set has a cell.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use tabula_core::Position;

use crate::cell::Cell;

/// Storage the algorithms operate on
pub type CellMap = HashMap<Position, Cell>;

/// Check if giving `cell` the outgoing edges `new_refs` would close a cycle
///
/// Walks the existing `references` edges from each candidate target; reaching `cell`
/// means a cycle. Positions without a cell are leaves. Each cell is expanded at most
/// once, so shared sub-graphs cost O(edges) rather than O(paths).
pub fn would_create_cycle(cells: &CellMap, cell: Position, new_refs: &BTreeSet<Position>) -> bool {
    let mut visited = HashSet::new();
    let mut stack: Vec<Position> = new_refs.iter().copied().collect();

    while let Some(current) = stack.pop() {
        if current == cell {
            return true;
        }

        if !visited.insert(current) {
            continue;
        }

        if let Some(node) = cells.get(&current) {
            stack.extend(
                node.references()
                    .iter()
                    .filter(|pos| !visited.contains(*pos))
                    .copied(),
            );
        }
    }

    false
}

/// Replace the outgoing edges of `cell` with `new_refs`, updating the reverse edges
///
/// Only the difference is applied: targets that are no longer referenced lose `cell`
/// from their dependents, new targets gain it. Every new target must already be
/// materialized.
pub fn replace_references(cells: &mut CellMap, cell: Position, new_refs: BTreeSet<Position>) {
    let old_refs = match cells.get_mut(&cell) {
        Some(node) => std::mem::take(node.references_mut()),
        None => return,
    };

    for stale in old_refs.difference(&new_refs) {
        if let Some(target) = cells.get_mut(stale) {
            target.dependents_mut().remove(&cell);
        }
    }

    for added in new_refs.difference(&old_refs) {
        if let Some(target) = cells.get_mut(added) {
            target.dependents_mut().insert(cell);
        } else {
            tracing::error!("Reference target {} of {} is not materialized", added, cell);
        }
    }

    if let Some(node) = cells.get_mut(&cell) {
        *node.references_mut() = new_refs;
    }
}

/// Clear the memoized result of `changed` and of everything that transitively
/// depends on it
///
/// Returns the visited positions in breadth-first order, `changed` first. Each
/// position appears once however many paths lead to it.
pub fn invalidate(cells: &mut CellMap, changed: Position) -> Vec<Position> {
    let mut visited = HashSet::new();
    let mut order = Vec::new();
    let mut queue = VecDeque::new();
    queue.push_back(changed);

    while let Some(current) = queue.pop_front() {
        if !visited.insert(current) {
            continue;
        }

        let Some(node) = cells.get_mut(&current) else {
            continue;
        };
        node.clear_cache();
        order.push(current);

        for dependent in node.dependents() {
            if !visited.contains(dependent) {
                queue.push_back(*dependent);
            }
        }
    }

    tracing::trace!("Invalidated {} cells starting at {}", order.len(), changed);
    order
}

/// All cells that transitively depend on `cell`, sorted
pub fn transitive_dependents(cells: &CellMap, cell: Position) -> Vec<Position> {
    let mut visited = BTreeSet::new();
    let mut stack = vec![cell];

    while let Some(current) = stack.pop() {
        if let Some(node) = cells.get(&current) {
            for dependent in node.dependents() {
                if visited.insert(*dependent) {
                    stack.push(*dependent);
                }
            }
        }
    }

    visited.into_iter().collect()
}
