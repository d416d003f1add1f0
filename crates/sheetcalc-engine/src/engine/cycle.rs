//! Circular dependency detection for formula cells.
//!
//! Cycles are legal in a sheet (the evaluator reports them as `#CIRCULAR!`),
//! but tooling wants to show *where* a cycle runs. This walks formula
//! dependencies depth-first and returns the path that closes the loop. The
//! walk keeps its own stack, so chain length is bounded by memory only.

use std::collections::HashSet;

use super::cell::{CellContents, CellStore};
use super::cell_ref::CellRef;
use super::deps::store_dependencies;

/// Detect circular dependencies starting from a cell.
/// Returns Some(cycle_path) if a cycle is found, None otherwise.
///
/// The path starts at `start` and ends with the cell that was revisited.
pub fn detect_cycle<S: CellStore + ?Sized>(start: &CellRef, store: &S) -> Option<Vec<CellRef>> {
    detect_cycle_with(start, store, &mut HashSet::new())
}

/// [`detect_cycle`] sharing `finished` across calls on the same store.
///
/// `finished` collects cells known not to reach any cycle; later calls skip
/// them. Reuse it only while the store is unchanged.
pub fn detect_cycle_with<S: CellStore + ?Sized>(
    start: &CellRef,
    store: &S,
    finished: &mut HashSet<CellRef>,
) -> Option<Vec<CellRef>> {
    if finished.contains(start) {
        return None;
    }
    let Some(deps) = dependencies(start, store) else {
        finished.insert(*start);
        return None;
    };

    let mut visiting = HashSet::from([*start]);
    // The current path, each cell with the dependencies it has left to visit.
    let mut stack = vec![(*start, deps.into_iter())];

    while let Some((_, pending)) = stack.last_mut() {
        let Some(dep) = pending.next() else {
            if let Some((done, _)) = stack.pop() {
                visiting.remove(&done);
                finished.insert(done);
            }
            continue;
        };

        if visiting.contains(&dep) {
            let mut path: Vec<CellRef> = stack.iter().map(|(cell, _)| *cell).collect();
            path.push(dep);
            return Some(path);
        }
        if finished.contains(&dep) {
            continue;
        }
        match dependencies(&dep, store) {
            Some(deps) => {
                visiting.insert(dep);
                stack.push((dep, deps.into_iter()));
            }
            None => {
                finished.insert(dep);
            }
        }
    }
    None
}

/// Cells read by the formula at `at`; `None` for anything but a formula.
fn dependencies<S: CellStore + ?Sized>(at: &CellRef, store: &S) -> Option<Vec<CellRef>> {
    match store.contents(at) {
        Some(CellContents::Formula(formula)) => Some(store_dependencies(&formula, store)),
        _ => None,
    }
}
