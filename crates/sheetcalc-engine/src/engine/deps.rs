//! Dependency extraction from formula strings.
//!
//! Lists the cells a formula reads. Used for static cycle reporting; the
//! evaluator itself resolves references on the fly.

use super::cell::CellStore;
use super::cell_ref::{CellRef, RangeRef};
use super::formula::parse_formula;

/// Ranges larger than this are not expanded cell by cell.
pub const MAX_DEPENDENCY_RANGE_CELLS: usize = 1_000_000;

/// Extract the cells a formula depends on, in row-major order.
///
/// Non-formulas and malformed formulas have no dependencies, and neither do
/// ranges over [`MAX_DEPENDENCY_RANGE_CELLS`].
pub fn extract_dependencies(formula: &str) -> Vec<CellRef> {
    let Ok(parsed) = parse_formula(formula) else {
        return Vec::new();
    };

    expand(&parsed.range).unwrap_or_default()
}

/// Like [`extract_dependencies`], but ranges too large to expand are
/// narrowed to the positions `store` actually holds.
pub fn store_dependencies<S: CellStore + ?Sized>(formula: &str, store: &S) -> Vec<CellRef> {
    let Ok(parsed) = parse_formula(formula) else {
        return Vec::new();
    };

    expand(&parsed.range).unwrap_or_else(|| store.positions_in(&parsed.range))
}

fn expand(range: &RangeRef) -> Option<Vec<CellRef>> {
    match range.cell_count() {
        Some(count) if count <= MAX_DEPENDENCY_RANGE_CELLS => Some(range.iter().collect()),
        _ => None,
    }
}
