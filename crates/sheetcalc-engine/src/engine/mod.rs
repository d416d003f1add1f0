//! Spreadsheet engine API.
//!
//! This module provides the formula evaluation engine for a sheet:
//!
//! - [`CellRef`], [`RangeRef`] - Reference parsing (A1 notation ↔ row/col indices)
//! - [`Cell`], [`Grid`], [`CellStore`] - Cell storage and the read view the evaluator uses
//! - [`Formula`], [`parse_formula`], [`build_formula`] - The `=FUNCTION(RANGE)` grammar
//! - [`Evaluator`], [`RenderPass`], [`evaluate_formula`] - Recursive evaluation
//! - [`coerce_numeric`], [`classify`] - Value coercion and validation
//! - [`detect_cycle`], [`extract_dependencies`] - Static dependency analysis
//! - [`format_number`] - Format results for display

mod cell;
mod cell_ref;
mod coerce;
mod cycle;
mod deps;
mod eval;
mod format;
mod formula;

pub use cell::{Cell, CellContents, CellStore, Formatting, Grid};
pub use cell_ref::{CellRef, RangeCells, RangeRef, parse_range};
pub use coerce::{
    Numeric, TextTransform, ValueKind, classify, coerce_numeric, is_date, is_numeric, parse_date,
};
pub use cycle::{detect_cycle, detect_cycle_with};
pub use deps::{MAX_DEPENDENCY_RANGE_CELLS, extract_dependencies, store_dependencies};
pub use eval::{DEFAULT_MAX_DEPTH, EvalOptions, Evaluation, Evaluator, RenderPass, evaluate_formula};
pub use format::{DISPLAY_DECIMALS, format_number};
pub use formula::{Formula, build_formula, is_formula, parse_formula};
