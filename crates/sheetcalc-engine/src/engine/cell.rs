//! Cell data structures and the read-only cell store view.
//!
//! - [`Cell`] - raw value, formula and formatting of one grid position
//! - [`Formatting`] - style attributes (opaque to the evaluator)
//! - [`Grid`] - thread-safe sparse storage for cells (backed by `DashMap`)
//! - [`CellStore`] - what the evaluator reads: contents by position

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use super::cell_ref::{CellRef, RangeRef};

/// Style attributes of a cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Formatting {
    pub bold: bool,
    pub italic: bool,
    pub font_size: u32,
    pub color: String,
    pub background_color: String,
}

impl Default for Formatting {
    fn default() -> Self {
        Formatting {
            bold: false,
            italic: false,
            font_size: 12,
            color: "#000000".to_string(),
            background_color: "#ffffff".to_string(),
        }
    }
}

/// A cell in the sheet.
///
/// When `formula` is non-empty it drives the display and `value` is ignored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cell {
    pub value: String,
    pub formula: String,
    pub formatting: Formatting,
}

impl Cell {
    pub fn new_value(value: &str) -> Cell {
        Cell {
            value: value.to_string(),
            ..Cell::default()
        }
    }

    pub fn new_formula(formula: &str) -> Cell {
        Cell {
            formula: formula.to_string(),
            ..Cell::default()
        }
    }

    /// Parse edit-bar input: text starting with `=` is a formula, anything
    /// else is a plain value. The other field is cleared.
    pub fn from_input(input: &str) -> Cell {
        if input.starts_with('=') {
            Cell::new_formula(input)
        } else {
            Cell::new_value(input)
        }
    }

    pub fn is_formula(&self) -> bool {
        !self.formula.is_empty()
    }

    /// A cell with neither value nor formula reads the same as an absent one.
    pub fn is_blank(&self) -> bool {
        self.value.is_empty() && self.formula.is_empty()
    }

    /// Text shown in the edit bar: the formula if present, else the value.
    pub fn edit_text(&self) -> &str {
        if self.is_formula() {
            &self.formula
        } else {
            &self.value
        }
    }

    pub fn contents(&self) -> CellContents {
        if self.is_formula() {
            CellContents::Formula(self.formula.clone())
        } else {
            CellContents::Value(self.value.clone())
        }
    }
}

/// What drives a cell's display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CellContents {
    Value(String),
    Formula(String),
}

/// Thread-safe sparse grid storage.
pub type Grid = DashMap<CellRef, Cell>;

/// Read access to a sheet's cells, keyed by position.
///
/// Implementations are treated as an immutable snapshot for the duration of
/// one evaluation.
pub trait CellStore {
    /// Contents at `at`, or `None` if nothing was ever written there.
    fn contents(&self, at: &CellRef) -> Option<CellContents>;

    /// Number of stored cells.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored positions inside `range`, in row-major order.
    fn positions_in(&self, range: &RangeRef) -> Vec<CellRef>;
}

impl<S: BuildHasher + Clone> CellStore for DashMap<CellRef, Cell, S> {
    fn contents(&self, at: &CellRef) -> Option<CellContents> {
        self.get(at).map(|cell| cell.contents())
    }

    fn len(&self) -> usize {
        DashMap::len(self)
    }

    fn positions_in(&self, range: &RangeRef) -> Vec<CellRef> {
        let mut positions: Vec<CellRef> = self
            .iter()
            .map(|entry| *entry.key())
            .filter(|at| range.contains(at))
            .collect();
        positions.sort();
        positions
    }
}

impl<S: BuildHasher> CellStore for HashMap<CellRef, Cell, S> {
    fn contents(&self, at: &CellRef) -> Option<CellContents> {
        self.get(at).map(Cell::contents)
    }

    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn positions_in(&self, range: &RangeRef) -> Vec<CellRef> {
        let mut positions: Vec<CellRef> =
            self.keys().copied().filter(|at| range.contains(at)).collect();
        positions.sort();
        positions
    }
}

impl CellStore for BTreeMap<CellRef, Cell> {
    fn contents(&self, at: &CellRef) -> Option<CellContents> {
        self.get(at).map(Cell::contents)
    }

    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn positions_in(&self, range: &RangeRef) -> Vec<CellRef> {
        let n = range.normalized();
        self.range(n.start..=n.end)
            .map(|(at, _)| *at)
            .filter(|at| n.contains(at))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_input_splits_formula_and_value() {
        let formula = Cell::from_input("=SUM(A1:A3)");
        assert_eq!(formula.formula, "=SUM(A1:A3)");
        assert_eq!(formula.value, "");
        assert!(formula.is_formula());

        let value = Cell::from_input(" 42 ");
        assert_eq!(value.value, " 42 ");
        assert_eq!(value.formula, "");
        assert!(!value.is_formula());
    }

    #[test]
    fn test_formula_drives_contents() {
        let cell = Cell {
            value: "stale".to_string(),
            formula: "=SUM(A1)".to_string(),
            ..Cell::default()
        };
        assert_eq!(cell.contents(), CellContents::Formula("=SUM(A1)".to_string()));
        assert_eq!(cell.edit_text(), "=SUM(A1)");
    }

    #[test]
    fn test_formatting_defaults() {
        let cell = Cell::new_value("hello");
        assert!(!cell.formatting.bold);
        assert_eq!(cell.formatting.font_size, 12);
        assert_eq!(cell.formatting.color, "#000000");
        assert_eq!(cell.formatting.background_color, "#ffffff");
        assert!(Cell::default().is_blank());
    }

    #[test]
    fn test_stores_agree_on_positions() {
        let grid = Grid::new();
        let mut btree = BTreeMap::new();
        let mut hash = HashMap::new();
        for (row, col) in [(2, 0), (0, 1), (5, 5), (1, 0)] {
            let at = CellRef::new(row, col);
            grid.insert(at, Cell::new_value("x"));
            btree.insert(at, Cell::new_value("x"));
            hash.insert(at, Cell::new_value("x"));
        }
        let range = RangeRef::parse("B3:A1").unwrap();
        let expected = vec![CellRef::new(0, 1), CellRef::new(1, 0), CellRef::new(2, 0)];
        assert_eq!(grid.positions_in(&range), expected);
        assert_eq!(btree.positions_in(&range), expected);
        assert_eq!(hash.positions_in(&range), expected);
        assert_eq!(CellStore::len(&grid), 4);
        assert!(grid.contents(&CellRef::new(9, 9)).is_none());
    }
}
