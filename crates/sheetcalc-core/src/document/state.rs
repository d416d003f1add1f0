use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sheetcalc_engine::engine::{Cell, CellRef, Grid, RangeRef};

/// Identifier assigned by a [`crate::SheetStore`].
pub type SheetId = u64;

pub const DEFAULT_TITLE: &str = "Untitled Spreadsheet";
pub const DEFAULT_ROW_COUNT: usize = 100;
pub const DEFAULT_COL_COUNT: usize = 26;

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn default_row_count() -> usize {
    DEFAULT_ROW_COUNT
}

fn default_col_count() -> usize {
    DEFAULT_COL_COUNT
}

/// UI-agnostic state of one sheet.
///
/// `row_count`/`col_count` only bound what a grid renders; formulas may
/// reference cells outside them.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    #[serde(default)]
    pub id: SheetId,
    #[serde(default = "default_title")]
    pub title: String,
    pub user_id: String,
    /// Sparse cells (DashMap, so evaluation can read while others look up).
    #[serde(with = "cell_records", default)]
    pub cells: Grid,
    #[serde(default = "default_row_count")]
    pub row_count: usize,
    #[serde(default = "default_col_count")]
    pub col_count: usize,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub last_modified: DateTime<Utc>,
}

impl Sheet {
    /// Create an empty sheet. An empty title falls back to the default.
    pub fn new(title: &str, user_id: &str) -> Self {
        let now = Utc::now();
        let title = if title.trim().is_empty() {
            default_title()
        } else {
            title.to_string()
        };
        Sheet {
            id: 0,
            title,
            user_id: user_id.to_string(),
            cells: Grid::new(),
            row_count: DEFAULT_ROW_COUNT,
            col_count: DEFAULT_COL_COUNT,
            created_at: now,
            last_modified: now,
        }
    }

    pub fn get_cell(&self, at: &CellRef) -> Option<Cell> {
        self.cells.get(at).map(|cell| cell.clone())
    }

    /// All stored cells, row-major.
    pub fn list_cells(&self) -> Vec<(CellRef, Cell)> {
        let mut cells: Vec<(CellRef, Cell)> = self
            .cells
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        cells.sort_by_key(|(at, _)| *at);
        cells
    }

    /// Bounding box of cells with a value or formula.
    pub fn used_range(&self) -> Option<RangeRef> {
        let mut bounds: Option<(CellRef, CellRef)> = None;
        for entry in self.cells.iter() {
            if entry.value().is_blank() {
                continue;
            }
            let at = *entry.key();
            bounds = Some(match bounds {
                None => (at, at),
                Some((min, max)) => (
                    CellRef::new(min.row.min(at.row), min.col.min(at.col)),
                    CellRef::new(max.row.max(at.row), max.col.max(at.col)),
                ),
            });
        }
        bounds.map(|(min, max)| RangeRef::new(min, max))
    }

    /// The rendering extent from `row_count`/`col_count`.
    pub fn grid_range(&self) -> Option<RangeRef> {
        if self.row_count == 0 || self.col_count == 0 {
            return None;
        }
        Some(RangeRef::new(
            CellRef::new(0, 0),
            CellRef::new(self.row_count - 1, self.col_count - 1),
        ))
    }

    pub(crate) fn touch(&mut self) {
        self.last_modified = Utc::now();
    }
}

/// Cells persist as a list of `{row, col, value, formula, formatting}`
/// records; a later record for the same position wins.
mod cell_records {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use sheetcalc_engine::engine::{Cell, CellRef, Grid};

    #[derive(Serialize)]
    struct CellRecordRef<'a> {
        row: usize,
        col: usize,
        #[serde(flatten)]
        cell: &'a Cell,
    }

    #[derive(Deserialize)]
    struct CellRecord {
        row: usize,
        col: usize,
        #[serde(flatten)]
        cell: Cell,
    }

    pub fn serialize<S: Serializer>(grid: &Grid, serializer: S) -> Result<S::Ok, S::Error> {
        let mut cells: Vec<(CellRef, Cell)> = grid
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        cells.sort_by_key(|(at, _)| *at);
        serializer.collect_seq(cells.iter().map(|(at, cell)| CellRecordRef {
            row: at.row,
            col: at.col,
            cell,
        }))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Grid, D::Error> {
        let records = Vec::<CellRecord>::deserialize(deserializer)?;
        let grid = Grid::new();
        for record in records {
            grid.insert(CellRef::new(record.row, record.col), record.cell);
        }
        Ok(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_sheet_defaults() {
        let sheet = Sheet::new("", "user-1");
        assert_eq!(sheet.title, DEFAULT_TITLE);
        assert_eq!(sheet.row_count, 100);
        assert_eq!(sheet.col_count, 26);
        assert!(sheet.cells.is_empty());
        assert_eq!(sheet.grid_range().unwrap().to_string(), "A1:Z100");
        assert!(sheet.used_range().is_none());
    }

    #[test]
    fn test_used_range_ignores_blank_cells() {
        let sheet = Sheet::new("t", "u");
        sheet.cells.insert("B2".parse().unwrap(), Cell::new_value("1"));
        sheet.cells.insert("D5".parse().unwrap(), Cell::new_formula("=SUM(B2)"));
        sheet.cells.insert("Z99".parse().unwrap(), Cell::default());
        assert_eq!(sheet.used_range().unwrap().to_string(), "B2:D5");
    }

    #[test]
    fn test_list_cells_is_row_major() {
        let sheet = Sheet::new("t", "u");
        for token in ["C1", "A2", "B1"] {
            sheet.cells.insert(token.parse().unwrap(), Cell::new_value(token));
        }
        let order: Vec<String> = sheet
            .list_cells()
            .into_iter()
            .map(|(at, _)| at.to_string())
            .collect();
        assert_eq!(order, vec!["B1", "C1", "A2"]);
    }
}
