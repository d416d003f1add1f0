use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sheetcalc_engine::Aggregate;
use sheetcalc_engine::engine::{Cell, CellRef, Formatting, RangeRef, TextTransform, build_formula};
use tracing::debug;

use super::Sheet;
use crate::error::{Result, SheetError};

/// Formatting fields to overwrite; `None` keeps the current value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormattingPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

impl FormattingPatch {
    pub fn apply(&self, formatting: &mut Formatting) {
        if let Some(bold) = self.bold {
            formatting.bold = bold;
        }
        if let Some(italic) = self.italic {
            formatting.italic = italic;
        }
        if let Some(font_size) = self.font_size {
            formatting.font_size = font_size;
        }
        if let Some(color) = &self.color {
            formatting.color = color.clone();
        }
        if let Some(background_color) = &self.background_color {
            formatting.background_color = background_color.clone();
        }
    }
}

/// A partial write to one cell.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellUpdate {
    pub row: usize,
    pub col: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatting: Option<FormattingPatch>,
}

impl CellUpdate {
    pub fn new(at: CellRef) -> Self {
        CellUpdate {
            row: at.row,
            col: at.col,
            ..CellUpdate::default()
        }
    }

    /// Edit-bar input: `=...` sets the formula, anything else the value.
    /// The other field is cleared.
    pub fn input(at: CellRef, input: &str) -> Self {
        let cell = Cell::from_input(input);
        CellUpdate::new(at).value(&cell.value).formula(&cell.formula)
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn formula(mut self, formula: &str) -> Self {
        self.formula = Some(formula.to_string());
        self
    }

    pub fn formatting(mut self, patch: FormattingPatch) -> Self {
        self.formatting = Some(patch);
        self
    }

    pub fn cell_ref(&self) -> CellRef {
        CellRef::new(self.row, self.col)
    }
}

/// Sheet-level metadata changes. Empty titles and zero counts are ignored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SheetPatch {
    pub title: Option<String>,
    pub row_count: Option<usize>,
    pub col_count: Option<usize>,
}

impl Sheet {
    fn apply_update(&mut self, update: CellUpdate) {
        let mut cell = self.cells.entry(update.cell_ref()).or_default();
        if let Some(value) = update.value {
            cell.value = value;
        }
        if let Some(formula) = update.formula {
            cell.formula = formula;
        }
        if let Some(patch) = update.formatting {
            patch.apply(&mut cell.formatting);
        }
    }

    /// Merge one update into the sheet, creating the cell if needed.
    pub fn update_cell(&mut self, update: CellUpdate) {
        self.apply_update(update);
        self.touch();
    }

    /// Apply updates in order; later updates to the same cell win.
    pub fn update_cells(&mut self, updates: impl IntoIterator<Item = CellUpdate>) {
        for update in updates {
            self.apply_update(update);
        }
        self.touch();
    }

    pub fn update_meta(&mut self, patch: SheetPatch) {
        if let Some(title) = patch.title.filter(|t| !t.is_empty()) {
            self.title = title;
        }
        if let Some(rows) = patch.row_count.filter(|&n| n > 0) {
            self.row_count = rows;
        }
        if let Some(cols) = patch.col_count.filter(|&n| n > 0) {
            self.col_count = cols;
        }
        self.touch();
    }

    /// Set cell contents from edit-bar input.
    pub fn set_input(&mut self, at: CellRef, input: &str) {
        self.update_cell(CellUpdate::input(at, input));
    }

    /// Empty value and formula, keeping formatting.
    pub fn clear_cell(&mut self, at: CellRef) {
        if self.cells.contains_key(&at) {
            self.update_cell(CellUpdate::new(at).value("").formula(""));
        }
    }

    pub fn edit_text(&self, at: &CellRef) -> String {
        self.cells
            .get(at)
            .map(|cell| cell.edit_text().to_string())
            .unwrap_or_default()
    }

    fn value_at(&self, at: &CellRef) -> String {
        self.cells
            .get(at)
            .map(|cell| cell.value.clone())
            .unwrap_or_default()
    }

    /// Transform the stored value and drop any formula.
    pub fn apply_text_transform(&mut self, at: CellRef, transform: TextTransform) {
        let value = transform.apply(&self.value_at(&at));
        self.update_cell(CellUpdate::new(at).value(&value).formula(""));
    }

    /// Clear every row of `range` whose values repeat an earlier row.
    /// Returns the number of rows cleared.
    pub fn remove_duplicates(&mut self, range: &RangeRef) -> usize {
        let range = range.normalized();
        let mut seen: HashSet<Vec<String>> = HashSet::new();
        let mut updates = Vec::new();
        let mut cleared = 0;

        for row in range.start.row..=range.end.row {
            let values: Vec<String> = (range.start.col..=range.end.col)
                .map(|col| self.value_at(&CellRef::new(row, col)))
                .collect();
            if seen.insert(values) {
                continue;
            }
            cleared += 1;
            for col in range.start.col..=range.end.col {
                let at = CellRef::new(row, col);
                if self.cells.contains_key(&at) {
                    updates.push(CellUpdate::new(at).value("").formula(""));
                }
            }
        }

        debug!(range = %range, cleared, "removed duplicate rows");
        if !updates.is_empty() {
            self.update_cells(updates);
        }
        cleared
    }

    /// Replace every occurrence of `find` in the values of `range`.
    /// Returns the number of cells changed.
    pub fn find_and_replace(&mut self, range: &RangeRef, find: &str, replace: &str) -> Result<usize> {
        if find.is_empty() {
            return Err(SheetError::EmptyFind);
        }
        let updates: Vec<CellUpdate> = range
            .normalized()
            .iter()
            .filter_map(|at| {
                let cell = self.cells.get(&at)?;
                if !cell.value.contains(find) {
                    return None;
                }
                let value = cell.value.replace(find, replace);
                Some(CellUpdate::new(at).value(&value))
            })
            .collect();

        let changed = updates.len();
        if changed > 0 {
            self.update_cells(updates);
        }
        Ok(changed)
    }

    /// Write `=FUNC(range)` into `target`.
    pub fn apply_function(&mut self, function: Aggregate, range: &RangeRef, target: CellRef) -> String {
        let formula = build_formula(function, range);
        self.update_cell(CellUpdate::new(target).value("").formula(&formula));
        formula
    }

    fn update_formatting(&mut self, range: &RangeRef, patch: impl Fn(&Formatting) -> FormattingPatch) {
        let updates: Vec<CellUpdate> = range
            .normalized()
            .iter()
            .map(|at| {
                let current = self
                    .cells
                    .get(&at)
                    .map(|cell| cell.formatting.clone())
                    .unwrap_or_default();
                CellUpdate::new(at).formatting(patch(&current))
            })
            .collect();
        self.update_cells(updates);
    }

    /// Flip bold on each cell in `range` independently.
    pub fn toggle_bold(&mut self, range: &RangeRef) {
        self.update_formatting(range, |current| FormattingPatch {
            bold: Some(!current.bold),
            ..FormattingPatch::default()
        });
    }

    pub fn toggle_italic(&mut self, range: &RangeRef) {
        self.update_formatting(range, |current| FormattingPatch {
            italic: Some(!current.italic),
            ..FormattingPatch::default()
        });
    }

    pub fn set_color(&mut self, range: &RangeRef, color: &str) {
        self.update_formatting(range, |_| FormattingPatch {
            color: Some(color.to_string()),
            ..FormattingPatch::default()
        });
    }

    pub fn set_background_color(&mut self, range: &RangeRef, color: &str) {
        self.update_formatting(range, |_| FormattingPatch {
            background_color: Some(color.to_string()),
            ..FormattingPatch::default()
        });
    }
}
