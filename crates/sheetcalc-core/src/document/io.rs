use std::path::Path;

use sheetcalc_engine::engine::{EvalOptions, RangeRef};
use tracing::info;

use super::Sheet;
use crate::error::Result;
use crate::storage::{parse_csv, read_sheet, write_csv, write_sheet};

impl Sheet {
    pub fn load(path: &Path) -> Result<Sheet> {
        let sheet = read_sheet(path)?;
        info!(path = %path.display(), cells = sheet.cells.len(), "loaded sheet");
        Ok(sheet)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_sheet(path, self)?;
        info!(path = %path.display(), "saved sheet");
        Ok(())
    }

    /// Import CSV values with the first field landing on (`row`, `col`).
    /// Returns the number of cells written.
    pub fn import_csv(&mut self, path: &Path, row: usize, col: usize) -> Result<usize> {
        let content = std::fs::read_to_string(path)?;
        let updates = parse_csv(&content, row, col);
        let count = updates.len();
        if count > 0 {
            self.update_cells(updates);
        }
        info!(path = %path.display(), count, "imported csv");
        Ok(count)
    }

    /// Write display values for `range`, or the used range when `None`.
    /// An empty sheet produces an empty file.
    pub fn export_csv(&self, path: &Path, range: Option<RangeRef>, options: EvalOptions) -> Result<()> {
        let rows = match range.or_else(|| self.used_range()) {
            Some(range) => self.render_range(&range, options),
            None => Vec::new(),
        };
        write_csv(path, &rows)?;
        info!(path = %path.display(), rows = rows.len(), "exported csv");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sheetcalc_engine::engine::CellRef;

    #[test]
    fn test_export_uses_display_values_over_used_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut sheet = Sheet::new("t", "u");
        sheet.set_input("B2".parse().unwrap(), "1.5");
        sheet.set_input("C2".parse().unwrap(), "hi, there");
        sheet.set_input("B3".parse().unwrap(), "=SUM(B2:B2)");
        sheet.set_input("C3".parse().unwrap(), "=SUM(C3)");

        sheet.export_csv(&path, None, EvalOptions::default()).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "1.5,\"hi, there\"\n1.5,#CIRCULAR!\n");
    }

    #[test]
    fn test_export_empty_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        Sheet::new("t", "u")
            .export_csv(&path, None, EvalOptions::default())
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_import_then_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("in.csv");
        std::fs::write(&csv, "3,4\n5,6\n").unwrap();
        let mut sheet = Sheet::new("t", "u");
        assert_eq!(sheet.import_csv(&csv, 0, 0).unwrap(), 4);
        sheet.set_input(CellRef::new(2, 0), "=SUM(A1:B2)");

        let json = dir.path().join("sheet.json");
        sheet.save(&json).unwrap();
        let loaded = Sheet::load(&json).unwrap();
        assert_eq!(loaded.display_value(CellRef::new(2, 0)), "18");
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Sheet::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, crate::SheetError::Io(_)));
    }
}
