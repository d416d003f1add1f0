use sheetcalc_engine::engine::{
    CellRef, EvalOptions, Evaluation, Evaluator, Grid, RangeRef, RenderPass, ValueKind, classify,
    detect_cycle_with,
};
use std::collections::HashSet;
use tracing::debug;

use super::Sheet;

/// A formula cell whose dependencies loop back on themselves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CycleReport {
    pub cell: CellRef,
    /// Starts at `cell`; the last entry is the cell that closed the loop.
    pub path: Vec<CellRef>,
}

impl Sheet {
    pub fn evaluator(&self, options: EvalOptions) -> Evaluator<'_, Grid> {
        Evaluator::with_options(&self.cells, options)
    }

    /// Start a memoised pass. Drop it before mutating the sheet.
    pub fn render_pass(&self, options: EvalOptions) -> RenderPass<'_, Grid> {
        RenderPass::with_options(&self.cells, options)
    }

    pub fn evaluate(&self, at: CellRef) -> Evaluation {
        self.evaluator(EvalOptions::default()).evaluate_cell(at)
    }

    /// What the grid shows for `at`.
    pub fn display_value(&self, at: CellRef) -> String {
        self.evaluate(at).display()
    }

    /// Display strings for the whole `row_count` x `col_count` grid.
    pub fn render(&self) -> Vec<Vec<String>> {
        self.render_with(EvalOptions::default())
    }

    pub fn render_with(&self, options: EvalOptions) -> Vec<Vec<String>> {
        match self.grid_range() {
            Some(range) => self.render_range(&range, options),
            None => Vec::new(),
        }
    }

    pub fn render_range(&self, range: &RangeRef, options: EvalOptions) -> Vec<Vec<String>> {
        self.render_pass(options).render(range)
    }

    /// Classification of each stored value in `range`, as the validation
    /// panel shows it. Formula cells are classified by their display.
    pub fn classify_range(&self, range: &RangeRef) -> Vec<(CellRef, ValueKind)> {
        let mut pass = self.render_pass(EvalOptions::default());
        self.list_cells()
            .into_iter()
            .filter(|(at, cell)| range.normalized().contains(at) && !cell.is_blank())
            .map(|(at, _)| (at, classify(&pass.display(at))))
            .collect()
    }

    /// Every formula cell that sits on or leads into a cycle.
    pub fn find_cycles(&self) -> Vec<CycleReport> {
        let mut finished = HashSet::new();
        let reports: Vec<CycleReport> = self
            .list_cells()
            .into_iter()
            .filter(|(_, cell)| cell.is_formula())
            .filter_map(|(at, _)| {
                detect_cycle_with(&at, &self.cells, &mut finished)
                    .map(|path| CycleReport { cell: at, path })
            })
            .collect();
        debug!(count = reports.len(), "cycle scan finished");
        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sheetcalc_engine::EvalError;

    fn at(token: &str) -> CellRef {
        token.parse().unwrap()
    }

    fn sheet_with(cells: &[(&str, &str)]) -> Sheet {
        let mut sheet = Sheet::new("test", "user");
        for (token, input) in cells {
            sheet.set_input(at(token), input);
        }
        sheet
    }

    #[test]
    fn test_display_value() {
        let sheet = sheet_with(&[("A1", "2"), ("A2", "3"), ("A3", "=SUM(A1:A2)")]);
        assert_eq!(sheet.display_value(at("A3")), "5");
        assert_eq!(sheet.display_value(at("A1")), "2");
        assert_eq!(sheet.display_value(at("Q9")), "");
        assert_eq!(sheet.evaluate(at("A3")), Evaluation::Number(5.0));
    }

    #[test]
    fn test_render_covers_grid_extent() {
        let mut sheet = sheet_with(&[("A1", "1"), ("B2", "=SUM(A1)")]);
        sheet.row_count = 2;
        sheet.col_count = 3;
        assert_eq!(
            sheet.render(),
            vec![
                vec!["1".to_string(), String::new(), String::new()],
                vec![String::new(), "1".to_string(), String::new()],
            ]
        );
    }

    #[test]
    fn test_render_matches_single_cell_evaluation() {
        let sheet = sheet_with(&[
            ("A1", "=SUM(B1)"),
            ("B1", "=SUM(A1)"),
            ("C1", "4"),
            ("C2", "=AVERAGE(C1:C1)"),
            ("C3", "=MAX(C1:C2)"),
        ]);
        let range: RangeRef = "A1:C3".parse().unwrap();
        let rendered = sheet.render_range(&range, EvalOptions::default());
        for (r, row) in rendered.iter().enumerate() {
            for (c, shown) in row.iter().enumerate() {
                assert_eq!(shown, &sheet.display_value(CellRef::new(r, c)));
            }
        }
        assert_eq!(rendered[0][0], "#CIRCULAR!");
    }

    #[test]
    fn test_depth_option_reaches_evaluator() {
        let mut sheet = sheet_with(&[("A1", "1")]);
        for row in 1..10 {
            sheet.set_input(CellRef::new(row, 0), &format!("=SUM(A{})", row));
        }
        let shallow = EvalOptions { max_depth: 3 };
        assert_eq!(
            sheet.evaluator(shallow).evaluate_cell(at("A10")),
            Evaluation::Error(EvalError::DepthExceeded)
        );
        assert_eq!(sheet.display_value(at("A10")), "1");
    }

    #[test]
    fn test_classify_range() {
        let sheet = sheet_with(&[
            ("A1", "12"),
            ("A2", "01/15/2024"),
            ("A3", "hello"),
            ("A4", "=SUM(A1)"),
            ("B1", "ignored"),
        ]);
        let kinds = sheet.classify_range(&"A1:A5".parse().unwrap());
        assert_eq!(
            kinds,
            vec![
                (at("A1"), ValueKind::Number),
                (at("A2"), ValueKind::Date),
                (at("A3"), ValueKind::Text),
                (at("A4"), ValueKind::Number),
            ]
        );
    }

    #[test]
    fn test_find_cycles() {
        let sheet = sheet_with(&[
            ("A1", "=SUM(B1)"),
            ("B1", "=SUM(A1)"),
            ("C1", "=SUM(D1)"),
            ("D1", "5"),
        ]);
        let cells: Vec<CellRef> = sheet.find_cycles().into_iter().map(|r| r.cell).collect();
        assert_eq!(cells, vec![at("A1"), at("B1")]);
        let report = &sheet.find_cycles()[0];
        assert_eq!(report.path, vec![at("A1"), at("B1"), at("A1")]);
    }

    #[test]
    fn test_cycle_scan_agrees_with_evaluation() {
        let sheet = sheet_with(&[("A1", "=SUM(A1:B1000000)"), ("B9", "2")]);
        assert_eq!(sheet.display_value(at("A1")), "#CIRCULAR!");
        let reports = sheet.find_cycles();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].path, vec![at("A1"), at("A1")]);
    }

    #[test]
    fn test_find_cycles_on_long_chain() {
        let mut sheet = Sheet::new("t", "u");
        sheet.set_input(CellRef::new(0, 0), "1");
        for row in 1..50_000 {
            sheet.set_input(CellRef::new(row, 0), &format!("=SUM(A{row})"));
        }
        assert!(sheet.find_cycles().is_empty());
        assert_eq!(sheet.display_value(CellRef::new(49_999, 0)), "#DEPTH!");
    }
}
