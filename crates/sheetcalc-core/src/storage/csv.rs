//! CSV import/export functionality

use std::io::Write;
use std::path::Path;

use sheetcalc_engine::engine::CellRef;
use tracing::debug;

use crate::document::CellUpdate;
use crate::error::Result;

/// Parse CSV content into value updates, starting at the given offset.
/// Empty fields are skipped. Fields are stored as plain values, never formulas.
/// Fields that would land past the last addressable row or column are dropped.
pub fn parse_csv(content: &str, start_row: usize, start_col: usize) -> Vec<CellUpdate> {
    let mut updates = Vec::new();
    for (row_idx, record) in parse_csv_records(content).into_iter().enumerate() {
        for (col_idx, field) in record.into_iter().enumerate() {
            if field.is_empty() {
                continue;
            }
            let (Some(row), Some(col)) = (
                start_row.checked_add(row_idx),
                start_col.checked_add(col_idx),
            ) else {
                debug!(row_idx, col_idx, "csv field outside the sheet");
                continue;
            };
            updates.push(CellUpdate::new(CellRef::new(row, col)).value(&field).formula(""));
        }
    }
    updates
}

/// Split CSV content into records of fields. Quoted fields may contain
/// commas, doubled quotes and line breaks; `\r\n` ends a record like `\n`.
pub(crate) fn parse_csv_records(content: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => fields.push(std::mem::take(&mut current)),
                '\r' if chars.peek() == Some(&'\n') => {}
                '\n' => {
                    fields.push(std::mem::take(&mut current));
                    records.push(std::mem::take(&mut fields));
                }
                _ => current.push(c),
            }
        }
    }
    if !current.is_empty() || !fields.is_empty() {
        fields.push(current);
        records.push(fields);
    }
    records
}

/// Render rows of display strings as CSV text.
pub fn csv_content(rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    for row in rows {
        let fields: Vec<String> = row.iter().map(|field| escape_csv_field(field)).collect();
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

pub fn write_csv(path: &Path, rows: &[Vec<String>]) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(csv_content(rows).as_bytes())?;
    Ok(())
}

/// Escape a field for CSV output
fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Sheet;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_csv_records() {
        assert_eq!(parse_csv_records("x,y"), vec![vec!["x", "y"]]);
        assert_eq!(parse_csv_records("1,,3\r\n4\n"), vec![vec!["1", "", "3"], vec!["4"]]);
        assert_eq!(parse_csv_records(" padded ,"), vec![vec![" padded ", ""]]);
        assert_eq!(
            parse_csv_records(r#""Smith, J","says ""hi""",end"#),
            vec![vec!["Smith, J", r#"says "hi""#, "end"]]
        );
        assert_eq!(
            parse_csv_records("\"two\nlines\",b\nc"),
            vec![vec!["two\nlines", "b"], vec!["c"]]
        );
    }

    #[test]
    fn test_multiline_field_survives_export_and_import() {
        let rows = vec![vec!["note\nsecond line".to_string(), "2".to_string()]];
        let updates = parse_csv(&csv_content(&rows), 0, 0);
        let mut sheet = Sheet::new("t", "u");
        sheet.update_cells(updates);
        assert_eq!(sheet.edit_text(&CellRef::new(0, 0)), "note\nsecond line");
        assert_eq!(sheet.edit_text(&CellRef::new(0, 1)), "2");
        assert!(sheet.get_cell(&CellRef::new(1, 0)).is_none());
    }

    #[test]
    fn test_import_past_last_row_is_dropped() {
        let updates = parse_csv("a,b\nc", usize::MAX, usize::MAX - 1);
        let cells: Vec<CellRef> = updates.iter().map(CellUpdate::cell_ref).collect();
        assert_eq!(
            cells,
            vec![
                CellRef::new(usize::MAX, usize::MAX - 1),
                CellRef::new(usize::MAX, usize::MAX),
            ]
        );
    }

    #[test]
    fn test_escape_csv_field() {
        assert_eq!(escape_csv_field("#CIRCULAR!"), "#CIRCULAR!");
        assert_eq!(escape_csv_field("1,5"), "\"1,5\"");
        assert_eq!(escape_csv_field("6\" tall"), "\"6\"\" tall\"");
        assert_eq!(escape_csv_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_import_keeps_formula_text_as_value() {
        let updates = parse_csv("1,,=SUM(A1)\n007", 2, 1);
        let mut sheet = Sheet::new("t", "u");
        sheet.update_cells(updates);
        assert_eq!(sheet.edit_text(&CellRef::new(2, 1)), "1");
        assert!(sheet.get_cell(&CellRef::new(2, 2)).is_none());
        let c3 = sheet.get_cell(&CellRef::new(2, 3)).unwrap();
        assert_eq!(c3.value, "=SUM(A1)");
        assert_eq!(c3.formula, "");
        assert_eq!(sheet.edit_text(&CellRef::new(3, 1)), "007");
    }

    #[test]
    fn test_import_recomputes_dependents() {
        let mut sheet = Sheet::new("t", "u");
        sheet.set_input(CellRef::new(0, 0), "1");
        sheet.set_input(CellRef::new(0, 1), "=SUM(A1)");
        assert_eq!(sheet.display_value(CellRef::new(0, 1)), "1");

        sheet.update_cells(parse_csv("5", 0, 0));
        assert_eq!(sheet.display_value(CellRef::new(0, 1)), "5");
    }

    #[test]
    fn test_csv_content() {
        let rows = vec![
            vec!["1".to_string(), "a,b".to_string()],
            vec![String::new(), "#CIRCULAR!".to_string()],
        ];
        assert_eq!(csv_content(&rows), "1,\"a,b\"\n,#CIRCULAR!\n");
    }
}
