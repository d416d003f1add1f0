//! Markdown table rendering

use sheetcalc_engine::engine::{CellRef, RangeRef};

/// Render display rows for `range` as a markdown table headed by column
/// letters, with 1-based row numbers down the left.
pub fn markdown_table(range: &RangeRef, rows: &[Vec<String>]) -> String {
    let range = range.normalized();
    let mut out = String::from("|   |");
    for col in range.start.col..=range.end.col {
        out.push_str(&format!(" {} |", CellRef::col_to_letters(col)));
    }
    out.push_str("\n|---|");
    for _ in range.start.col..=range.end.col {
        out.push_str("---|");
    }
    out.push('\n');

    for (offset, row) in rows.iter().enumerate() {
        let row_number = range.start.row as u128 + offset as u128 + 1;
        out.push_str(&format!("| {} |", row_number));
        for display in row {
            out.push_str(&format!(" {} |", escape_markdown(display)));
        }
        out.push('\n');
    }
    out
}

/// Escape special markdown characters in cell content
fn escape_markdown(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ").replace('\r', "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_markdown_table() {
        let range: RangeRef = "B3:C2".parse().unwrap();
        let rows = vec![
            vec!["1".to_string(), "a|b".to_string()],
            vec![String::new(), "#FUNC!".to_string()],
        ];
        assert_eq!(
            markdown_table(&range, &rows),
            "|   | B | C |\n|---|---|---|\n| 2 | 1 | a\\|b |\n| 3 |  | #FUNC! |\n"
        );
    }

    #[test]
    fn test_markdown_table_at_last_row() {
        let range = RangeRef::single(CellRef::new(usize::MAX, 0));
        let table = markdown_table(&range, &[vec!["x".to_string()]]);
        assert!(table.ends_with(&format!("| {} | x |\n", usize::MAX as u128 + 1)));
    }
}
