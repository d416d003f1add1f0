//! Storage module for the JSON sheet format, CSV import/export and
//! markdown tables

mod csv;
mod json;
mod md;

pub use csv::{csv_content, parse_csv, write_csv};
pub use json::{read_sheet, sheet_from_json, sheet_to_json, write_sheet};
pub use md::markdown_table;
