//! Sheet documents as pretty-printed JSON files.

use std::path::Path;

use crate::document::Sheet;
use crate::error::Result;

pub fn sheet_from_json(content: &str) -> Result<Sheet> {
    Ok(serde_json::from_str(content)?)
}

pub fn sheet_to_json(sheet: &Sheet) -> Result<String> {
    Ok(serde_json::to_string_pretty(sheet)?)
}

/// Read a sheet file written by [`write_sheet`].
pub fn read_sheet(path: &Path) -> Result<Sheet> {
    let content = std::fs::read_to_string(path)?;
    sheet_from_json(&content)
}

pub fn write_sheet(path: &Path, sheet: &Sheet) -> Result<()> {
    let mut content = sheet_to_json(sheet)?;
    content.push('\n');
    std::fs::write(path, content)?;
    Ok(())
}
