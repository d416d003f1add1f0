//! Subcommand implementations. Each one loads the sheet file, does one
//! thing, and saves if it changed anything.

use anyhow::{Context, Result, bail};
use sheetcalc_core::Sheet;
use sheetcalc_core::document::SheetPatch;
use sheetcalc_core::storage::markdown_table;
use sheetcalc_engine::Aggregate;
use sheetcalc_engine::engine::{CellRef, RangeRef, TextTransform};
use std::path::Path;
use std::process::ExitCode;

use crate::config::Config;

fn load(path: &Path) -> Result<Sheet> {
    Sheet::load(path).with_context(|| format!("Failed to open '{}'", path.display()))
}

fn save(sheet: &Sheet, path: &Path) -> Result<()> {
    sheet
        .save(path)
        .with_context(|| format!("Failed to save '{}'", path.display()))
}

/// Owner for ad-hoc formulas: a row no stored or rendered cell uses, so the
/// formula can never be part of a cycle.
fn scratch_cell(sheet: &Sheet) -> CellRef {
    let below_used = sheet.used_range().map_or(0, |range| range.end.row.saturating_add(1));
    CellRef::new(below_used.max(sheet.row_count), 0)
}

pub fn new_sheet(
    path: &Path,
    title: Option<String>,
    rows: Option<usize>,
    cols: Option<usize>,
    force: bool,
    config: &Config,
) -> Result<ExitCode> {
    if path.exists() && !force {
        bail!("'{}' already exists (use --force to overwrite)", path.display());
    }
    let title = title.unwrap_or_else(|| config.default_title.clone());
    let mut sheet = Sheet::new(&title, &config.user_id);
    sheet.update_meta(SheetPatch {
        title: None,
        row_count: Some(rows.unwrap_or(config.default_rows)),
        col_count: Some(cols.unwrap_or(config.default_cols)),
    });
    save(&sheet, path)?;
    println!("Created {}", path.display());
    Ok(ExitCode::SUCCESS)
}

pub fn set(path: &Path, cell: CellRef, input: &str, config: &Config) -> Result<ExitCode> {
    let mut sheet = load(path)?;
    sheet.set_input(cell, input);
    save(&sheet, path)?;
    println!("{}", sheet.evaluator(config.eval_options()).evaluate_cell(cell));
    Ok(ExitCode::SUCCESS)
}

pub fn get(path: &Path, cell: CellRef, raw: bool, config: &Config) -> Result<ExitCode> {
    let sheet = load(path)?;
    if raw {
        println!("{}", sheet.edit_text(&cell));
    } else {
        println!("{}", sheet.evaluator(config.eval_options()).evaluate_cell(cell));
    }
    Ok(ExitCode::SUCCESS)
}

/// Prints the result; error sentinels exit with status 1.
pub fn eval(path: &Path, formula: &str, at: Option<CellRef>, config: &Config) -> Result<ExitCode> {
    let sheet = load(path)?;
    let owner = at.unwrap_or_else(|| scratch_cell(&sheet));
    let result = sheet.evaluator(config.eval_options()).evaluate(formula, owner);
    println!("{}", result);
    Ok(if result.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

pub fn show(path: &Path, range: Option<RangeRef>, all: bool, config: &Config) -> Result<ExitCode> {
    let sheet = load(path)?;
    let range = if all {
        sheet.grid_range()
    } else {
        range.or_else(|| sheet.used_range())
    };
    match range {
        Some(range) => {
            let rows = sheet.render_range(&range, config.eval_options());
            print!("{}", markdown_table(&range, &rows));
        }
        None => println!("*Empty spreadsheet*"),
    }
    Ok(ExitCode::SUCCESS)
}

/// Exits with status 1 when any cycle is found.
pub fn check(path: &Path) -> Result<ExitCode> {
    let sheet = load(path)?;
    let reports = sheet.find_cycles();
    if reports.is_empty() {
        println!("No circular references");
        return Ok(ExitCode::SUCCESS);
    }
    for report in &reports {
        let chain: Vec<String> = report.path.iter().map(CellRef::to_string).collect();
        println!("{}: {}", report.cell, chain.join(" -> "));
    }
    Ok(ExitCode::FAILURE)
}

pub fn classify(path: &Path, range: &RangeRef) -> Result<ExitCode> {
    let sheet = load(path)?;
    for (cell, kind) in sheet.classify_range(range) {
        println!("{}\t{}", cell, kind);
    }
    Ok(ExitCode::SUCCESS)
}

pub fn export(path: &Path, output: &Path, range: Option<RangeRef>, config: &Config) -> Result<ExitCode> {
    let sheet = load(path)?;
    let is_markdown = output
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"));

    if is_markdown {
        let content = match range.or_else(|| sheet.used_range()) {
            Some(range) => markdown_table(&range, &sheet.render_range(&range, config.eval_options())),
            None => "*Empty spreadsheet*\n".to_string(),
        };
        std::fs::write(output, content)
            .with_context(|| format!("Failed to write '{}'", output.display()))?;
    } else {
        sheet
            .export_csv(output, range, config.eval_options())
            .with_context(|| format!("Failed to write '{}'", output.display()))?;
    }
    println!("Exported to {}", output.display());
    Ok(ExitCode::SUCCESS)
}

pub fn import(path: &Path, csv: &Path, at: CellRef) -> Result<ExitCode> {
    let mut sheet = load(path)?;
    let count = sheet
        .import_csv(csv, at.row, at.col)
        .with_context(|| format!("Failed to import '{}'", csv.display()))?;
    save(&sheet, path)?;
    println!("Imported {} cells from {}", count, csv.display());
    Ok(ExitCode::SUCCESS)
}

pub fn transform(path: &Path, cell: CellRef, transform: TextTransform) -> Result<ExitCode> {
    let mut sheet = load(path)?;
    sheet.apply_text_transform(cell, transform);
    save(&sheet, path)?;
    println!("{}", sheet.edit_text(&cell));
    Ok(ExitCode::SUCCESS)
}

pub fn dedupe(path: &Path, range: &RangeRef) -> Result<ExitCode> {
    let mut sheet = load(path)?;
    let cleared = sheet.remove_duplicates(range);
    if cleared > 0 {
        save(&sheet, path)?;
    }
    println!("Removed {} duplicate rows", cleared);
    Ok(ExitCode::SUCCESS)
}

pub fn replace(path: &Path, range: &RangeRef, find: &str, replace: &str) -> Result<ExitCode> {
    let mut sheet = load(path)?;
    let changed = sheet.find_and_replace(range, find, replace)?;
    if changed > 0 {
        save(&sheet, path)?;
    }
    println!("Replaced text in {} cells", changed);
    Ok(ExitCode::SUCCESS)
}

pub fn apply(
    path: &Path,
    function: Aggregate,
    range: &RangeRef,
    target: CellRef,
    config: &Config,
) -> Result<ExitCode> {
    let mut sheet = load(path)?;
    let formula = sheet.apply_function(function, range, target);
    save(&sheet, path)?;
    let result = sheet.evaluator(config.eval_options()).evaluate_cell(target);
    println!("{} {} = {}", target, formula, result);
    Ok(ExitCode::SUCCESS)
}

pub fn format(
    path: &Path,
    range: &RangeRef,
    bold: bool,
    italic: bool,
    color: Option<String>,
    background: Option<String>,
) -> Result<ExitCode> {
    if !bold && !italic && color.is_none() && background.is_none() {
        bail!("Nothing to change: pass --bold, --italic, --color or --background");
    }
    let mut sheet = load(path)?;
    if bold {
        sheet.toggle_bold(range);
    }
    if italic {
        sheet.toggle_italic(range);
    }
    if let Some(color) = color {
        sheet.set_color(range, &color);
    }
    if let Some(background) = background {
        sheet.set_background_color(range, &background);
    }
    save(&sheet, path)?;
    println!("Formatted {}", range);
    Ok(ExitCode::SUCCESS)
}
