//! sheetcalc - command-line front end for sheetcalc sheets

mod commands;
mod config;

use anyhow::Result;
use clap::builder::{PossibleValue, PossibleValuesParser, TypedValueParser};
use clap::{ArgAction, Parser, Subcommand};
use sheetcalc_engine::Aggregate;
use sheetcalc_engine::builtins::AGGREGATE_BUILTINS;
use sheetcalc_engine::engine::{CellRef, RangeRef, TextTransform};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sheetcalc", version, about = "Edit and evaluate spreadsheet files")]
struct Cli {
    /// Config file (default: sheetcalc.toml in the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log more (-v info, -vv debug, -vvv trace); overrides RUST_LOG
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty sheet file
    New {
        sheet: PathBuf,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(long)]
        rows: Option<usize>,
        #[arg(long)]
        cols: Option<usize>,
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Set a cell from edit-bar input (`=SUM(A1:A3)` or a plain value)
    Set {
        sheet: PathBuf,
        cell: CellRef,
        #[arg(allow_hyphen_values = true)]
        input: String,
    },

    /// Print a cell's displayed value
    Get {
        sheet: PathBuf,
        cell: CellRef,
        /// Print the stored formula or value instead
        #[arg(long)]
        raw: bool,
    },

    /// Evaluate formula text against a sheet without storing it
    Eval {
        sheet: PathBuf,
        #[arg(allow_hyphen_values = true)]
        formula: String,
        /// Cell that owns the formula (default: first row below the sheet)
        #[arg(long)]
        at: Option<CellRef>,
    },

    /// Print displayed values as a markdown table
    Show {
        sheet: PathBuf,
        /// Range to show (default: used range)
        range: Option<RangeRef>,
        /// Show the full row/column extent of the sheet
        #[arg(long, conflicts_with = "range")]
        all: bool,
    },

    /// List formula cells that are part of, or lead into, a circular reference
    Check { sheet: PathBuf },

    /// Classify stored values as number, date or text
    Classify { sheet: PathBuf, range: RangeRef },

    /// Export displayed values to CSV (or markdown for .md files)
    Export {
        sheet: PathBuf,
        output: PathBuf,
        #[arg(short, long)]
        range: Option<RangeRef>,
    },

    /// Import CSV values into a sheet
    Import {
        sheet: PathBuf,
        csv: PathBuf,
        /// Top-left cell for the imported data
        #[arg(long, default_value = "A1")]
        at: CellRef,
    },

    /// Trim, upper-case or lower-case a cell's value (drops any formula)
    Transform {
        sheet: PathBuf,
        cell: CellRef,
        transform: TextTransform,
    },

    /// Clear rows in a range that repeat an earlier row
    Dedupe { sheet: PathBuf, range: RangeRef },

    /// Replace text in the values of a range
    Replace {
        sheet: PathBuf,
        range: RangeRef,
        find: String,
        replace: String,
    },

    /// Write `=FUNCTION(RANGE)` into a target cell
    Apply {
        sheet: PathBuf,
        #[arg(value_parser = aggregate_parser(), ignore_case = true)]
        function: Aggregate,
        range: RangeRef,
        target: CellRef,
    },

    /// Change formatting over a range
    Format {
        sheet: PathBuf,
        range: RangeRef,
        /// Toggle bold on each cell
        #[arg(long)]
        bold: bool,
        /// Toggle italic on each cell
        #[arg(long)]
        italic: bool,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        background: Option<String>,
    },
}

/// Function names with their descriptions for `--help`.
fn aggregate_parser() -> impl TypedValueParser<Value = Aggregate> {
    PossibleValuesParser::new(
        AGGREGATE_BUILTINS
            .iter()
            .map(|builtin| PossibleValue::new(builtin.sheet_name).help(builtin.aggregate.description())),
    )
    .try_map(|name| name.parse::<Aggregate>())
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let (config, warnings) = config::load_config(cli.config.as_deref());
    for warning in warnings {
        warn!("{}", warning);
    }

    match cli.command {
        Commands::New {
            sheet,
            title,
            rows,
            cols,
            force,
        } => commands::new_sheet(&sheet, title, rows, cols, force, &config),
        Commands::Set { sheet, cell, input } => commands::set(&sheet, cell, &input, &config),
        Commands::Get { sheet, cell, raw } => commands::get(&sheet, cell, raw, &config),
        Commands::Eval { sheet, formula, at } => commands::eval(&sheet, &formula, at, &config),
        Commands::Show { sheet, range, all } => commands::show(&sheet, range, all, &config),
        Commands::Check { sheet } => commands::check(&sheet),
        Commands::Classify { sheet, range } => commands::classify(&sheet, &range),
        Commands::Export {
            sheet,
            output,
            range,
        } => commands::export(&sheet, &output, range, &config),
        Commands::Import { sheet, csv, at } => commands::import(&sheet, &csv, at),
        Commands::Transform {
            sheet,
            cell,
            transform,
        } => commands::transform(&sheet, cell, transform),
        Commands::Dedupe { sheet, range } => commands::dedupe(&sheet, &range),
        Commands::Replace {
            sheet,
            range,
            find,
            replace,
        } => commands::replace(&sheet, &range, &find, &replace),
        Commands::Apply {
            sheet,
            function,
            range,
            target,
        } => commands::apply(&sheet, function, &range, target, &config),
        Commands::Format {
            sheet,
            range,
            bold,
            italic,
            color,
            background,
        } => commands::format(&sheet, &range, bold, italic, color, background),
    }
}
