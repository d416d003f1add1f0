//! sheetcalc_engine - Formula evaluation engine for sheetcalc sheets.

pub mod builtins;
pub mod engine;
pub mod error;

pub use builtins::{Aggregate, Contribution};
pub use error::{EvalError, FormulaError, ReferenceError};
