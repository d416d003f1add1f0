//! Sheet document model and editing operations, UI-agnostic.

mod eval;
mod io;
mod ops;
mod state;

pub use eval::CycleReport;
pub use ops::{CellUpdate, FormattingPatch, SheetPatch};
pub use state::{DEFAULT_COL_COUNT, DEFAULT_ROW_COUNT, DEFAULT_TITLE, Sheet, SheetId};
