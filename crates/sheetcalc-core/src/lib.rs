//! sheetcalc-core - UI-agnostic sheet model, document store and storage.

pub mod document;
pub mod error;
pub mod storage;
pub mod store;

pub use document::{CellUpdate, CycleReport, FormattingPatch, Sheet, SheetId, SheetPatch};
pub use error::{Result, SheetError};
pub use store::{MemoryStore, SheetStore};

pub use sheetcalc_engine::engine::{CellRef, RangeRef};
