//! Sheet persistence collaborator.
//!
//! Evaluation never goes through a store directly: callers take a snapshot
//! with [`SheetStore::get_sheet`] and evaluate against that.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use sheetcalc_engine::engine::{Cell, CellRef};
use tracing::info;

use crate::document::{CellUpdate, Sheet, SheetId, SheetPatch};
use crate::error::{Result, SheetError};

pub trait SheetStore {
    /// Create an empty sheet owned by `user_id`. An empty title falls back
    /// to the default title.
    fn create_sheet(&self, title: &str, user_id: &str) -> Result<Sheet>;

    /// A snapshot of the sheet.
    fn get_sheet(&self, id: SheetId) -> Result<Sheet>;

    /// All sheets owned by `user_id`, most recently modified first.
    fn sheets_by_user(&self, user_id: &str) -> Vec<Sheet>;

    fn update_cell(&self, id: SheetId, update: CellUpdate) -> Result<Sheet>;

    fn update_cells(&self, id: SheetId, updates: Vec<CellUpdate>) -> Result<Sheet>;

    fn update_sheet(&self, id: SheetId, patch: SheetPatch) -> Result<Sheet>;

    fn delete_sheet(&self, id: SheetId) -> Result<()>;

    fn get_cell(&self, id: SheetId, at: &CellRef) -> Result<Option<Cell>> {
        Ok(self.get_sheet(id)?.get_cell(at))
    }

    fn list_cells(&self, id: SheetId) -> Result<Vec<(CellRef, Cell)>> {
        Ok(self.get_sheet(id)?.list_cells())
    }
}

/// In-process store keyed by sequentially allocated ids.
#[derive(Debug)]
pub struct MemoryStore {
    sheets: DashMap<SheetId, Sheet>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            sheets: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Add an existing sheet (e.g. loaded from disk) under a fresh id.
    pub fn insert(&self, mut sheet: Sheet) -> SheetId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        sheet.id = id;
        self.sheets.insert(id, sheet);
        id
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    fn modify(&self, id: SheetId, f: impl FnOnce(&mut Sheet)) -> Result<Sheet> {
        let mut sheet = self.sheets.get_mut(&id).ok_or(SheetError::NotFound(id))?;
        f(sheet.value_mut());
        Ok(sheet.clone())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SheetStore for MemoryStore {
    fn create_sheet(&self, title: &str, user_id: &str) -> Result<Sheet> {
        if user_id.is_empty() {
            return Err(SheetError::MissingUserId);
        }
        let id = self.insert(Sheet::new(title, user_id));
        info!(id, user_id, "created sheet");
        self.get_sheet(id)
    }

    fn get_sheet(&self, id: SheetId) -> Result<Sheet> {
        self.sheets
            .get(&id)
            .map(|sheet| sheet.clone())
            .ok_or(SheetError::NotFound(id))
    }

    fn sheets_by_user(&self, user_id: &str) -> Vec<Sheet> {
        let mut sheets: Vec<Sheet> = self
            .sheets
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        sheets.sort_by(|a, b| b.last_modified.cmp(&a.last_modified).then(b.id.cmp(&a.id)));
        sheets
    }

    fn update_cell(&self, id: SheetId, update: CellUpdate) -> Result<Sheet> {
        self.modify(id, |sheet| sheet.update_cell(update))
    }

    fn update_cells(&self, id: SheetId, updates: Vec<CellUpdate>) -> Result<Sheet> {
        let count = updates.len();
        let sheet = self.modify(id, |sheet| sheet.update_cells(updates))?;
        info!(id, count, "updated cells");
        Ok(sheet)
    }

    fn update_sheet(&self, id: SheetId, patch: SheetPatch) -> Result<Sheet> {
        self.modify(id, |sheet| sheet.update_meta(patch))
    }

    fn delete_sheet(&self, id: SheetId) -> Result<()> {
        self.sheets.remove(&id).ok_or(SheetError::NotFound(id))?;
        info!(id, "deleted sheet");
        Ok(())
    }
}
