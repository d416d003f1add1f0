//! Error types for sheetcalc core.

use thiserror::Error;

use sheetcalc_engine::ReferenceError;

use crate::document::SheetId;

/// Errors that can occur while editing or storing sheets.
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Sheet not found: {0}")]
    NotFound(SheetId),

    #[error("User ID is required")]
    MissingUserId,

    #[error("Find text must not be empty")]
    EmptyFind,

    #[error(transparent)]
    Reference(#[from] ReferenceError),
}

pub type Result<T> = std::result::Result<T, SheetError>;
