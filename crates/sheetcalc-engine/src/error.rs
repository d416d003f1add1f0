//! Error types for the sheetcalc engine.
//!
//! Parsing is fallible and reports [`ReferenceError`] / [`FormulaError`].
//! Evaluation never fails: every failure is folded into an [`EvalError`]
//! that renders as a sentinel string in the grid.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A cell or range token that cannot be turned into coordinates.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("Invalid cell reference: {0}")]
    Malformed(String),

    #[error("Row numbers start at 1: {0}")]
    ZeroRow(String),

    #[error("Reference out of range: {0}")]
    Overflow(String),
}

/// A formula string that does not fit `=FUNCTION(RANGE)`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormulaError {
    #[error("Formula does not match =FUNCTION(RANGE): {0}")]
    Grammar(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error(transparent)]
    Reference(#[from] ReferenceError),
}

/// Evaluation failure, displayed in place of a computed value.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvalError {
    #[error("#ERROR!")]
    MalformedGrammar,

    #[error("#RANGE!")]
    MalformedReference,

    #[error("#FUNC!")]
    UnknownFunction,

    #[error("#CIRCULAR!")]
    CircularReference,

    #[error("#DEPTH!")]
    DepthExceeded,
}

impl EvalError {
    /// The text shown in the grid for this error.
    pub fn sentinel(self) -> &'static str {
        match self {
            EvalError::MalformedGrammar => "#ERROR!",
            EvalError::MalformedReference => "#RANGE!",
            EvalError::UnknownFunction => "#FUNC!",
            EvalError::CircularReference => "#CIRCULAR!",
            EvalError::DepthExceeded => "#DEPTH!",
        }
    }

    /// Errors that poison every formula depending on the failing cell.
    ///
    /// The other kinds flow into the parent as their sentinel text, which the
    /// aggregates skip as non-numeric.
    pub fn propagates(self) -> bool {
        matches!(
            self,
            EvalError::CircularReference | EvalError::DepthExceeded
        )
    }
}

impl From<&FormulaError> for EvalError {
    fn from(err: &FormulaError) -> Self {
        match err {
            FormulaError::Grammar(_) => EvalError::MalformedGrammar,
            FormulaError::UnknownFunction(_) => EvalError::UnknownFunction,
            FormulaError::Reference(_) => EvalError::MalformedReference,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReferenceError>;
