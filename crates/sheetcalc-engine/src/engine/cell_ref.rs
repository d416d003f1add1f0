//! Cell and range reference parsing and formatting.
//!
//! Provides bidirectional conversion between spreadsheet-style references
//! (e.g., "A1", "b12", "AA100", "A1:C3") and zero-indexed row/column
//! coordinates.
//!
//! # Examples
//!
//! ```
//! use sheetcalc_engine::engine::{CellRef, RangeRef};
//!
//! let cell: CellRef = "B3".parse().unwrap();
//! assert_eq!(cell.row, 2);
//! assert_eq!(cell.col, 1); // 0-indexed
//! assert_eq!(cell.to_string(), "B3");
//!
//! let range: RangeRef = "A1:C3".parse().unwrap();
//! assert_eq!(range.cell_count(), Some(9));
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::error::{ReferenceError, Result};

/// A reference to a cell by row and column indices (0-indexed).
///
/// Ordering is row-major: all of row 0, then row 1, and so on.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

fn cell_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?<letters>[A-Za-z]+)(?<digits>[0-9]+)$")
            .expect("cell reference regex must compile")
    })
}

impl CellRef {
    pub fn new(row: usize, col: usize) -> CellRef {
        CellRef { row, col }
    }

    /// Parse a cell token in A1 notation (letters then a 1-based row number).
    pub fn parse(token: &str) -> Result<CellRef> {
        let caps = cell_token_re()
            .captures(token)
            .ok_or_else(|| ReferenceError::Malformed(token.to_string()))?;

        let col = Self::col_from_letters(&caps["letters"])?;

        let digits = &caps["digits"];
        let row_number = digits
            .parse::<u128>()
            .map_err(|_| ReferenceError::Overflow(token.to_string()))?;
        let row = row_number
            .checked_sub(1)
            .ok_or_else(|| ReferenceError::ZeroRow(token.to_string()))?;
        let row = usize::try_from(row).map_err(|_| ReferenceError::Overflow(token.to_string()))?;

        Ok(CellRef::new(row, col))
    }

    /// Column letters to index using bijective base-26 (A -> 0, Z -> 25, AA -> 26).
    pub fn col_from_letters(letters: &str) -> Result<usize> {
        if letters.is_empty() || !letters.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(ReferenceError::Malformed(letters.to_string()));
        }

        let overflow = || ReferenceError::Overflow(letters.to_string());
        let mut acc = 0u128;
        for c in letters.bytes().map(|b| b.to_ascii_uppercase()) {
            let digit = (c - b'A') as u128 + 1;
            acc = acc
                .checked_mul(26)
                .and_then(|v| v.checked_add(digit))
                .ok_or_else(overflow)?;
        }
        // acc >= 1 because letters is non-empty.
        usize::try_from(acc - 1).map_err(|_| overflow())
    }

    /// Convert column index to spreadsheet-style letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: usize) -> String {
        let mut result = String::new();
        let mut n = col as u128 + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }
}

impl std::str::FromStr for CellRef {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            CellRef::col_to_letters(self.col),
            self.row as u128 + 1
        )
    }
}

/// An inclusive rectangular region between two cells.
///
/// Endpoints are kept exactly as written (`C3:A1` stays reversed); iteration
/// and containment always work on the normalized rectangle.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct RangeRef {
    pub start: CellRef,
    pub end: CellRef,
}

impl RangeRef {
    pub fn new(start: CellRef, end: CellRef) -> RangeRef {
        RangeRef { start, end }
    }

    /// A one-cell range.
    pub fn single(cell: CellRef) -> RangeRef {
        RangeRef::new(cell, cell)
    }

    /// Parse `A1` (single cell) or `A1:C3`. More than one `:` is malformed.
    pub fn parse(token: &str) -> Result<RangeRef> {
        let mut parts = token.split(':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(cell), None, _) => Ok(RangeRef::single(CellRef::parse(cell)?)),
            (Some(start), Some(end), None) => {
                Ok(RangeRef::new(CellRef::parse(start)?, CellRef::parse(end)?))
            }
            _ => Err(ReferenceError::Malformed(token.to_string())),
        }
    }

    /// Top-left to bottom-right form of this range.
    pub fn normalized(&self) -> RangeRef {
        RangeRef {
            start: CellRef::new(
                self.start.row.min(self.end.row),
                self.start.col.min(self.end.col),
            ),
            end: CellRef::new(
                self.start.row.max(self.end.row),
                self.start.col.max(self.end.col),
            ),
        }
    }

    pub fn is_single(&self) -> bool {
        self.start == self.end
    }

    /// Number of rows spanned (saturating at `usize::MAX`).
    pub fn rows(&self) -> usize {
        self.start.row.abs_diff(self.end.row).saturating_add(1)
    }

    /// Number of columns spanned (saturating at `usize::MAX`).
    pub fn cols(&self) -> usize {
        self.start.col.abs_diff(self.end.col).saturating_add(1)
    }

    /// Total cells in the range, or `None` if that does not fit in a `usize`.
    pub fn cell_count(&self) -> Option<usize> {
        let rows = self.start.row.abs_diff(self.end.row).checked_add(1)?;
        let cols = self.start.col.abs_diff(self.end.col).checked_add(1)?;
        rows.checked_mul(cols)
    }

    pub fn contains(&self, cell: &CellRef) -> bool {
        let n = self.normalized();
        (n.start.row..=n.end.row).contains(&cell.row)
            && (n.start.col..=n.end.col).contains(&cell.col)
    }

    /// Cells of the range in row-major order, regardless of how the
    /// endpoints were written.
    pub fn iter(&self) -> RangeCells {
        let n = self.normalized();
        RangeCells {
            min_col: n.start.col,
            max_col: n.end.col,
            max_row: n.end.row,
            next: Some(n.start),
        }
    }
}

impl std::str::FromStr for RangeRef {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for RangeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

impl IntoIterator for &RangeRef {
    type Item = CellRef;
    type IntoIter = RangeCells;

    fn into_iter(self) -> RangeCells {
        self.iter()
    }
}

/// Row-major iterator over the cells of a [`RangeRef`].
#[derive(Clone, Debug)]
pub struct RangeCells {
    min_col: usize,
    max_col: usize,
    max_row: usize,
    next: Option<CellRef>,
}

impl Iterator for RangeCells {
    type Item = CellRef;

    fn next(&mut self) -> Option<CellRef> {
        let current = self.next?;
        self.next = if current.col < self.max_col {
            Some(CellRef::new(current.row, current.col + 1))
        } else if current.row < self.max_row {
            Some(CellRef::new(current.row + 1, self.min_col))
        } else {
            None
        };
        Some(current)
    }
}

/// Parse a range token like "A1:B5" (or a single cell "A1").
pub fn parse_range(range: &str) -> Result<RangeRef> {
    RangeRef::parse(range)
}
