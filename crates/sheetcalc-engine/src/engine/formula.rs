//! Formula grammar: `=FUNCTION(RANGE)`.
//!
//! One aggregate call over one cell or range reference. Failures are
//! classified in order: shape of the call, then function name, then the
//! reference token, so `=TOTAL(A1:A2:A3)` is an unknown function.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

use super::cell_ref::RangeRef;
use crate::builtins::Aggregate;
use crate::error::FormulaError;

/// A parsed formula.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Formula {
    pub function: Aggregate,
    pub range: RangeRef,
}

/// Regex that matches a formula call like `=SUM(A1:B5)`.
///
/// Captures:
/// - group 1: function name (e.g. `SUM`)
/// - group 2: reference token (e.g. `A1:B5`)
///
/// Anything after the closing parenthesis is ignored.
fn formula_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^=([A-Za-z]+)\(([A-Za-z0-9:]+)\)").expect("formula regex must compile")
    })
}

/// True if the text is formula-shaped (starts with `=`).
pub fn is_formula(text: &str) -> bool {
    text.starts_with('=')
}

pub fn parse_formula(text: &str) -> Result<Formula, FormulaError> {
    let caps = formula_re()
        .captures(text)
        .ok_or_else(|| FormulaError::Grammar(text.to_string()))?;
    let function: Aggregate = caps[1].parse()?;
    let range = RangeRef::parse(&caps[2])?;
    Ok(Formula { function, range })
}

/// Canonical formula text for an aggregate over a range, e.g. `=SUM(A1:C3)`.
pub fn build_formula(function: Aggregate, range: &RangeRef) -> String {
    Formula {
        function,
        range: *range,
    }
    .to_string()
}

impl std::str::FromStr for Formula {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_formula(s)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "={}({})", self.function, self.range)
    }
}
