//! Built-in aggregate functions and their metadata.
//!
//! Conventions:
//! - Spreadsheet-facing names are ALL CAPS (e.g. `SUM`, `AVERAGE`) and are
//!   matched case-insensitively.
//! - Every aggregate takes one [`Contribution`] per cell in a range: the raw
//!   text of a value cell, or the unrounded result of a nested formula. Text
//!   that coerces to a number is kept and the rest dropped.
//! - An aggregate with nothing numeric to work on returns 0.
//! - If you add a new aggregate, add it to [`AGGREGATE_BUILTINS`] and
//!   [`Aggregate::apply`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::engine::coerce_numeric;
use crate::error::FormulaError;

/// The aggregate functions a formula can call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Aggregate {
    Sum,
    Average,
    Max,
    Min,
    Count,
}

pub struct AggregateBuiltin {
    pub aggregate: Aggregate,
    pub sheet_name: &'static str,
    pub description: &'static str,
}

pub const AGGREGATE_BUILTINS: &[AggregateBuiltin] = &[
    AggregateBuiltin {
        aggregate: Aggregate::Sum,
        sheet_name: "SUM",
        description: "Sum of numeric values in a cell range",
    },
    AggregateBuiltin {
        aggregate: Aggregate::Average,
        sheet_name: "AVERAGE",
        description: "Average of numeric values in a cell range",
    },
    AggregateBuiltin {
        aggregate: Aggregate::Max,
        sheet_name: "MAX",
        description: "Maximum numeric value in a cell range",
    },
    AggregateBuiltin {
        aggregate: Aggregate::Min,
        sheet_name: "MIN",
        description: "Minimum numeric value in a cell range",
    },
    AggregateBuiltin {
        aggregate: Aggregate::Count,
        sheet_name: "COUNT",
        description: "Count of numeric values in a cell range",
    },
];

impl Aggregate {
    /// Look up a function by its spreadsheet name, ignoring case.
    pub fn from_name(name: &str) -> Option<Aggregate> {
        AGGREGATE_BUILTINS
            .iter()
            .find(|b| b.sheet_name.eq_ignore_ascii_case(name))
            .map(|b| b.aggregate)
    }

    pub fn name(self) -> &'static str {
        self.builtin().sheet_name
    }

    pub fn description(self) -> &'static str {
        self.builtin().description
    }

    fn builtin(self) -> &'static AggregateBuiltin {
        AGGREGATE_BUILTINS
            .iter()
            .find(|b| b.aggregate == self)
            .expect("every aggregate has a builtin entry")
    }

    /// Reduce the resolved contributions of a range.
    pub fn apply<C: ToNumeric>(self, values: &[C]) -> f64 {
        let numbers = numeric_values(values);
        match self {
            Aggregate::Sum => sum(&numbers),
            Aggregate::Average => average(&numbers),
            Aggregate::Max => max(&numbers),
            Aggregate::Min => min(&numbers),
            Aggregate::Count => numbers.len() as f64,
        }
    }
}

impl std::str::FromStr for Aggregate {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Aggregate::from_name(s).ok_or_else(|| FormulaError::UnknownFunction(s.to_string()))
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What one cell hands to an aggregate.
#[derive(Clone, Debug, PartialEq)]
pub enum Contribution {
    /// Value text, or the sentinel of a nested formula that failed.
    Text(String),
    /// Result of a nested formula, at full precision.
    Number(f64),
}

/// Anything an aggregate can read a number from.
pub trait ToNumeric {
    fn to_numeric(&self) -> Option<f64>;
}

impl ToNumeric for str {
    fn to_numeric(&self) -> Option<f64> {
        coerce_numeric(self).as_f64()
    }
}

impl ToNumeric for String {
    fn to_numeric(&self) -> Option<f64> {
        self.as_str().to_numeric()
    }
}

impl ToNumeric for Contribution {
    fn to_numeric(&self) -> Option<f64> {
        match self {
            Contribution::Text(text) => text.to_numeric(),
            Contribution::Number(n) => Some(*n),
        }
    }
}

impl<T: ToNumeric + ?Sized> ToNumeric for &T {
    fn to_numeric(&self) -> Option<f64> {
        (**self).to_numeric()
    }
}

/// The numeric contributions, in order; empty and non-numeric text dropped.
pub fn numeric_values<C: ToNumeric>(values: &[C]) -> Vec<f64> {
    values.iter().filter_map(ToNumeric::to_numeric).collect()
}

fn sum(numbers: &[f64]) -> f64 {
    numbers.iter().sum()
}

fn average(numbers: &[f64]) -> f64 {
    if numbers.is_empty() {
        0.0
    } else {
        sum(numbers) / numbers.len() as f64
    }
}

fn max(numbers: &[f64]) -> f64 {
    numbers.iter().copied().reduce(f64::max).unwrap_or(0.0)
}

fn min(numbers: &[f64]) -> f64 {
    numbers.iter().copied().reduce(f64::min).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_case_insensitive() {
        assert_eq!(Aggregate::from_name("sum"), Some(Aggregate::Sum));
        assert_eq!(Aggregate::from_name("Average"), Some(Aggregate::Average));
        assert_eq!(Aggregate::from_name("AVG"), None);
        assert_eq!(Aggregate::Count.to_string(), "COUNT");
        assert!(matches!(
            "TOTAL".parse::<Aggregate>(),
            Err(FormulaError::UnknownFunction(name)) if name == "TOTAL"
        ));
    }

    #[test]
    fn test_sum_skips_empty_and_text() {
        assert_eq!(Aggregate::Sum.apply(&["1", "", "x", "2.5"]), 3.5);
    }

    #[test]
    fn test_empty_input_is_zero_for_every_aggregate() {
        let none: [&str; 0] = [];
        for builtin in AGGREGATE_BUILTINS {
            assert_eq!(builtin.aggregate.apply(&none), 0.0, "{}", builtin.sheet_name);
            assert_eq!(builtin.aggregate.apply(&["", "text"]), 0.0);
        }
    }

    #[test]
    fn test_average_divides_by_numeric_count_only() {
        assert_eq!(Aggregate::Average.apply(&["2", "", "4", "n/a"]), 3.0);
    }

    #[test]
    fn test_max_min_with_negatives() {
        let values = ["-5", "3", "-7.5", "abc"];
        assert_eq!(Aggregate::Max.apply(&values), 3.0);
        assert_eq!(Aggregate::Min.apply(&values), -7.5);
        assert_eq!(Aggregate::Max.apply(&["-2", "-9"]), -2.0);
    }

    #[test]
    fn test_count_counts_numbers_not_non_empty_cells() {
        assert_eq!(Aggregate::Count.apply(&["1", "a", "", "02/01/2024", "3"]), 2.0);
    }

    #[test]
    fn test_number_contributions_keep_full_precision() {
        let third = 1.0 / 3.0;
        let values = [
            Contribution::Number(third),
            Contribution::Number(third),
            Contribution::Number(third),
            Contribution::Text("x".to_string()),
        ];
        assert_eq!(Aggregate::Sum.apply(&values), third + third + third);
        assert_eq!(Aggregate::Count.apply(&values), 3.0);
        assert_eq!(
            Aggregate::Sum.apply(&[Contribution::Text("0.3333333333".to_string())]),
            0.3333333333
        );
    }

    #[test]
    fn test_error_sentinels_are_not_numeric() {
        assert_eq!(Aggregate::Sum.apply(&["#RANGE!", "4"]), 4.0);
    }
}
