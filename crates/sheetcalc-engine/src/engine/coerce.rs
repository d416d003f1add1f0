//! Value coercion and classification.
//!
//! Aggregates only ask "does this parse as a number"; [`classify`] is the
//! richer, advisory view used by data-quality tooling.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Result of numeric coercion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Numeric {
    Number(f64),
    NotNumeric,
}

impl Numeric {
    pub fn as_f64(self) -> Option<f64> {
        match self {
            Numeric::Number(n) => Some(n),
            Numeric::NotNumeric => None,
        }
    }
}

fn decimal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?$")
            .expect("decimal regex must compile")
    })
}

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(0[1-9]|1[0-2])/(0[1-9]|[12][0-9]|3[01])/([0-9]{4})$")
            .expect("date regex must compile")
    })
}

/// Coerce raw cell text to a number.
///
/// Surrounding whitespace is ignored. Empty text, words such as `inf` or
/// `NaN`, and values that overflow `f64` are not numeric.
pub fn coerce_numeric(text: &str) -> Numeric {
    let trimmed = text.trim();
    if trimmed.is_empty() || !decimal_re().is_match(trimmed) {
        return Numeric::NotNumeric;
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Numeric::Number(n),
        _ => Numeric::NotNumeric,
    }
}

/// Empty text passes (it does not disqualify a numeric column).
pub fn is_numeric(text: &str) -> bool {
    text.trim().is_empty() || matches!(coerce_numeric(text), Numeric::Number(_))
}

/// Strict `MM/DD/YYYY` that names a real calendar day. Empty text passes.
pub fn is_date(text: &str) -> bool {
    text.trim().is_empty() || parse_date(text).is_some()
}

/// Parse strict `MM/DD/YYYY`.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let caps = date_re().captures(text)?;
    let month = caps[1].parse().ok()?;
    let day = caps[2].parse().ok()?;
    let year = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Advisory data type of a raw cell value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Empty,
    Number,
    Date,
    Text,
}

impl ValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Empty => "empty",
            ValueKind::Number => "number",
            ValueKind::Date => "date",
            ValueKind::Text => "text",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn classify(text: &str) -> ValueKind {
    if text.trim().is_empty() {
        ValueKind::Empty
    } else if matches!(coerce_numeric(text), Numeric::Number(_)) {
        ValueKind::Number
    } else if parse_date(text).is_some() {
        ValueKind::Date
    } else {
        ValueKind::Text
    }
}

/// Toolbar text transforms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextTransform {
    Trim,
    Upper,
    Lower,
}

impl TextTransform {
    pub fn apply(self, text: &str) -> String {
        match self {
            TextTransform::Trim => text.trim().to_string(),
            TextTransform::Upper => text.to_uppercase(),
            TextTransform::Lower => text.to_lowercase(),
        }
    }
}

impl std::str::FromStr for TextTransform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trim" => Ok(TextTransform::Trim),
            "upper" => Ok(TextTransform::Upper),
            "lower" => Ok(TextTransform::Lower),
            _ => Err(format!("Unknown text transform: {}", s)),
        }
    }
}
