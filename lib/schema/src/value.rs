//! Tagged field values
//!
//! Catalog cells, mapping-table encodings and profile fields all resolve to a
//! [`FieldValue`] once, at load time, so numeric code downstream never has to
//! inspect a raw string again.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell or profile value: either a number or free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Resolve a raw string: integers and floats become `Number`, anything
    /// else is kept as trimmed `Text`.
    ///
    /// Thousands separators are tolerated (`"1,500,000"` is a number).
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match parse_number(trimmed) {
            Some(n) => FieldValue::Number(n),
            None => FieldValue::Text(trimmed.to_string()),
        }
    }

    /// Numeric view of the value. Text that parses as a number is accepted.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) if n.is_finite() => Some(*n),
            FieldValue::Number(_) => None,
            FieldValue::Text(s) => parse_number(s.trim()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Number(_) => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

fn parse_number(s: &str) -> Option<f64> {
    if s.is_empty() {
        return None;
    }
    let cleaned = s.replace(',', "");
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numbers() {
        assert_eq!(FieldValue::parse("42"), FieldValue::Number(42.0));
        assert_eq!(FieldValue::parse(" 3.5 "), FieldValue::Number(3.5));
        assert_eq!(FieldValue::parse("1,500,000"), FieldValue::Number(1_500_000.0));
    }

    #[test]
    fn test_parse_text() {
        assert_eq!(FieldValue::parse(" Science "), FieldValue::Text("Science".to_string()));
        assert_eq!(FieldValue::parse("NaN"), FieldValue::Text("NaN".to_string()));
        assert_eq!(FieldValue::parse(""), FieldValue::Text(String::new()));
    }

    #[test]
    fn test_as_f64() {
        assert_eq!(FieldValue::Number(2.0).as_f64(), Some(2.0));
        assert_eq!(FieldValue::Text("7".into()).as_f64(), Some(7.0));
        assert_eq!(FieldValue::Text("seven".into()).as_f64(), None);
        assert_eq!(FieldValue::Number(f64::NAN).as_f64(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldValue::Number(3.0).to_string(), "3");
        assert_eq!(FieldValue::Number(0.25).to_string(), "0.25");
        assert_eq!(FieldValue::Text("Hybrid".into()).to_string(), "Hybrid");
    }
}
