//! FILENAME: core/engine/src/value.rs
//! PURPOSE: The closed scalar value union and row representation.
//! CONTEXT: Rows arrive from an external loader as {column: scalar} maps and
//! are never mutated by the engine. Every downstream stage goes through the
//! total conversion views here instead of re-inspecting raw values.

use std::collections::HashMap;
use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::dates;
use crate::numeric;

// ============================================================================
// SCALAR
// ============================================================================

/// A single cell value. This is the only shape in which untyped input data
/// crosses into the engine; everything past the classifier works on the
/// views below, never on raw host values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(f64),
    /// Native date value. Deserialized before `Text`, so ISO date-time
    /// strings coming over the boundary land here.
    Date(NaiveDateTime),
    Text(String),
}

impl Scalar {
    /// Returns true for null and for whitespace-only text.
    pub fn is_empty(&self) -> bool {
        match self {
            Scalar::Null => true,
            Scalar::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Numeric view. Text goes through the shared lenient parser
    /// (currency symbols, thousand separators, unit suffixes, percent).
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            Scalar::Text(s) => numeric::parse_number(s),
            _ => None,
        }
    }

    /// Date view. Text goes through the shared date parser.
    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            Scalar::Date(dt) => Some(*dt),
            Scalar::Text(s) => dates::parse_date_str(s),
            _ => None,
        }
    }

    /// Display string, matching what the presentation layer shows.
    pub fn display(&self) -> String {
        match self {
            Scalar::Null => String::new(),
            Scalar::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Scalar::Number(n) => format!("{}", n),
            Scalar::Date(dt) => {
                if dt.hour() == 0 && dt.minute() == 0 && dt.second() == 0 {
                    dt.format("%Y-%m-%d").to_string()
                } else {
                    dt.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            }
            Scalar::Text(s) => s.clone(),
        }
    }
}

// ============================================================================
// ROW
// ============================================================================

/// A source row: column name to scalar. Owned by the caller, treated as
/// immutable input everywhere in the engine.
pub type Row = HashMap<String, Scalar>;

static NULL_SCALAR: Scalar = Scalar::Null;

/// Looks up a cell by column name; a missing column reads as null.
pub fn cell<'a>(row: &'a Row, column: &str) -> &'a Scalar {
    row.get(column).unwrap_or(&NULL_SCALAR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn empty_detection() {
        assert!(Scalar::Null.is_empty());
        assert!(Scalar::Text("   ".to_string()).is_empty());
        assert!(!Scalar::Number(0.0).is_empty());
        assert!(!Scalar::Text("x".to_string()).is_empty());
    }

    #[test]
    fn numeric_view_parses_text() {
        assert_eq!(Scalar::Text("1,234".to_string()).as_number(), Some(1234.0));
        assert_eq!(Scalar::Number(5.0).as_number(), Some(5.0));
        assert_eq!(Scalar::Bool(true).as_number(), None);
    }

    #[test]
    fn display_formats() {
        let midnight = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(Scalar::Date(midnight).display(), "2024-03-01");
        assert_eq!(Scalar::Number(8.0).display(), "8");
        assert_eq!(Scalar::Null.display(), "");
    }

    #[test]
    fn missing_column_reads_as_null() {
        let row = Row::new();
        assert!(cell(&row, "anything").is_empty());
    }
}
