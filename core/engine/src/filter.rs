//! FILENAME: core/engine/src/filter.rs
//! PURPOSE: Row filter conditions and the predicate evaluator.
//! CONTEXT: A row passes a filter set iff every condition is true. Per-cell
//! parse failures make that condition false for that row only; an invalid
//! regex makes its condition false for every row. Nothing here aborts.

use serde::{Deserialize, Serialize};

use crate::dates;
use crate::numeric;
use crate::value::{cell, Row, Scalar};

// ============================================================================
// CONDITION MODEL
// ============================================================================

/// Filter operators. Text operators compare case-insensitively; numeric
/// operators run both sides through the shared numeric parser and fail
/// closed when either side does not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOp {
    Eq,
    Neq,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    Gt,
    Gte,
    Lt,
    Lte,
    Between,
    DateIs,
    DateBefore,
    DateAfter,
    NotEmpty,
    IsEmpty,
    Regex,
    Wildcard,
    MultiSelect,
}

/// One filter condition on one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCondition {
    pub column: String,
    pub op: FilterOp,
    /// Primary operand. Unused by notEmpty/isEmpty.
    #[serde(default)]
    pub value: String,
    /// Upper bound for `between`.
    #[serde(default)]
    pub value2: Option<String>,
    /// Membership set for `multiSelect`. Empty set matches all rows.
    #[serde(default)]
    pub values: Vec<String>,
}

// ============================================================================
// EVALUATION
// ============================================================================

/// True when the row satisfies every condition.
pub fn row_passes(row: &Row, conditions: &[FilterCondition]) -> bool {
    conditions.iter().all(|c| evaluate(row, c))
}

/// Evaluates one condition against one row.
pub fn evaluate(row: &Row, cond: &FilterCondition) -> bool {
    let value = cell(row, &cond.column);
    let display = value.display();
    let text = display.trim();

    match cond.op {
        FilterOp::IsEmpty => value.is_empty(),
        FilterOp::NotEmpty => !value.is_empty(),

        FilterOp::Eq => eq_ci(text, &cond.value),
        FilterOp::Neq => !eq_ci(text, &cond.value),
        FilterOp::Contains => lower(text).contains(&lower(&cond.value)),
        FilterOp::NotContains => !lower(text).contains(&lower(&cond.value)),
        FilterOp::StartsWith => lower(text).starts_with(&lower(&cond.value)),
        FilterOp::EndsWith => lower(text).ends_with(&lower(&cond.value)),

        FilterOp::Gt => numeric_cmp(value, &cond.value, |v, b| v > b),
        FilterOp::Gte => numeric_cmp(value, &cond.value, |v, b| v >= b),
        FilterOp::Lt => numeric_cmp(value, &cond.value, |v, b| v < b),
        FilterOp::Lte => numeric_cmp(value, &cond.value, |v, b| v <= b),
        FilterOp::Between => {
            let hi = match &cond.value2 {
                Some(h) => h,
                None => return false,
            };
            let v = match value.as_number() {
                Some(v) => v,
                None => return false,
            };
            match (numeric::parse_number(&cond.value), numeric::parse_number(hi)) {
                (Some(lo), Some(hi)) => v >= lo && v <= hi,
                _ => false,
            }
        }

        // Prefix match lets "2024-03" or "2024-03-05" both target a day cell.
        FilterOp::DateIs => {
            let key = match dates::coerce_date(value) {
                Some(dt) => dates::date_key(&dt),
                None => return false,
            };
            key.starts_with(cond.value.trim())
        }
        FilterOp::DateBefore => date_cmp(value, &cond.value, |v, b| v < b),
        FilterOp::DateAfter => date_cmp(value, &cond.value, |v, b| v > b),

        FilterOp::Regex => match regex::Regex::new(&cond.value) {
            Ok(re) => re.is_match(text),
            Err(_) => false, // malformed pattern matches nothing
        },
        FilterOp::Wildcard => wildcard_match(text, cond.value.trim()),

        FilterOp::MultiSelect => {
            if cond.values.is_empty() {
                return true;
            }
            cond.values.iter().any(|allowed| eq_ci(text, allowed))
        }
    }
}

/// Date-range filter: keeps rows whose cell falls in `[start, end]` with the
/// end extended to its last instant. Accepts native dates, parseable text,
/// and raw numbers read as Excel serials.
pub fn date_range_passes(
    row: &Row,
    column: &str,
    start: chrono::NaiveDate,
    end: chrono::NaiveDate,
) -> bool {
    let dt = match dates::coerce_date(cell(row, column)) {
        Some(dt) => dt,
        None => return false,
    };
    let open = match start.and_hms_opt(0, 0, 0) {
        Some(s) => s,
        None => return false,
    };
    dt >= open && dt <= dates::end_of_day(end)
}

fn lower(s: &str) -> String {
    s.to_lowercase()
}

fn eq_ci(a: &str, b: &str) -> bool {
    lower(a) == lower(b.trim())
}

fn numeric_cmp(value: &Scalar, operand: &str, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (value.as_number(), numeric::parse_number(operand)) {
        (Some(v), Some(b)) => cmp(v, b),
        _ => false,
    }
}

fn date_cmp(
    value: &Scalar,
    operand: &str,
    cmp: impl Fn(chrono::NaiveDateTime, chrono::NaiveDateTime) -> bool,
) -> bool {
    match (dates::coerce_date(value), dates::parse_date_str(operand)) {
        (Some(v), Some(b)) => cmp(v, b),
        _ => false,
    }
}

// ============================================================================
// WILDCARD MATCHING
// ============================================================================

/// Excel-style wildcard match: `*` spans any run, `?` matches one character.
/// Case-insensitive, whole-string.
pub fn wildcard_match(text: &str, pattern: &str) -> bool {
    let t: Vec<char> = text.to_lowercase().chars().collect();
    let p: Vec<char> = pattern.to_lowercase().chars().collect();
    wildcard_inner(&t, &p)
}

fn wildcard_inner(text: &[char], pattern: &[char]) -> bool {
    match pattern.first() {
        None => text.is_empty(),
        Some('*') => {
            // Greedy star: try every split point.
            (0..=text.len()).any(|i| wildcard_inner(&text[i..], &pattern[1..]))
        }
        Some('?') => !text.is_empty() && wildcard_inner(&text[1..], &pattern[1..]),
        Some(&c) => {
            text.first() == Some(&c) && wildcard_inner(&text[1..], &pattern[1..])
        }
    }
}
