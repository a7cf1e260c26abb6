//! FILENAME: core/engine/src/classify.rs
//! PURPOSE: The value classifier - semantic type inference and canonical keys.
//! CONTEXT: Every grouping level and pivot axis funnels cell values through
//! `classify` (or `level_key` when bins are configured) to get a stable
//! {type, key, sort key} triple. Identical inputs always produce identical
//! keys; unclassifiable values degrade to sentinel labels, never errors.

use std::cmp::Ordering;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::bins::BinSet;
use crate::dates;
use crate::fuzzy::{self, FuzzyRule};
use crate::value::Scalar;

/// Sentinel key for null and blank cells.
pub const EMPTY_KEY: &str = "(empty)";

/// Leading-number category pattern: "N. text" or "N、text", matched per line.
static NUMBERED_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)\s*[.、]\s*\S").unwrap());

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// Semantic value type. Declaration order is the cross-type sort priority
/// used for group keys (numbered before dates before numbers before text).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum ValueKind {
    /// Numbered category ("1. 类别A") or a bin label; ordered by sort key.
    Numbered,
    Date,
    Number,
    Text,
}

/// The classifier's output for one cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub kind: ValueKind,
    /// Canonical group key. Pure function of (value, configuration).
    pub key: String,
    /// Numeric ordering hint: the leading number for numbered categories,
    /// the value itself for numbers, the epoch timestamp for dates, the
    /// declaration index for bin labels.
    pub sort_key: Option<f64>,
    /// Display label when it differs from the key (numbered categories keep
    /// the shortest matching source string for display).
    pub original_text: Option<String>,
}

impl Classification {
    pub fn text(key: impl Into<String>) -> Self {
        Classification {
            kind: ValueKind::Text,
            key: key.into(),
            sort_key: None,
            original_text: None,
        }
    }

    pub fn empty() -> Self {
        Classification::text(EMPTY_KEY)
    }

    /// The label shown for this key (falls back to the key itself).
    pub fn label(&self) -> &str {
        self.original_text.as_deref().unwrap_or(&self.key)
    }
}

/// Classifies one cell value. `rules` are the fuzzy merge rules applied to
/// otherwise-plain text.
pub fn classify(value: &Scalar, rules: &[FuzzyRule]) -> Classification {
    if value.is_empty() {
        return Classification::empty();
    }

    match value {
        Scalar::Date(dt) => Classification {
            kind: ValueKind::Date,
            key: dates::date_key(dt),
            sort_key: Some(dt.and_utc().timestamp() as f64),
            original_text: None,
        },
        Scalar::Number(n) => Classification {
            kind: ValueKind::Number,
            key: format!("{}", n),
            sort_key: Some(*n),
            original_text: None,
        },
        Scalar::Bool(b) => {
            Classification::text(if *b { "TRUE" } else { "FALSE" })
        }
        Scalar::Text(s) => classify_text(s, rules),
        Scalar::Null => Classification::empty(),
    }
}

fn classify_text(raw: &str, rules: &[FuzzyRule]) -> Classification {
    let trimmed = raw.trim();

    if let Some(numbered) = classify_numbered(trimmed) {
        return numbered;
    }

    if let Some(dt) = dates::parse_date_str(trimmed) {
        return Classification {
            kind: ValueKind::Date,
            key: dates::date_key(&dt),
            sort_key: Some(dt.and_utc().timestamp() as f64),
            original_text: None,
        };
    }

    if let Some(target) = fuzzy::match_target(trimmed, rules) {
        return Classification::text(target.to_string());
    }

    Classification::text(trimmed.to_string())
}

/// Tries the numbered-category pattern on each line of the value. The key
/// is the minimum leading number seen; the display label is the shortest
/// matching line.
fn classify_numbered(text: &str) -> Option<Classification> {
    let mut min_n: Option<u64> = None;
    let mut shortest: Option<&str> = None;

    for line in text.lines() {
        let line = line.trim();
        let caps = match NUMBERED_LINE.captures(line) {
            Some(c) => c,
            None => continue,
        };
        let n: u64 = match caps[1].parse() {
            Ok(n) => n,
            Err(_) => continue, // overflows u64; treat the line as plain text
        };
        if min_n.map_or(true, |m| n < m) {
            min_n = Some(n);
        }
        if shortest.map_or(true, |s| line.chars().count() < s.chars().count()) {
            shortest = Some(line);
        }
    }

    let n = min_n?;
    Some(Classification {
        kind: ValueKind::Numbered,
        key: n.to_string(),
        sort_key: Some(n as f64),
        original_text: shortest.map(str::to_string),
    })
}

// ============================================================================
// LEVEL KEY (classifier + bins + fuzzy rules, per grouping level)
// ============================================================================

/// Computes the group key for one cell under a level's configuration.
/// Bins run first (first match wins, in declaration order); unmatched text
/// falls through to the fuzzy rules and then to plain classification.
/// Bin labels classify as `Numbered` with the declaration index as the sort
/// key so they order as declared rather than alphabetically.
pub fn level_key(value: &Scalar, bins: &BinSet, rules: &[FuzzyRule]) -> Classification {
    if value.is_empty() {
        return Classification::empty();
    }

    match bins {
        BinSet::None => classify(value, rules),
        BinSet::Numeric(numeric_bins) => {
            crate::bins::numeric_bin_key(numeric_bins, value)
        }
        BinSet::Date(date_bins) => crate::bins::date_bin_key(date_bins, value),
        BinSet::Text(text_bins) => {
            if let Some(hit) = crate::bins::text_bin_key(text_bins, value) {
                return hit;
            }
            // No bin matched: raw value passes through as its own group.
            classify(value, rules)
        }
    }
}

// ============================================================================
// GROUP KEY ORDERING
// ============================================================================

/// Cross-type group key order: numbered < date < number < text. Within a
/// type: numbered ascending by sort key, dates and numbers descending,
/// text by case-insensitive comparison with the empty sentinel last.
pub fn compare_group_keys(a: &Classification, b: &Classification) -> Ordering {
    match a.kind.cmp(&b.kind) {
        Ordering::Equal => {}
        other => return other,
    }

    match a.kind {
        ValueKind::Numbered => compare_sort_keys(a, b),
        ValueKind::Date | ValueKind::Number => compare_sort_keys(b, a),
        ValueKind::Text => {
            match (a.key == EMPTY_KEY, b.key == EMPTY_KEY) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => compare_text(&a.key, &b.key),
            }
        }
    }
}

fn compare_sort_keys(a: &Classification, b: &Classification) -> Ordering {
    match (a.sort_key, b.sort_key) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => compare_text(&a.key, &b.key),
    }
}

/// Case-insensitive text order with a case-sensitive tiebreak, so the
/// result is total and deterministic.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    let lowered = a.to_lowercase().cmp(&b.to_lowercase());
    if lowered != Ordering::Equal {
        return lowered;
    }
    a.cmp(b)
}
