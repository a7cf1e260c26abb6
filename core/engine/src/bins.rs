//! FILENAME: core/engine/src/bins.rs
//! PURPOSE: Binning strategies - numeric ranges, date ranges, text condition
//! sets, and automatic numeric bin generation.
//! CONTEXT: Bins are evaluated in declaration order, first match wins.
//! Numeric bins are inclusive-min/exclusive-max with an inclusive last bin
//! so an auto-generated set covers its domain with no gap at the top edge.
//! Matched labels classify as `Numbered` keyed by declaration index, so
//! "low/mid/high" renders in declared order instead of alphabetically.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::classify::{Classification, ValueKind};
use crate::dates;
use crate::error::EngineError;
use crate::numeric;
use crate::value::Scalar;

/// Sentinel for numeric values outside every bin.
pub const OTHER_KEY: &str = "(other)";
/// Sentinel for date values outside every bin.
pub const OTHER_DATE_KEY: &str = "(other date)";

// ============================================================================
// BIN MODELS
// ============================================================================

/// A numeric range bin. Matches `min <= v < max`; the last bin of a set
/// additionally matches `v == max`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericBin {
    pub min: f64,
    pub max: f64,
    pub label: String,
}

/// A date range bin. Matches dates in `[start, end]` with `end` extended
/// to the last instant of its day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateBin {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub label: String,
}

/// Operators usable inside a text bin condition. The text operators compare
/// case-insensitively; the numeric operators parse the cell through the
/// shared numeric parser and never match when parsing fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextBinOp {
    Contains,
    Equals,
    StartsWith,
    EndsWith,
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
    NumberEquals,
}

/// One condition of a text bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBinCondition {
    pub op: TextBinOp,
    pub operand: String,
}

/// A text bin: matches when the value is one of `values` or satisfies any
/// of `conditions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBin {
    pub label: String,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<TextBinCondition>,
}

/// The bin configuration of one grouping level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BinSet {
    None,
    Numeric(Vec<NumericBin>),
    Date(Vec<DateBin>),
    Text(Vec<TextBin>),
}

impl Default for BinSet {
    fn default() -> Self {
        BinSet::None
    }
}

// ============================================================================
// BIN APPLICATION
// ============================================================================

fn bin_label_key(label: &str, index: usize) -> Classification {
    Classification {
        kind: ValueKind::Numbered,
        key: label.to_string(),
        sort_key: Some(index as f64),
        original_text: None,
    }
}

/// Applies numeric bins to a value. Unparseable or unmatched values land
/// in the "(other)" sentinel, ordered after every declared bin.
pub fn numeric_bin_key(bins: &[NumericBin], value: &Scalar) -> Classification {
    if let Some(v) = value.as_number() {
        let last = bins.len().saturating_sub(1);
        for (i, bin) in bins.iter().enumerate() {
            let upper_hit = if i == last { v <= bin.max } else { v < bin.max };
            if v >= bin.min && upper_hit {
                return bin_label_key(&bin.label, i);
            }
        }
    }
    bin_label_key(OTHER_KEY, bins.len())
}

/// Applies date bins to a value. The upper edge is end-of-day inclusive.
pub fn date_bin_key(bins: &[DateBin], value: &Scalar) -> Classification {
    if let Some(dt) = value.as_date() {
        for (i, bin) in bins.iter().enumerate() {
            let start = bin.start.and_hms_opt(0, 0, 0);
            let start = match start {
                Some(s) => s,
                None => continue,
            };
            if dt >= start && dt <= dates::end_of_day(bin.end) {
                return bin_label_key(&bin.label, i);
            }
        }
    }
    bin_label_key(OTHER_DATE_KEY, bins.len())
}

/// Applies text bins to a value. Returns None when no bin matches so the
/// caller can fall through to fuzzy rules and raw-value passthrough.
pub fn text_bin_key(bins: &[TextBin], value: &Scalar) -> Option<Classification> {
    let raw = value.display();
    let trimmed = raw.trim();
    let lowered = trimmed.to_lowercase();

    for (i, bin) in bins.iter().enumerate() {
        let literal_hit = bin
            .values
            .iter()
            .any(|v| v.trim().to_lowercase() == lowered);
        if literal_hit || bin.conditions.iter().any(|c| condition_hit(c, trimmed, value)) {
            return Some(bin_label_key(&bin.label, i));
        }
    }
    None
}

fn condition_hit(cond: &TextBinCondition, trimmed: &str, value: &Scalar) -> bool {
    let operand = cond.operand.trim();
    match cond.op {
        TextBinOp::Contains
        | TextBinOp::Equals
        | TextBinOp::StartsWith
        | TextBinOp::EndsWith => {
            let hay = trimmed.to_lowercase();
            let needle = operand.to_lowercase();
            match cond.op {
                TextBinOp::Contains => hay.contains(&needle),
                TextBinOp::Equals => hay == needle,
                TextBinOp::StartsWith => hay.starts_with(&needle),
                TextBinOp::EndsWith => hay.ends_with(&needle),
                _ => unreachable!(),
            }
        }
        TextBinOp::GreaterThan
        | TextBinOp::LessThan
        | TextBinOp::GreaterOrEqual
        | TextBinOp::LessOrEqual
        | TextBinOp::NumberEquals => {
            let (v, bound) = match (value.as_number(), numeric::parse_number(operand)) {
                (Some(v), Some(b)) => (v, b),
                _ => return false,
            };
            match cond.op {
                TextBinOp::GreaterThan => v > bound,
                TextBinOp::LessThan => v < bound,
                TextBinOp::GreaterOrEqual => v >= bound,
                TextBinOp::LessOrEqual => v <= bound,
                TextBinOp::NumberEquals => v == bound,
                _ => unreachable!(),
            }
        }
    }
}

// ============================================================================
// AUTO BIN GENERATION
// ============================================================================

/// Rounds a naive bin width up to a "nice" unit.
fn nice_width(naive: f64) -> f64 {
    if naive <= 5.0 {
        5.0
    } else if naive <= 10.0 {
        10.0
    } else if naive <= 100.0 {
        100.0
    } else if naive <= 500.0 {
        500.0
    } else if naive <= 1000.0 {
        1000.0
    } else {
        (naive / 1000.0).ceil() * 1000.0
    }
}

fn fmt_bound(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

/// Generates contiguous numeric bins over the given values. The first bin
/// starts at `floor(min / width) * width`; the last bin's upper edge is
/// forced to exactly `max` so the set covers the full observed range.
pub fn auto_numeric_bins(
    values: &[f64],
    target_count: usize,
) -> Result<Vec<NumericBin>, EngineError> {
    if target_count == 0 {
        return Err(EngineError::ZeroBinCount);
    }
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let (min, max) = match finite.iter().fold(None, |acc: Option<(f64, f64)>, &v| {
        Some(match acc {
            Some((lo, hi)) => (lo.min(v), hi.max(v)),
            None => (v, v),
        })
    }) {
        Some(bounds) => bounds,
        None => return Err(EngineError::NoNumericValues),
    };

    if min == max {
        return Ok(vec![NumericBin {
            min,
            max,
            label: fmt_bound(min),
        }]);
    }

    let width = nice_width((max - min) / target_count as f64);
    let start = (min / width).floor() * width;

    let mut bins = Vec::new();
    let mut lo = start;
    while lo < max {
        let hi = if lo + width >= max { max } else { lo + width };
        bins.push(NumericBin {
            min: lo,
            max: hi,
            label: format!("{}-{}", fmt_bound(lo), fmt_bound(hi)),
        });
        lo = hi;
    }

    Ok(bins)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_tier_bins() -> Vec<NumericBin> {
        vec![
            NumericBin { min: 0.0, max: 100.0, label: "low".to_string() },
            NumericBin { min: 101.0, max: 500.0, label: "mid".to_string() },
            NumericBin { min: 501.0, max: 999_999.0, label: "high".to_string() },
        ]
    }

    #[test]
    fn numeric_bins_first_match_wins() {
        let bins = three_tier_bins();
        let keys: Vec<String> = [50.0, 150.0, 999.0]
            .iter()
            .map(|v| numeric_bin_key(&bins, &Scalar::Number(*v)).key)
            .collect();
        assert_eq!(keys, vec!["low", "mid", "high"]);
    }

    #[test]
    fn numeric_bins_boundaries() {
        let bins = vec![
            NumericBin { min: 0.0, max: 10.0, label: "a".to_string() },
            NumericBin { min: 10.0, max: 20.0, label: "b".to_string() },
        ];
        // Exclusive max except the last bin, which is inclusive.
        assert_eq!(numeric_bin_key(&bins, &Scalar::Number(10.0)).key, "b");
        assert_eq!(numeric_bin_key(&bins, &Scalar::Number(20.0)).key, "b");
        assert_eq!(numeric_bin_key(&bins, &Scalar::Number(20.1)).key, OTHER_KEY);
    }

    #[test]
    fn numeric_bins_sentinel_for_unparseable() {
        let bins = three_tier_bins();
        let c = numeric_bin_key(&bins, &Scalar::Text("abc".to_string()));
        assert_eq!(c.key, OTHER_KEY);
        assert_eq!(c.sort_key, Some(3.0)); // after every declared bin
    }

    #[test]
    fn date_bins_end_of_day_inclusive() {
        let bins = vec![DateBin {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            label: "jan".to_string(),
        }];
        let inside = Scalar::Text("2024-01-31 18:00:00".to_string());
        assert_eq!(date_bin_key(&bins, &inside).key, "jan");
        let outside = Scalar::Text("2024-02-01".to_string());
        assert_eq!(date_bin_key(&bins, &outside).key, OTHER_DATE_KEY);
    }

    #[test]
    fn text_bins_literals_and_conditions() {
        let bins = vec![
            TextBin {
                label: "direct".to_string(),
                values: vec!["A".to_string(), "B".to_string()],
                conditions: Vec::new(),
            },
            TextBin {
                label: "big".to_string(),
                values: Vec::new(),
                conditions: vec![TextBinCondition {
                    op: TextBinOp::GreaterOrEqual,
                    operand: "100".to_string(),
                }],
            },
        ];
        assert_eq!(
            text_bin_key(&bins, &Scalar::Text("a".to_string())).unwrap().key,
            "direct"
        );
        assert_eq!(
            text_bin_key(&bins, &Scalar::Text("250".to_string())).unwrap().key,
            "big"
        );
        assert!(text_bin_key(&bins, &Scalar::Text("nope".to_string())).is_none());
    }

    #[test]
    fn auto_bins_cover_domain() {
        let values = [3.0, 7.0, 12.0, 48.0];
        let bins = auto_numeric_bins(&values, 4).unwrap();
        assert!(!bins.is_empty());
        assert_eq!(bins.last().unwrap().max, 48.0);
        // Every value maps to exactly one bin.
        for v in values {
            let hits = bins
                .iter()
                .enumerate()
                .filter(|(i, b)| {
                    let last = *i == bins.len() - 1;
                    v >= b.min && if last { v <= b.max } else { v < b.max }
                })
                .count();
            assert_eq!(hits, 1, "value {} should hit exactly one bin", v);
        }
        // Contiguity.
        for pair in bins.windows(2) {
            assert_eq!(pair[0].max, pair[1].min);
        }
    }

    #[test]
    fn auto_bins_degenerate_inputs() {
        assert_eq!(auto_numeric_bins(&[], 5), Err(EngineError::NoNumericValues));
        assert_eq!(auto_numeric_bins(&[1.0], 0), Err(EngineError::ZeroBinCount));
        let single = auto_numeric_bins(&[9.0, 9.0], 5).unwrap();
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].min, 9.0);
    }

    #[test]
    fn nice_width_ladder() {
        assert_eq!(nice_width(2.0), 5.0);
        assert_eq!(nice_width(8.0), 10.0);
        assert_eq!(nice_width(60.0), 100.0);
        assert_eq!(nice_width(300.0), 500.0);
        assert_eq!(nice_width(800.0), 1000.0);
        assert_eq!(nice_width(2400.0), 3000.0);
    }
}
