//! FILENAME: core/pivot-engine/src/engine.rs
//! PURPOSE: The cross-tab aggregation engine.
//! CONTEXT: Enumerates distinct (row key, column key) pairs over the
//! filtered rows, aggregates matching values per cell, and derives row,
//! column, and grand totals by merging the cell accumulators. Row and
//! column keys order by the shared type-priority comparator. Pure and
//! rederived whole on any configuration change.

use engine::{cell, classify, level_key, Classification, Row, ValueKind};
use log::debug;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::definition::{Aggregation, PivotConfig};

/// Key of the synthetic column used when no column field is configured.
pub const TOTAL_COLUMN_KEY: &str = "total";

// ============================================================================
// ACCUMULATOR
// ============================================================================

/// Running aggregate for one cell. `rows` counts matching rows; the numeric
/// fields track only values that parsed. Mergeable so totals combine cell
/// accumulators instead of re-scanning rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accumulator {
    pub rows: u64,
    pub numeric_rows: u64,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for Accumulator {
    fn default() -> Self {
        Accumulator {
            rows: 0,
            numeric_rows: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl Accumulator {
    /// Records one matching row; unparseable cells count the row but
    /// contribute nothing numeric.
    pub fn record(&mut self, value: Option<f64>) {
        self.rows += 1;
        if let Some(v) = value {
            self.numeric_rows += 1;
            self.sum += v;
            self.min = self.min.min(v);
            self.max = self.max.max(v);
        }
    }

    /// Combines another accumulator into this one.
    pub fn merge(&mut self, other: &Accumulator) {
        self.rows += other.rows;
        self.numeric_rows += other.numeric_rows;
        self.sum += other.sum;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// The aggregated number. An empty numeric population yields 0, an
    /// explicit zero result rather than an error.
    pub fn value(&self, aggregation: Aggregation) -> f64 {
        match aggregation {
            Aggregation::Count => self.rows as f64,
            Aggregation::Sum => self.sum,
            Aggregation::Avg => {
                if self.numeric_rows == 0 {
                    0.0
                } else {
                    self.sum / self.numeric_rows as f64
                }
            }
            Aggregation::Min => {
                if self.numeric_rows == 0 { 0.0 } else { self.min }
            }
            Aggregation::Max => {
                if self.numeric_rows == 0 { 0.0 } else { self.max }
            }
        }
    }
}

// ============================================================================
// PIVOT TABLE
// ============================================================================

/// Whole-pipeline outcome, distinguishable by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PivotStatus {
    Generated,
    /// The aggregation needs a value field and none was configured; the
    /// matrix is deliberately empty.
    MissingValueField,
    /// The filter stage removed every row.
    EmptyAfterFilter,
}

/// The derived cross-tab matrix. Cells are row-major and aligned with
/// `row_keys` × `column_keys`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotTable {
    pub row_keys: Vec<Classification>,
    pub column_keys: Vec<Classification>,
    pub cells: Vec<Vec<f64>>,
    /// Per-row aggregate across all columns (not a sum of cell values).
    pub row_totals: Vec<f64>,
    /// Per-column aggregate across all rows.
    pub column_totals: Vec<f64>,
    pub grand_total: f64,
    /// Each row's share of the grand total, percent, one decimal.
    pub row_percentages: Vec<f64>,
    pub aggregation: Aggregation,
    pub status: PivotStatus,
    pub fingerprint: u64,
}

impl PivotTable {
    fn not_generated(config: &PivotConfig, status: PivotStatus) -> PivotTable {
        PivotTable {
            row_keys: Vec::new(),
            column_keys: Vec::new(),
            cells: Vec::new(),
            row_totals: Vec::new(),
            column_totals: Vec::new(),
            grand_total: 0.0,
            row_percentages: Vec::new(),
            aggregation: config.aggregation,
            status,
            fingerprint: config.fingerprint(),
        }
    }
}

/// Rounds to one decimal place for percentage display.
pub fn round_percent(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

// ============================================================================
// COMPUTATION
// ============================================================================

/// Derives the pivot matrix for (rows, config). Pure: identical inputs
/// yield an identical table.
pub fn compute(rows: &[Row], config: &PivotConfig) -> PivotTable {
    if config.aggregation.needs_value_field() && config.value_field.is_none() {
        return PivotTable::not_generated(config, PivotStatus::MissingValueField);
    }

    let candidates: Vec<&Row> = rows
        .iter()
        .filter(|row| engine::row_passes(row, &config.filters))
        .collect();
    if candidates.is_empty() {
        return PivotTable::not_generated(config, PivotStatus::EmptyAfterFilter);
    }

    let rules = engine::parse_rules(&config.rule_text);

    let mut row_index = KeyIndex::default();
    let mut col_index = KeyIndex::default();
    let mut cells: FxHashMap<(usize, usize), Accumulator> = FxHashMap::default();

    for row in &candidates {
        let row_class = level_key(cell(row, &config.row_field), &config.row_bins, &rules);
        let r = row_index.intern(row_class);

        let c = match &config.column_field {
            Some(column) => {
                let col_class = level_key(cell(row, column), &config.column_bins, &rules);
                col_index.intern(col_class)
            }
            None => col_index.intern(Classification::text(TOTAL_COLUMN_KEY)),
        };

        let value = config
            .value_field
            .as_ref()
            .and_then(|field| cell(row, field).as_number());
        cells.entry((r, c)).or_default().record(value);
    }

    let (row_keys, row_perm) = row_index.sorted();
    let (column_keys, col_perm) = col_index.sorted();
    let agg = config.aggregation;

    let mut matrix = vec![vec![0.0; column_keys.len()]; row_keys.len()];
    let mut row_accs = vec![Accumulator::default(); row_keys.len()];
    let mut col_accs = vec![Accumulator::default(); column_keys.len()];
    let mut grand = Accumulator::default();

    for ((old_r, old_c), acc) in &cells {
        let r = row_perm[*old_r];
        let c = col_perm[*old_c];
        matrix[r][c] = acc.value(agg);
        row_accs[r].merge(acc);
        col_accs[c].merge(acc);
        grand.merge(acc);
    }

    let grand_total = grand.value(agg);
    let row_totals: Vec<f64> = row_accs.iter().map(|a| a.value(agg)).collect();
    let row_percentages = row_totals
        .iter()
        .map(|&t| {
            if grand_total == 0.0 {
                0.0
            } else {
                round_percent(t / grand_total * 100.0)
            }
        })
        .collect();

    debug!(
        "pivot: {} rows -> {}x{} matrix, grand total {}",
        candidates.len(),
        row_keys.len(),
        column_keys.len(),
        grand_total
    );

    PivotTable {
        row_keys,
        column_keys,
        cells: matrix,
        row_totals,
        column_totals: col_accs.iter().map(|a| a.value(agg)).collect(),
        grand_total,
        row_percentages,
        aggregation: agg,
        status: PivotStatus::Generated,
        fingerprint: config.fingerprint(),
    }
}

/// Interns classifications by key in first-seen order, then yields them in
/// type-priority order with the old-index permutation.
#[derive(Default)]
struct KeyIndex {
    by_key: FxHashMap<String, usize>,
    keys: Vec<Classification>,
}

impl KeyIndex {
    fn intern(&mut self, classification: Classification) -> usize {
        match self.by_key.get(&classification.key) {
            Some(&idx) => {
                let existing = &mut self.keys[idx];
                if existing.kind == ValueKind::Numbered {
                    reconcile_numbered(existing, &classification);
                }
                idx
            }
            None => {
                let idx = self.keys.len();
                self.by_key.insert(classification.key.clone(), idx);
                self.keys.push(classification);
                idx
            }
        }
    }

    fn sorted(self) -> (Vec<Classification>, Vec<usize>) {
        let mut order: Vec<usize> = (0..self.keys.len()).collect();
        order.sort_by(|&a, &b| classify::compare_group_keys(&self.keys[a], &self.keys[b]));

        let mut perm = vec![0usize; self.keys.len()];
        for (new_idx, &old_idx) in order.iter().enumerate() {
            perm[old_idx] = new_idx;
        }

        let mut keys = self.keys;
        let mut sorted = Vec::with_capacity(keys.len());
        for &old_idx in &order {
            sorted.push(std::mem::replace(
                &mut keys[old_idx],
                Classification::empty(),
            ));
        }
        (sorted, perm)
    }
}

fn reconcile_numbered(existing: &mut Classification, seen: &Classification) {
    if let (Some(old), Some(new)) = (existing.sort_key, seen.sort_key) {
        if new < old {
            existing.sort_key = Some(new);
        }
    }
    let shorter = match (&existing.original_text, &seen.original_text) {
        (Some(a), Some(b)) => b.chars().count() < a.chars().count(),
        (None, Some(_)) => true,
        _ => false,
    };
    if shorter {
        existing.original_text = seen.original_text.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::Scalar;

    fn row(pairs: &[(&str, Scalar)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn sum_config() -> PivotConfig {
        let mut cfg = PivotConfig::count_by("cat");
        cfg.value_field = Some("n".to_string());
        cfg.aggregation = Aggregation::Sum;
        cfg
    }

    fn example_rows() -> Vec<Row> {
        vec![
            row(&[("cat", Scalar::Text("A".into())), ("n", Scalar::Number(5.0))]),
            row(&[("cat", Scalar::Text("A".into())), ("n", Scalar::Number(3.0))]),
            row(&[("cat", Scalar::Text("B".into())), ("n", Scalar::Number(10.0))]),
        ]
    }

    #[test]
    fn sum_by_category() {
        let table = compute(&example_rows(), &sum_config());

        assert_eq!(table.status, PivotStatus::Generated);
        let keys: Vec<&str> = table.row_keys.iter().map(|k| k.key.as_str()).collect();
        assert_eq!(keys, vec!["A", "B"]);
        assert_eq!(table.row_totals, vec![8.0, 10.0]);
        assert_eq!(table.grand_total, 18.0);
        assert_eq!(table.column_keys[0].key, TOTAL_COLUMN_KEY);
    }

    #[test]
    fn count_needs_no_value_field() {
        let table = compute(&example_rows(), &PivotConfig::count_by("cat"));
        assert_eq!(table.row_totals, vec![2.0, 1.0]);
        assert_eq!(table.grand_total, 3.0);
    }

    #[test]
    fn sum_without_value_field_is_not_generated() {
        let mut cfg = PivotConfig::count_by("cat");
        cfg.aggregation = Aggregation::Sum;
        let table = compute(&example_rows(), &cfg);
        assert_eq!(table.status, PivotStatus::MissingValueField);
        assert!(table.row_keys.is_empty());
        assert_eq!(table.grand_total, 0.0);
    }

    #[test]
    fn two_dimensional_matrix_with_totals() {
        let rows = vec![
            row(&[
                ("cat", Scalar::Text("A".into())),
                ("region", Scalar::Text("East".into())),
                ("n", Scalar::Number(1.0)),
            ]),
            row(&[
                ("cat", Scalar::Text("A".into())),
                ("region", Scalar::Text("West".into())),
                ("n", Scalar::Number(2.0)),
            ]),
            row(&[
                ("cat", Scalar::Text("B".into())),
                ("region", Scalar::Text("East".into())),
                ("n", Scalar::Number(4.0)),
            ]),
        ];
        let mut cfg = sum_config();
        cfg.column_field = Some("region".to_string());
        let table = compute(&rows, &cfg);

        let cols: Vec<&str> = table.column_keys.iter().map(|k| k.key.as_str()).collect();
        assert_eq!(cols, vec!["East", "West"]);
        assert_eq!(table.cells, vec![vec![1.0, 2.0], vec![4.0, 0.0]]);
        assert_eq!(table.row_totals, vec![3.0, 4.0]);
        assert_eq!(table.column_totals, vec![5.0, 2.0]);
        assert_eq!(table.grand_total, 7.0);
    }

    #[test]
    fn avg_aggregates_across_the_row_not_cell_averages() {
        let rows = vec![
            row(&[
                ("cat", Scalar::Text("A".into())),
                ("region", Scalar::Text("East".into())),
                ("n", Scalar::Number(10.0)),
            ]),
            row(&[
                ("cat", Scalar::Text("A".into())),
                ("region", Scalar::Text("West".into())),
                ("n", Scalar::Number(1.0)),
            ]),
            row(&[
                ("cat", Scalar::Text("A".into())),
                ("region", Scalar::Text("West".into())),
                ("n", Scalar::Number(1.0)),
            ]),
        ];
        let mut cfg = sum_config();
        cfg.aggregation = Aggregation::Avg;
        cfg.column_field = Some("region".to_string());
        let table = compute(&rows, &cfg);

        // Cell averages are 10 and 1; the row total averages all three
        // source values, not the two cell results.
        assert_eq!(table.cells[0], vec![10.0, 1.0]);
        assert_eq!(table.row_totals, vec![4.0]);
    }

    #[test]
    fn min_max_ignore_unparseable_cells() {
        let rows = vec![
            row(&[("cat", Scalar::Text("A".into())), ("n", Scalar::Text("¥500".into()))]),
            row(&[("cat", Scalar::Text("A".into())), ("n", Scalar::Text("junk".into()))]),
            row(&[("cat", Scalar::Text("A".into())), ("n", Scalar::Number(80.0))]),
        ];
        let mut cfg = sum_config();
        cfg.aggregation = Aggregation::Min;
        assert_eq!(compute(&rows, &cfg).row_totals, vec![80.0]);
        cfg.aggregation = Aggregation::Max;
        assert_eq!(compute(&rows, &cfg).row_totals, vec![500.0]);
    }

    #[test]
    fn min_of_empty_population_is_zero() {
        let rows = vec![row(&[
            ("cat", Scalar::Text("A".into())),
            ("n", Scalar::Text("junk".into())),
        ])];
        let mut cfg = sum_config();
        cfg.aggregation = Aggregation::Min;
        let table = compute(&rows, &cfg);
        assert_eq!(table.status, PivotStatus::Generated);
        assert_eq!(table.row_totals, vec![0.0]);
    }

    #[test]
    fn percentages_close_to_hundred() {
        let rows = vec![
            row(&[("cat", Scalar::Text("A".into())), ("n", Scalar::Number(1.0))]),
            row(&[("cat", Scalar::Text("B".into())), ("n", Scalar::Number(1.0))]),
            row(&[("cat", Scalar::Text("C".into())), ("n", Scalar::Number(1.0))]),
        ];
        let table = compute(&rows, &sum_config());
        let total: f64 = table.row_percentages.iter().sum();
        assert!((total - 100.0).abs() < 0.2);
        assert_eq!(table.row_percentages[0], 33.3);
    }

    #[test]
    fn zero_grand_total_yields_zero_percentages() {
        let rows = vec![row(&[
            ("cat", Scalar::Text("A".into())),
            ("n", Scalar::Number(0.0)),
        ])];
        let table = compute(&rows, &sum_config());
        assert_eq!(table.row_percentages, vec![0.0]);
    }

    #[test]
    fn accumulator_merge_matches_flat_accumulation() {
        let mut a = Accumulator::default();
        a.record(Some(1.0));
        a.record(None);
        let mut b = Accumulator::default();
        b.record(Some(5.0));
        b.record(Some(2.0));

        let mut merged = a;
        merged.merge(&b);
        assert_eq!(merged.rows, 4);
        assert_eq!(merged.value(Aggregation::Sum), 8.0);
        assert_eq!(merged.value(Aggregation::Min), 1.0);
        assert_eq!(merged.value(Aggregation::Max), 5.0);
        assert!((merged.value(Aggregation::Avg) - 8.0 / 3.0).abs() < 1e-12);
    }
}
