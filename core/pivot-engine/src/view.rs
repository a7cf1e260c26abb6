//! FILENAME: core/pivot-engine/src/view.rs
//! PURPOSE: Rendering-time views over a computed pivot table.
//! CONTEXT: Top-N folding is a display decision: the computed table always
//! holds every key, and a view keeps the first N rows of the current order
//! while summing the remainder into one synthetic row. The detail listing
//! serves the authoritative, larger-capped table.

use serde::{Deserialize, Serialize};

use crate::engine::{round_percent, PivotStatus, PivotTable};

/// One displayed matrix row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotViewRow {
    pub label: String,
    pub cells: Vec<f64>,
    pub total: f64,
    /// Share of the grand total, percent, one decimal.
    pub percentage: f64,
}

/// A display-ready pivot: folded rows plus column and grand totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotView {
    pub column_labels: Vec<String>,
    pub rows: Vec<PivotViewRow>,
    pub column_totals: Vec<f64>,
    pub grand_total: f64,
    /// Number of keys folded into the trailing synthetic row; 0 when
    /// nothing folded.
    pub folded_keys: usize,
    pub status: PivotStatus,
}

/// Builds the display view, folding past `max_items` row keys. 0 disables
/// folding. The synthetic row's fields are the summed remainder.
pub fn render(table: &PivotTable, max_items: usize) -> PivotView {
    let all = view_rows(table, usize::MAX);
    let (rows, folded_keys) = if max_items > 0 && all.len() > max_items {
        let folded = all.len() - max_items;
        let mut kept: Vec<PivotViewRow> = all;
        let rest = kept.split_off(max_items);

        let width = table.column_keys.len();
        let mut other = PivotViewRow {
            label: format!("(other, {} items)", folded),
            cells: vec![0.0; width],
            total: 0.0,
            percentage: 0.0,
        };
        for row in &rest {
            for (slot, v) in other.cells.iter_mut().zip(&row.cells) {
                *slot += v;
            }
            other.total += row.total;
        }
        other.percentage = if table.grand_total == 0.0 {
            0.0
        } else {
            round_percent(other.total / table.grand_total * 100.0)
        };
        kept.push(other);
        (kept, folded)
    } else {
        (all, 0)
    };

    PivotView {
        column_labels: table
            .column_keys
            .iter()
            .map(|k| k.label().to_string())
            .collect(),
        rows,
        column_totals: table.column_totals.clone(),
        grand_total: table.grand_total,
        folded_keys,
        status: table.status,
    }
}

/// The authoritative detail listing: every key in order, truncated at the
/// (larger) detail cap, never folded.
pub fn detail_rows(table: &PivotTable, detail_cap: usize) -> Vec<PivotViewRow> {
    let cap = if detail_cap == 0 { usize::MAX } else { detail_cap };
    view_rows(table, cap)
}

fn view_rows(table: &PivotTable, cap: usize) -> Vec<PivotViewRow> {
    table
        .row_keys
        .iter()
        .enumerate()
        .take(cap)
        .map(|(i, key)| PivotViewRow {
            label: key.label().to_string(),
            cells: table.cells[i].clone(),
            total: table.row_totals[i],
            percentage: table.row_percentages[i],
        })
        .collect()
}

/// Tab-separated export: a header line, one line per displayed row, and a
/// totals line. Paste-into-spreadsheet reconstructs the displayed matrix.
pub fn view_to_tsv(view: &PivotView) -> String {
    let mut lines = Vec::with_capacity(view.rows.len() + 2);

    let mut header = vec![String::new()];
    header.extend(view.column_labels.iter().cloned());
    header.push("Total".to_string());
    lines.push(header.join("\t"));

    for row in &view.rows {
        let mut fields = vec![row.label.clone()];
        fields.extend(row.cells.iter().map(|v| format_cell(*v)));
        fields.push(format_cell(row.total));
        lines.push(fields.join("\t"));
    }

    let mut totals = vec!["Total".to_string()];
    totals.extend(view.column_totals.iter().map(|v| format_cell(*v)));
    totals.push(format_cell(view.grand_total));
    lines.push(totals.join("\t"));

    lines.join("\n")
}

fn format_cell(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}
