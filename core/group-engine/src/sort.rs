//! FILENAME: core/group-engine/src/sort.rs
//! PURPOSE: The stable multi-key row sort engine.
//! CONTEXT: Applies per-row sort rules in order; the first non-tie decides.
//! Per rule the comparison cascades date → number → text, and null/empty
//! cells sort last regardless of direction. Group-key ordering does NOT go
//! through here; it uses the type-priority comparator in the engine crate.

use std::cmp::Ordering;

use engine::{cell, classify, dates, Row, Scalar};

use crate::definition::{SortDirection, SortRule};

/// Stably sorts row indices by the rule list. An empty rule list is a no-op.
pub fn sort_rows(rows: &[Row], indices: &mut [u32], rules: &[SortRule]) {
    if rules.is_empty() {
        return;
    }
    indices.sort_by(|&a, &b| {
        let ra = &rows[a as usize];
        let rb = &rows[b as usize];
        for rule in rules {
            let ord = compare_by_rule(ra, rb, rule);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

fn compare_by_rule(a: &Row, b: &Row, rule: &SortRule) -> Ordering {
    let va = cell(a, &rule.column);
    let vb = cell(b, &rule.column);

    // Empties pin to the end before direction applies.
    match (va.is_empty(), vb.is_empty()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }

    let ord = compare_cells(va, vb);
    match rule.direction {
        SortDirection::Ascending => ord,
        SortDirection::Descending => ord.reverse(),
    }
}

/// Generic cell comparison: dates when either side is date-shaped, then
/// numbers when both sides parse, then case-insensitive text. Date
/// comparison uses the date part only, so same-day cells tie regardless
/// of time of day and keep their upstream order.
pub fn compare_cells(a: &Scalar, b: &Scalar) -> Ordering {
    if is_date_like(a) || is_date_like(b) {
        if let (Some(da), Some(db)) = (a.as_date(), b.as_date()) {
            return da.date().cmp(&db.date());
        }
    }

    if let (Some(na), Some(nb)) = (a.as_number(), b.as_number()) {
        return na.partial_cmp(&nb).unwrap_or(Ordering::Equal);
    }

    classify::compare_text(&a.display(), &b.display())
}

fn is_date_like(v: &Scalar) -> bool {
    match v {
        Scalar::Date(_) => true,
        Scalar::Text(s) => dates::looks_like_date(s),
        _ => false,
    }
}
