//! FILENAME: core/pivot-engine/src/definition.rs
//! Pivot Definition - The serializable cross-tab configuration.
//!
//! These structures DESCRIBE a pivot: immutable snapshots of user intent,
//! serializable for preset saving and host round-trips. The derived matrix
//! is always recomputed from scratch against them.
//!
//! Reuses BinSet and FilterCondition from the engine crate.

use std::hash::{Hash, Hasher};

use engine::{BinSet, FilterCondition};
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};

/// Default display cap on distinct row keys before top-N folding.
pub const DEFAULT_MAX_ITEMS: usize = 20;

/// Default cap on the authoritative detail listing (always larger than the
/// display cap).
pub const DEFAULT_DETAIL_CAP: usize = 200;

// ============================================================================
// AGGREGATION
// ============================================================================

/// How matching cell values combine into one number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Aggregation {
    /// One per matching row; needs no value field.
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl Default for Aggregation {
    fn default() -> Self {
        Aggregation::Count
    }
}

impl Aggregation {
    /// True for aggregations that cannot run without a value field.
    pub fn needs_value_field(&self) -> bool {
        !matches!(self, Aggregation::Count)
    }
}

// ============================================================================
// MAIN CONFIGURATION STRUCT
// ============================================================================

/// The complete, serializable pivot configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotConfig {
    /// Column whose keys become matrix rows.
    pub row_field: String,

    /// Bin configuration for the row field.
    #[serde(default)]
    pub row_bins: BinSet,

    /// Column whose keys become matrix columns. Absent means one synthetic
    /// total column.
    #[serde(default)]
    pub column_field: Option<String>,

    /// Bin configuration for the column field.
    #[serde(default)]
    pub column_bins: BinSet,

    /// Column supplying the aggregated values. Required for every
    /// aggregation except count.
    #[serde(default)]
    pub value_field: Option<String>,

    #[serde(default)]
    pub aggregation: Aggregation,

    /// Row filters, all of which must pass.
    #[serde(default)]
    pub filters: Vec<FilterCondition>,

    /// Fuzzy merge rule text applied to plain text keys.
    #[serde(default)]
    pub rule_text: String,

    /// Display cap: beyond this many row keys the remainder folds into a
    /// synthetic row at render time. 0 disables folding.
    #[serde(default = "default_max_items")]
    pub max_items: usize,

    /// Cap on the authoritative detail listing.
    #[serde(default = "default_detail_cap")]
    pub detail_cap: usize,
}

fn default_max_items() -> usize {
    DEFAULT_MAX_ITEMS
}

fn default_detail_cap() -> usize {
    DEFAULT_DETAIL_CAP
}

impl PivotConfig {
    /// Minimal count-by-key configuration.
    pub fn count_by(row_field: impl Into<String>) -> Self {
        PivotConfig {
            row_field: row_field.into(),
            row_bins: BinSet::None,
            column_field: None,
            column_bins: BinSet::None,
            value_field: None,
            aggregation: Aggregation::Count,
            filters: Vec::new(),
            rule_text: String::new(),
            max_items: DEFAULT_MAX_ITEMS,
            detail_cap: DEFAULT_DETAIL_CAP,
        }
    }

    /// Content hash over the canonical JSON form, for recomputation gating.
    pub fn fingerprint(&self) -> u64 {
        // Serialization of plain data cannot fail; a hypothetical failure
        // hashes the empty string and still yields a stable value.
        let json = serde_json::to_string(self).unwrap_or_default();
        let mut hasher = FxHasher::default();
        json.hash(&mut hasher);
        hasher.finish()
    }
}
