//! FILENAME: core/group-engine/src/definition.rs
//! Grouping Definition - The serializable configuration.
//!
//! This module contains all the types needed to DESCRIBE a grouping run.
//! These structures are designed to be:
//! - Serializable (for preset saving and host round-trips)
//! - Immutable snapshots of user intent
//!
//! Reuses BinSet and FilterCondition from the engine crate.

use std::hash::{Hash, Hasher};

use engine::{BinSet, FilterCondition};
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};

/// Default chunk size for sequential (no grouping level) mode.
pub const DEFAULT_CHUNK_SIZE: usize = 25;

// ============================================================================
// SORT RULES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl Default for SortDirection {
    fn default() -> Self {
        SortDirection::Ascending
    }
}

/// One sort key: column plus direction. Rules apply in declaration order;
/// the first non-tie decides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortRule {
    pub column: String,
    #[serde(default)]
    pub direction: SortDirection,
}

// ============================================================================
// GROUPING LEVELS
// ============================================================================

/// One grouping level: the column whose values partition the rows, plus
/// that level's bin configuration. Levels nest outer to inner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupingLevel {
    pub column: String,
    #[serde(default)]
    pub bins: BinSet,
}

impl GroupingLevel {
    pub fn plain(column: impl Into<String>) -> Self {
        GroupingLevel {
            column: column.into(),
            bins: BinSet::None,
        }
    }
}

// ============================================================================
// MAIN CONFIGURATION STRUCT
// ============================================================================

/// The complete, serializable grouping configuration. This is the "source
/// of truth" a host persists and replays; the derived tree and blocks are
/// always recomputed from scratch against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupingConfig {
    /// Row filters, all of which must pass.
    #[serde(default)]
    pub filters: Vec<FilterCondition>,

    /// Grouping levels, outer to inner. Empty means sequential chunk mode.
    #[serde(default)]
    pub levels: Vec<GroupingLevel>,

    /// Fuzzy merge rule text ("target=kw1|kw2;…"), applied to plain text
    /// values on every level.
    #[serde(default)]
    pub rule_text: String,

    /// Groups with fewer rows than this fold into a trailing synthetic
    /// group. 0 disables merging.
    #[serde(default)]
    pub merge_threshold: usize,

    /// Row sort applied after filtering, before grouping and chunking.
    #[serde(default)]
    pub sort_rules: Vec<SortRule>,

    /// Columns emitted as output blocks, in display order.
    #[serde(default)]
    pub data_columns: Vec<String>,

    /// Rows per output page. 0 means unlimited (one page per leaf).
    #[serde(default)]
    pub page_size: usize,

    /// Chunk size for sequential mode.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

impl Default for GroupingConfig {
    fn default() -> Self {
        GroupingConfig {
            filters: Vec::new(),
            levels: Vec::new(),
            rule_text: String::new(),
            merge_threshold: 0,
            sort_rules: Vec::new(),
            data_columns: Vec::new(),
            page_size: 0,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl GroupingConfig {
    /// Content hash over the canonical JSON form. Recomputation gates
    /// compare fingerprints, never field-by-field strings.
    pub fn fingerprint(&self) -> u64 {
        fingerprint_json(self)
    }
}

/// Hashes any serializable configuration value by its canonical JSON.
/// Serialization of these plain data types cannot fail; a hypothetical
/// failure hashes the empty string and so still yields a stable value.
pub(crate) fn fingerprint_json<T: Serialize>(value: &T) -> u64 {
    let json = serde_json::to_string(value).unwrap_or_default();
    let mut hasher = FxHasher::default();
    json.hash(&mut hasher);
    hasher.finish()
}
