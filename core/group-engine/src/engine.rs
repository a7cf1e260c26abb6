//! FILENAME: core/group-engine/src/engine.rs
//! PURPOSE: The multi-level grouping engine.
//! CONTEXT: Filters rows, sorts the survivors, then partitions them level by
//! level into an arena-backed group tree. Every filtered row lands in exactly
//! one leaf; undersized groups fold into a trailing synthetic group without
//! losing rows. The tree is rederived whole on any configuration change.

use engine::{cell, classify, level_key, row_passes, Classification, Row, ValueKind};
use log::debug;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::definition::{GroupingConfig, GroupingLevel};
use crate::sort;

// ============================================================================
// GROUP TREE
// ============================================================================

/// One group node. Children hold arena indices, never owning references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupNode {
    /// Canonical group key from the classifier.
    pub key: String,
    /// Display label (numbered categories and bins keep a friendlier form).
    pub label: String,
    pub kind: ValueKind,
    /// Indices into the caller's row slice, in sorted candidate order.
    pub rows: Vec<u32>,
    /// Child node indices into the arena, ordered for display.
    pub children: Vec<usize>,
    /// Nesting depth, 0 for root groups.
    pub level: usize,
    /// Parent arena index; None for root groups.
    pub parent: Option<usize>,
}

impl GroupNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Whole-pipeline outcome, distinguishable by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TreeStatus {
    /// Groups (or sequential chunks) were produced.
    Generated,
    /// The filter stage removed every row; the tree is deliberately empty.
    EmptyAfterFilter,
}

/// The derived group tree: an arena of nodes plus the ordered root list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupTree {
    pub nodes: Vec<GroupNode>,
    pub roots: Vec<usize>,
    /// Number of rows that passed the filter stage.
    pub filtered_rows: usize,
    pub status: TreeStatus,
    /// Fingerprint of the configuration this tree was derived from.
    pub fingerprint: u64,
}

impl GroupTree {
    /// Leaf node indices in display order (depth-first).
    pub fn leaves(&self) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            if node.is_leaf() {
                out.push(idx);
            } else {
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    /// Labels from the root down to the given node, for breadcrumb display.
    pub fn label_path(&self, idx: usize) -> Vec<&str> {
        let mut path = Vec::new();
        let mut cursor = Some(idx);
        while let Some(i) = cursor {
            let node = &self.nodes[i];
            path.push(node.label.as_str());
            cursor = node.parent;
        }
        path.reverse();
        path
    }
}

// ============================================================================
// TREE CONSTRUCTION
// ============================================================================

/// Derives the group tree for (rows, config). Pure: identical inputs yield
/// an identical tree.
pub fn build_tree(rows: &[Row], config: &GroupingConfig) -> GroupTree {
    let fingerprint = config.fingerprint();

    let mut candidates: Vec<u32> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row_passes(row, &config.filters))
        .map(|(i, _)| i as u32)
        .collect();

    if candidates.is_empty() {
        debug!("group tree: 0 of {} rows passed the filter stage", rows.len());
        return GroupTree {
            nodes: Vec::new(),
            roots: Vec::new(),
            filtered_rows: 0,
            status: TreeStatus::EmptyAfterFilter,
            fingerprint,
        };
    }

    sort::sort_rows(rows, &mut candidates, &config.sort_rules);

    let mut tree = GroupTree {
        nodes: Vec::new(),
        roots: Vec::new(),
        filtered_rows: candidates.len(),
        status: TreeStatus::Generated,
        fingerprint,
    };

    if config.levels.is_empty() {
        tree.roots = sequential_chunks(&mut tree.nodes, &candidates, config.chunk_size);
    } else {
        let rules = engine::parse_rules(&config.rule_text);
        tree.roots = expand_level(&mut tree.nodes, rows, &candidates, config, &rules, 0, None);
    }

    debug!(
        "group tree: {} rows -> {} nodes ({} roots)",
        tree.filtered_rows,
        tree.nodes.len(),
        tree.roots.len()
    );
    tree
}

/// Sequential mode: fixed-size chunks of the sorted candidate list, labeled
/// by their 1-based inclusive row span.
fn sequential_chunks(
    nodes: &mut Vec<GroupNode>,
    candidates: &[u32],
    chunk_size: usize,
) -> Vec<usize> {
    let size = chunk_size.max(1);
    let mut roots = Vec::new();
    for (i, chunk) in candidates.chunks(size).enumerate() {
        let first = i * size + 1;
        let last = i * size + chunk.len();
        let label = format!("rows {}-{}", first, last);
        let idx = nodes.len();
        nodes.push(GroupNode {
            key: label.clone(),
            label,
            kind: ValueKind::Text,
            rows: chunk.to_vec(),
            children: Vec::new(),
            level: 0,
            parent: None,
        });
        roots.push(idx);
    }
    roots
}

/// Partitions `candidates` by the level's key function, orders the distinct
/// keys, folds undersized groups, then recurses into the next level.
fn expand_level(
    nodes: &mut Vec<GroupNode>,
    rows: &[Row],
    candidates: &[u32],
    config: &GroupingConfig,
    rules: &[engine::FuzzyRule],
    depth: usize,
    parent: Option<usize>,
) -> Vec<usize> {
    let level = &config.levels[depth];
    let mut groups = partition(rows, candidates, level, rules);
    groups.sort_by(|a, b| classify::compare_group_keys(&a.0, &b.0));

    let mut merged_slot = None;
    if config.merge_threshold > 0 {
        let (folded, merged) = fold_small_groups(groups, config.merge_threshold);
        groups = folded;
        merged_slot = merged;
    }

    let mut indices = Vec::with_capacity(groups.len());
    for (slot, (classification, group_rows)) in groups.into_iter().enumerate() {
        let idx = nodes.len();
        let synthetic = merged_slot == Some(slot);
        nodes.push(GroupNode {
            label: classification.label().to_string(),
            key: classification.key,
            kind: classification.kind,
            rows: group_rows,
            children: Vec::new(),
            level: depth,
            parent,
        });
        indices.push(idx);

        // Synthetic merged groups stay leaves.
        if depth + 1 < config.levels.len() && !synthetic {
            let child_rows = nodes[idx].rows.clone();
            let children =
                expand_level(nodes, rows, &child_rows, config, rules, depth + 1, Some(idx));
            nodes[idx].children = children;
        }
    }
    indices
}

/// Accumulates per-key row lists in candidate order. Numbered categories
/// keep the minimum sort key and the shortest display label seen.
fn partition(
    rows: &[Row],
    candidates: &[u32],
    level: &GroupingLevel,
    rules: &[engine::FuzzyRule],
) -> Vec<(Classification, Vec<u32>)> {
    let mut by_key: FxHashMap<String, usize> = FxHashMap::default();
    let mut groups: Vec<(Classification, Vec<u32>)> = Vec::new();

    for &row_idx in candidates {
        let value = cell(&rows[row_idx as usize], &level.column);
        let classification = level_key(value, &level.bins, rules);

        match by_key.get(&classification.key) {
            Some(&slot) => {
                let (existing, group_rows) = &mut groups[slot];
                group_rows.push(row_idx);
                if existing.kind == ValueKind::Numbered {
                    reconcile_numbered(existing, &classification);
                }
            }
            None => {
                by_key.insert(classification.key.clone(), groups.len());
                groups.push((classification, vec![row_idx]));
            }
        }
    }
    groups
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

/// Folds every group smaller than the threshold into one synthetic group
/// appended after the survivors. Row counts are conserved. Returns the
/// synthetic group's slot so callers need not infer it from the label.
fn fold_small_groups(
    groups: Vec<(Classification, Vec<u32>)>,
    threshold: usize,
) -> (Vec<(Classification, Vec<u32>)>, Option<usize>) {
    let mut kept = Vec::with_capacity(groups.len());
    let mut merged_rows: Vec<u32> = Vec::new();

    for group in groups {
        if group.1.len() < threshold {
            merged_rows.extend(&group.1);
        } else {
            kept.push(group);
        }
    }

    let merged_slot = if merged_rows.is_empty() {
        None
    } else {
        let label = format!("(other, merged<{})", threshold);
        kept.push((Classification::text(label), merged_rows));
        Some(kept.len() - 1)
    };
    (kept, merged_slot)
}

// ============================================================================
// UNIQUE VALUES
// ============================================================================

/// One distinct display value of a column with its occurrence count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniqueValue {
    pub value: String,
    pub count: usize,
}

/// Distinct display values for a column, sorted, for multi-select filter
/// UIs. Empty cells report under the empty sentinel.
pub fn unique_values(rows: &[Row], column: &str) -> Vec<UniqueValue> {
    let mut counts: FxHashMap<String, usize> = FxHashMap::default();
    for row in rows {
        let value = cell(row, column);
        let display = if value.is_empty() {
            classify::EMPTY_KEY.to_string()
        } else {
            value.display().trim().to_string()
        };
        *counts.entry(display).or_insert(0) += 1;
    }

    let mut out: Vec<UniqueValue> = counts
        .into_iter()
        .map(|(value, count)| UniqueValue { value, count })
        .collect();
    out.sort_by(|a, b| classify::compare_text(&a.value, &b.value));
    out
}
