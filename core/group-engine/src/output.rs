//! FILENAME: core/group-engine/src/output.rs
//! PURPOSE: Pagination and output block assembly.
//! CONTEXT: Slices each leaf group into pages and emits one block per
//! (page, data column), page-major. Downstream export and clipboard code
//! relies on every column of page 1 preceding any block of page 2.

use engine::{cell, Row, Scalar};
use log::debug;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::definition::GroupingConfig;
use crate::engine::GroupTree;

/// Separator between breadcrumb segments in block labels.
pub const LABEL_SEPARATOR: &str = " › ";

/// One emitted block: the values of one data column for one page of one
/// leaf group, in display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputBlock {
    /// Breadcrumb label, e.g. "East › 2024-03 (page 2/3)".
    pub label: String,
    /// Source data column name.
    pub column: String,
    /// Raw cell values for this page's rows.
    pub values: Vec<Scalar>,
    /// Indices into the caller's row slice, aligned with `values`.
    pub source_rows: Vec<u32>,
}

/// Assembles output blocks from a derived tree. `pageSize` 0 keeps every
/// leaf on a single page.
pub fn assemble_blocks(
    rows: &[Row],
    tree: &GroupTree,
    config: &GroupingConfig,
) -> Vec<OutputBlock> {
    let mut blocks = Vec::new();
    if config.data_columns.is_empty() {
        return blocks;
    }

    for leaf_idx in tree.leaves() {
        let leaf = &tree.nodes[leaf_idx];
        if leaf.rows.is_empty() {
            continue;
        }

        let crumbs: SmallVec<[&str; 4]> = tree.label_path(leaf_idx).into();
        let base_label = crumbs.join(LABEL_SEPARATOR);

        let page_size = if config.page_size == 0 {
            leaf.rows.len()
        } else {
            config.page_size
        };
        let page_count = leaf.rows.len().div_ceil(page_size);

        for (page, page_rows) in leaf.rows.chunks(page_size).enumerate() {
            let label = if page_count > 1 {
                format!("{} (page {}/{})", base_label, page + 1, page_count)
            } else {
                base_label.clone()
            };

            for column in &config.data_columns {
                let values = page_rows
                    .iter()
                    .map(|&i| cell(&rows[i as usize], column).clone())
                    .collect();
                blocks.push(OutputBlock {
                    label: label.clone(),
                    column: column.clone(),
                    values,
                    source_rows: page_rows.to_vec(),
                });
            }
        }
    }

    debug!(
        "assembled {} output blocks from {} leaves",
        blocks.len(),
        tree.leaves().len()
    );
    blocks
}

/// Tab-separated export, one line per block: label, then the values.
/// Paste-into-spreadsheet reconstructs the displayed structure exactly.
pub fn blocks_to_tsv(blocks: &[OutputBlock]) -> String {
    let mut lines = Vec::with_capacity(blocks.len());
    for block in blocks {
        let mut fields = Vec::with_capacity(block.values.len() + 2);
        fields.push(block.label.clone());
        fields.push(block.column.clone());
        fields.extend(block.values.iter().map(Scalar::display));
        lines.push(fields.join("\t"));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::GroupingLevel;
    use crate::engine::build_tree;

    fn rows() -> Vec<Row> {
        (0..5)
            .map(|i| {
                let mut r = Row::new();
                r.insert("cat".to_string(), Scalar::Text("A".to_string()));
                r.insert("n".to_string(), Scalar::Number(i as f64));
                r.insert("name".to_string(), Scalar::Text(format!("row{}", i)));
                r
            })
            .collect()
    }

    fn config(page_size: usize) -> GroupingConfig {
        GroupingConfig {
            levels: vec![GroupingLevel::plain("cat")],
            data_columns: vec!["n".to_string(), "name".to_string()],
            page_size,
            ..GroupingConfig::default()
        }
    }

    #[test]
    fn page_major_block_order() {
        // 5 rows, pageSize 2, 2 columns: pages (2,2,1), 6 blocks.
        let rows = rows();
        let config = config(2);
        let tree = build_tree(&rows, &config);
        let blocks = assemble_blocks(&rows, &tree, &config);

        assert_eq!(blocks.len(), 6);
        let order: Vec<(&str, &str)> = blocks
            .iter()
            .map(|b| (b.label.as_str(), b.column.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("A (page 1/3)", "n"),
                ("A (page 1/3)", "name"),
                ("A (page 2/3)", "n"),
                ("A (page 2/3)", "name"),
                ("A (page 3/3)", "n"),
                ("A (page 3/3)", "name"),
            ]
        );
        assert_eq!(blocks[4].values.len(), 1);
    }

    #[test]
    fn unlimited_page_size_keeps_one_page() {
        let rows = rows();
        let config = config(0);
        let tree = build_tree(&rows, &config);
        let blocks = assemble_blocks(&rows, &tree, &config);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].label, "A");
        assert_eq!(blocks[0].values.len(), 5);
    }

    #[test]
    fn no_data_columns_emits_nothing() {
        let rows = rows();
        let mut cfg = config(2);
        cfg.data_columns.clear();
        let tree = build_tree(&rows, &cfg);
        assert!(assemble_blocks(&rows, &tree, &cfg).is_empty());
    }

    #[test]
    fn tsv_lines_match_blocks() {
        let rows = rows();
        let cfg = config(0);
        let tree = build_tree(&rows, &cfg);
        let blocks = assemble_blocks(&rows, &tree, &cfg);
        let tsv = blocks_to_tsv(&blocks);

        let lines: Vec<&str> = tsv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "A\tn\t0\t1\t2\t3\t4");
        assert_eq!(lines[1], "A\tname\trow0\trow1\trow2\trow3\trow4");
    }
}
