//! FILENAME: core/group-engine/src/lib.rs
//! PURPOSE: Main library entry point for the grouping engine.
//! CONTEXT: Re-exports public types and modules for use by hosts.

pub mod definition;
pub mod engine;
pub mod output;
pub mod sort;

// Re-export commonly used types at the crate root
pub use definition::{
    GroupingConfig, GroupingLevel, SortDirection, SortRule, DEFAULT_CHUNK_SIZE,
};
pub use engine::{
    build_tree, unique_values, GroupNode, GroupTree, TreeStatus, UniqueValue,
};
pub use output::{assemble_blocks, blocks_to_tsv, OutputBlock, LABEL_SEPARATOR};
pub use sort::{compare_cells, sort_rows};
