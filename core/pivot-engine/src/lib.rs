//! FILENAME: core/pivot-engine/src/lib.rs
//! PURPOSE: Main library entry point for the cross-tab engine.
//! CONTEXT: Re-exports public types and modules for use by hosts.

pub mod definition;
pub mod engine;
pub mod view;

// Re-export commonly used types at the crate root
pub use definition::{
    Aggregation, PivotConfig, DEFAULT_DETAIL_CAP, DEFAULT_MAX_ITEMS,
};
pub use engine::{
    compute, round_percent, Accumulator, PivotStatus, PivotTable, TOTAL_COLUMN_KEY,
};
pub use view::{detail_rows, render, view_to_tsv, PivotView, PivotViewRow};
