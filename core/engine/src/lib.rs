//! FILENAME: core/engine/src/lib.rs
//! PURPOSE: Main library entry point for the value engine.
//! CONTEXT: Re-exports public types and modules for use by other crates.

pub mod bins;
pub mod classify;
pub mod dates;
pub mod error;
pub mod filter;
pub mod fuzzy;
pub mod numeric;
pub mod value;

// Re-export commonly used types at the crate root
pub use bins::{
    auto_numeric_bins, date_bin_key, numeric_bin_key, text_bin_key, BinSet, DateBin,
    NumericBin, TextBin, TextBinCondition, TextBinOp, OTHER_DATE_KEY, OTHER_KEY,
};
pub use classify::{
    classify, compare_group_keys, compare_text, level_key, Classification, ValueKind,
    EMPTY_KEY,
};
pub use dates::{coerce_date, date_key, excel_serial_to_datetime, parse_date_str};
pub use error::EngineError;
pub use filter::{
    date_range_passes, evaluate, row_passes, wildcard_match, FilterCondition, FilterOp,
};
pub use fuzzy::{match_target, parse_rules, FuzzyRule};
pub use numeric::parse_number;
pub use value::{cell, Row, Scalar};
