//! FILENAME: core/engine/src/error.rs

use thiserror::Error;

/// Errors for whole-configuration misuse. Per-cell parse and classification
/// failures never land here; they degrade to sentinels or None locally, and
/// missing columns read as null.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("no numeric values to derive bins from")]
    NoNumericValues,

    #[error("bin count must be at least 1")]
    ZeroBinCount,
}
