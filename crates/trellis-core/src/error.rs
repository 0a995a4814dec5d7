// File: crates/trellis-core/src/error.rs
// Summary: Contract-violation errors. Bad data never errors; bad arguments do.

use thiserror::Error;

/// Errors raised only for programmer mistakes (invalid arguments).
/// Input-shape problems (unparseable dates, non-numeric fields) are
/// coerced or dropped by the individual routines and never reach here.
#[derive(Debug, Error, PartialEq)]
pub enum TrellisError {
    #[error("bin count must be at least 1")]
    InvalidBinCount,
    #[error("window size must be at least 1")]
    InvalidWindow,
    #[error("alpha must be in (0, 1], got {0}")]
    InvalidAlpha(f64),
    #[error("group-by requires at least one key field")]
    EmptyGroupBy,
    #[error("group-by requires at least one metric")]
    EmptyMetrics,
    #[error("at least one percentile must be requested")]
    NoPercentiles,
}
