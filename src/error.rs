//! Error types.
//!
//! Every fallible operation returns [`Result`]. Errors fall into three families:
//! configuration problems detected before any sweep runs, evaluation failures
//! raised while sweeping the trace at a point, and consistency violations that
//! indicate a colouring or assembly bug.

use thiserror::Error;

use crate::trace::TraceId;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error(transparent)]
    Consistency(#[from] ConsistencyError),
}

impl Error {
    /// Configuration and consistency errors cannot be fixed by choosing a
    /// different evaluation point. Evaluation errors can.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Evaluation(_))
    }
}

/// Invalid setup: dimensions, limits or handles.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// The traced function is larger than the configured limit.
    #[error("{what} dimension {actual} exceeds the configured limit of {limit}")]
    DimensionLimit {
        what: &'static str,
        actual: usize,
        limit: usize,
    },

    /// A vector or matrix argument has the wrong length.
    #[error("{what}: expected length {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A derived artifact was used with a trace it was not built from.
    #[error("stale trace handle: built from trace {expected}, called with trace {actual}")]
    StaleTrace { expected: TraceId, actual: TraceId },

    /// A sparsity pattern could not be constructed.
    #[error("invalid sparsity pattern: {0}")]
    InvalidPattern(String),

    /// A deserialized trace violates the recording invariants.
    #[error("invalid trace: {0}")]
    InvalidTrace(String),

    /// A seed matrix does not hold `nrows * ncols` entries.
    #[error("invalid seed matrix: {0}")]
    InvalidSeed(String),
}

/// Failure while evaluating the trace at a point.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    /// An output value is NaN or infinite, usually a domain error such as
    /// `ln` of a negative number.
    #[error("output {output} is not finite ({value}) at the evaluation point")]
    NonFinite { output: usize, value: f64 },

    /// An entry of a compressed derivative block is NaN or infinite.
    #[error("derivative entry ({row}, lane {lane}) is not finite ({value})")]
    NonFiniteDerivative { row: usize, lane: usize, value: f64 },
}

/// A structural invariant of the compression does not hold.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConsistencyError {
    /// Two columns that share a row carry the same colour.
    #[error("row {row}: columns {first} and {second} share colour {colour}")]
    ColourCollision {
        row: usize,
        first: usize,
        second: usize,
        colour: usize,
    },

    /// A pattern entry lies in a column (or row) that has no colour.
    #[error("entry ({row}, {column}) has no colour")]
    Uncoloured { row: usize, column: usize },

    /// A vertex carries a colour outside `0..num_colors`.
    #[error("column {column} has colour {colour}, but the colouring has {num_colors} colours")]
    ColourOutOfRange {
        column: usize,
        colour: usize,
        num_colors: usize,
    },

    /// A colouring does not cover the pattern it is applied to.
    #[error("colouring has {colouring} entries, pattern has {pattern} columns")]
    ColouringSize { colouring: usize, pattern: usize },

    /// Output matrix or compressed block does not match the recovery map.
    #[error("pattern mismatch: {0}")]
    PatternMismatch(String),
}

/// Fail with [`ConfigurationError::DimensionMismatch`] unless `expected == actual`.
pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(ConfigurationError::DimensionMismatch {
            what,
            expected,
            actual,
        }
        .into());
    }
    Ok(())
}
