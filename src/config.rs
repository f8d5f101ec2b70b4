//! Engine configuration.

use crate::error::{ConfigurationError, Result};

/// How dependencies propagate through piecewise-constant operations during
/// sparsity extraction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SparsityMode {
    /// Every operation depends on all of its operands.
    #[default]
    Safe,
    /// `signum`, `floor`, `ceil`, `round` and `trunc` have zero derivative
    /// almost everywhere and drop their operand's dependencies.
    Tight,
}

/// Vertex ordering fed to the greedy colouring.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ColoringOrder {
    /// Column index order.
    Natural,
    /// Static conflict degree, largest first.
    LargestFirst,
    /// Smallest-last removal order, coloured in reverse.
    #[default]
    SmallestLast,
}

/// Which Jacobian dimension is compressed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompressionMode {
    /// Colour columns, evaluate `J S` with one vector-forward sweep.
    #[default]
    Column,
    /// Colour rows, evaluate `W^T J` with one vector-reverse sweep.
    Row,
    /// No colouring. One forward lane per input; entries at or below
    /// [`SparseConfig::drop_tolerance`] are not assembled.
    Dense,
}

/// Settings shared by [`JacobianEngine`](crate::JacobianEngine) and
/// [`ImplicitJacobianEngine`](crate::ImplicitJacobianEngine).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SparseConfig {
    /// Largest accepted number of outputs (default: 2^22).
    pub max_rows: usize,
    /// Largest accepted number of inputs (default: 2^22).
    pub max_cols: usize,
    /// Dependency propagation rule (default: [`SparsityMode::Safe`]).
    pub sparsity_mode: SparsityMode,
    /// Colouring heuristic (default: [`ColoringOrder::SmallestLast`]).
    pub coloring_order: ColoringOrder,
    /// Compressed dimension (default: [`CompressionMode::Column`]).
    pub compression: CompressionMode,
    /// Magnitude threshold for [`CompressionMode::Dense`] (default: 1e-16).
    pub drop_tolerance: f64,
    /// Log every compressed Jacobian at `debug` level (default: false).
    pub view_compressed: bool,
}

impl Default for SparseConfig {
    fn default() -> Self {
        SparseConfig {
            max_rows: 1 << 22,
            max_cols: 1 << 22,
            sparsity_mode: SparsityMode::Safe,
            coloring_order: ColoringOrder::SmallestLast,
            compression: CompressionMode::Column,
            drop_tolerance: 1e-16,
            view_compressed: false,
        }
    }
}

impl SparseConfig {
    /// Reject an `nrows x ncols` problem that exceeds the limits.
    pub fn check_dimensions(&self, nrows: usize, ncols: usize) -> Result<()> {
        if nrows > self.max_rows {
            return Err(ConfigurationError::DimensionLimit {
                what: "row",
                actual: nrows,
                limit: self.max_rows,
            }
            .into());
        }
        if ncols > self.max_cols {
            return Err(ConfigurationError::DimensionLimit {
                what: "column",
                actual: ncols,
                limit: self.max_cols,
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_are_inclusive() {
        let config = SparseConfig {
            max_rows: 4,
            max_cols: 3,
            ..SparseConfig::default()
        };
        assert!(config.check_dimensions(4, 3).is_ok());
        assert!(config.check_dimensions(5, 3).is_err());
        assert!(config.check_dimensions(4, 4).is_err());
    }
}
