//! Sparse Jacobians by tracing, column colouring and compressed sweeps.
//!
//! Record `f: R^n -> R^m` once with [`record`], then build a [`JacobianEngine`]
//! (or an [`ImplicitJacobianEngine`] for residuals `F(x, xdot)`) that owns the
//! sparsity pattern, colouring, seed and recovery map. Every evaluation runs a
//! single vector-forward sweep with one lane per colour and scatters the
//! compressed block back into a [`SparseMatrix`].

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod float;
pub mod grid;
pub mod matfree;
pub mod opcode;
pub mod recorder;
pub mod scalar;
pub mod sparse;
pub mod trace;

mod active;
mod traits;

#[cfg(feature = "nalgebra")]
pub mod nalgebra_support;

pub use active::Active;
pub use api::{jacobian, jvp, sparse_jacobian, sparse_jacobian_with, vjp};
pub use config::{ColoringOrder, CompressionMode, SparseConfig, SparsityMode};
pub use engine::{ImplicitJacobianEngine, JacobianEngine};
pub use error::{ConfigurationError, ConsistencyError, Error, EvaluationError, Result};
pub use float::Float;
pub use grid::Grid2d;
pub use matfree::{ImplicitOperator, ShiftedOperator};
pub use recorder::{record, Recorder};
pub use scalar::Scalar;
pub use sparse::{
    Coloring, CompressedJacobian, InsertMode, RecoveryMap, SeedMatrix, SparseMatrix,
    SparsityPattern,
};
pub use trace::{Trace, TraceId, ZeroOrderReport};
