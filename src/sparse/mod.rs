//! Jacobian sparsity, colouring, compression and recovery.
//!
//! The pipeline for a fixed trace is
//!
//! 1. [`Trace::jacobian_pattern`](crate::Trace::jacobian_pattern) builds a
//!    [`SparsityPattern`],
//! 2. [`color_columns`] partitions structurally orthogonal columns into a
//!    [`Coloring`],
//! 3. [`SeedMatrix::from_coloring`] turns the colouring into a 0/1 seed,
//! 4. [`Trace::forward_compressed`](crate::Trace::forward_compressed) evaluates
//!    `J(x) S` as a [`CompressedJacobian`],
//! 5. [`RecoveryMap`] scatters the compressed block into a [`SparseMatrix`].
//!
//! Steps 1-3 and the recovery map are computed once; only steps 4 and 5 run per
//! evaluation point. [`JacobianEngine`](crate::JacobianEngine) packages the
//! whole sequence.

mod coloring;
mod compressed;
mod matrix;
mod pattern;
mod recovery;
mod seed;

pub use self::coloring::{color_columns, color_rows, Coloring, ConflictGraph};
pub use self::compressed::CompressedJacobian;
pub use self::matrix::{InsertMode, SparseMatrix};
pub use self::pattern::SparsityPattern;
pub use self::recovery::{Orientation, RecoveryMap};
pub use self::seed::SeedMatrix;
