//! One-shot helpers: record `f` at `x` and differentiate immediately.
//!
//! For repeated evaluation keep the [`Trace`](crate::Trace) from
//! [`record`] and build a [`JacobianEngine`] once instead.

use crate::active::Active;
use crate::config::SparseConfig;
use crate::engine::JacobianEngine;
use crate::error::Result;
use crate::float::Float;
use crate::recorder::record;
use crate::sparse::SparseMatrix;

/// Dense Jacobian of `f` at `x`: `J[i][j] = ∂f_i/∂x_j`.
///
/// ```
/// use num_traits::Float;
///
/// let j = jacolor::jacobian(|x| vec![x[0] * x[1], x[0].exp()], &[2.0_f64, 3.0]).unwrap();
/// assert!((j[0][0] - 3.0).abs() < 1e-12);
/// assert!((j[0][1] - 2.0).abs() < 1e-12);
/// assert!((j[1][1]).abs() < 1e-12);
/// ```
pub fn jacobian<F: Float>(
    f: impl for<'r> FnOnce(&[Active<'r, F>]) -> Vec<Active<'r, F>>,
    x: &[F],
) -> Result<Vec<Vec<F>>> {
    let (trace, _) = record(f, x);
    trace.jacobian(x)
}

/// Jacobian-vector product (forward mode): `(f(x), J·v)`.
pub fn jvp<F: Float>(
    f: impl for<'r> FnOnce(&[Active<'r, F>]) -> Vec<Active<'r, F>>,
    x: &[F],
    v: &[F],
) -> Result<(Vec<F>, Vec<F>)> {
    let (trace, _) = record(f, x);
    trace.jvp(x, v)
}

/// Vector-Jacobian product (reverse mode): `(f(x), wᵀ·J)`.
pub fn vjp<F: Float>(
    f: impl for<'r> FnOnce(&[Active<'r, F>]) -> Vec<Active<'r, F>>,
    x: &[F],
    w: &[F],
) -> Result<(Vec<F>, Vec<F>)> {
    let (trace, _) = record(f, x);
    trace.vjp(x, w)
}

/// Sparse Jacobian of `f` at `x` with the default configuration.
///
/// Returns `(f(x), J)`.
pub fn sparse_jacobian<F: Float>(
    f: impl for<'r> FnOnce(&[Active<'r, F>]) -> Vec<Active<'r, F>>,
    x: &[F],
) -> Result<(Vec<F>, SparseMatrix<F>)> {
    sparse_jacobian_with(f, x, SparseConfig::default())
}

/// Sparse Jacobian of `f` at `x` with an explicit configuration.
pub fn sparse_jacobian_with<F: Float>(
    f: impl for<'r> FnOnce(&[Active<'r, F>]) -> Vec<Active<'r, F>>,
    x: &[F],
    config: SparseConfig,
) -> Result<(Vec<F>, SparseMatrix<F>)> {
    let (trace, values) = record(f, x);
    let engine = JacobianEngine::new(&trace, config)?;
    let jac = engine.compute_jacobian(&trace, x)?;
    Ok((values, jac))
}
