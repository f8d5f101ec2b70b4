//! nalgebra adapters.
//!
//! Thin wrappers accepting `DVector<F>` and returning `DVector<F>`, `DMatrix<F>`
//! or `CsrMatrix<F>`.

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CsrMatrix;

use crate::engine::JacobianEngine;
use crate::error::Result;
use crate::float::Float;
use crate::trace::Trace;

/// Dense Jacobian of a trace at `x` as a `DMatrix`.
pub fn jacobian_nalgebra<F: Float + nalgebra::Scalar>(
    trace: &Trace<F>,
    x: &DVector<F>,
) -> Result<DMatrix<F>> {
    let rows = trace.jacobian(x.as_slice())?;
    let flat: Vec<F> = rows.into_iter().flatten().collect();
    Ok(DMatrix::from_row_slice(
        trace.num_outputs(),
        trace.num_inputs(),
        &flat,
    ))
}

/// Sparse Jacobian at `x` as a `CsrMatrix` with the engine's structure.
pub fn sparse_jacobian_csr<F: Float + nalgebra::Scalar>(
    engine: &JacobianEngine,
    trace: &Trace<F>,
    x: &DVector<F>,
) -> Result<CsrMatrix<F>> {
    engine.compute_jacobian(trace, x.as_slice())?.to_csr()
}

/// `(f(x), J v)` as `DVector`s.
pub fn jvp_nalgebra<F: Float + nalgebra::Scalar>(
    trace: &Trace<F>,
    x: &DVector<F>,
    v: &DVector<F>,
) -> Result<(DVector<F>, DVector<F>)> {
    let (y, jv) = trace.jvp(x.as_slice(), v.as_slice())?;
    Ok((DVector::from_vec(y), DVector::from_vec(jv)))
}

/// `(f(x), J^T w)` as `DVector`s.
pub fn vjp_nalgebra<F: Float + nalgebra::Scalar>(
    trace: &Trace<F>,
    x: &DVector<F>,
    w: &DVector<F>,
) -> Result<(DVector<F>, DVector<F>)> {
    let (y, jtw) = trace.vjp(x.as_slice(), w.as_slice())?;
    Ok((DVector::from_vec(y), DVector::from_vec(jtw)))
}
