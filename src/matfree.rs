//! Matrix-free Jacobian operators.
//!
//! These apply `J v` and `J^T w` with one tangent or adjoint sweep each,
//! without a pattern or colouring. Useful for Krylov solvers where assembling
//! the Jacobian is not worth it.

use crate::error::{check_len, Result};
use crate::float::Float;
use crate::trace::Trace;

/// `v -> J(x0) v + shift * v` for a square explicit function.
#[derive(Clone, Debug)]
pub struct ShiftedOperator<'t, F: Float> {
    trace: &'t Trace<F>,
    x0: Vec<F>,
    shift: F,
}

impl<'t, F: Float> ShiftedOperator<'t, F> {
    /// Linearise `trace` at `x0`.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::DimensionMismatch`](crate::ConfigurationError::DimensionMismatch)
    /// if the trace is not square or `x0` has the wrong length.
    pub fn new(trace: &'t Trace<F>, x0: Vec<F>, shift: F) -> Result<Self> {
        check_len("square operator outputs", trace.num_inputs(), trace.num_outputs())?;
        check_len("x0", trace.num_inputs(), x0.len())?;
        Ok(ShiftedOperator { trace, x0, shift })
    }

    pub fn dim(&self) -> usize {
        self.x0.len()
    }

    pub fn shift(&self) -> F {
        self.shift
    }

    /// Change the shift without re-linearising.
    pub fn set_shift(&mut self, shift: F) {
        self.shift = shift;
    }

    /// `J(x0) v + shift * v`.
    pub fn apply(&self, v: &[F]) -> Result<Vec<F>> {
        let (_, mut jv) = self.trace.jvp(&self.x0, v)?;
        for (y, &vi) in jv.iter_mut().zip(v) {
            *y = *y + self.shift * vi;
        }
        Ok(jv)
    }

    /// `J(x0)^T w + shift * w`.
    pub fn apply_transpose(&self, w: &[F]) -> Result<Vec<F>> {
        let (_, mut jtw) = self.trace.vjp(&self.x0, w)?;
        for (y, &wi) in jtw.iter_mut().zip(w) {
            *y = *y + self.shift * wi;
        }
        Ok(jtw)
    }
}

/// `v -> (dF/dx + a dF/dxdot) v` for an implicit residual traced over `[x; xdot]`.
#[derive(Clone, Debug)]
pub struct ImplicitOperator<'t, F: Float> {
    trace: &'t Trace<F>,
    n: usize,
    stacked: Vec<F>,
    shift: F,
}

impl<'t, F: Float> ImplicitOperator<'t, F> {
    pub fn new(trace: &'t Trace<F>, x: &[F], xdot: &[F], shift: F) -> Result<Self> {
        let n = x.len();
        check_len("xdot", n, xdot.len())?;
        check_len("stacked [x; xdot] inputs", 2 * n, trace.num_inputs())?;
        let mut stacked = Vec::with_capacity(2 * n);
        stacked.extend_from_slice(x);
        stacked.extend_from_slice(xdot);
        Ok(ImplicitOperator {
            trace,
            n,
            stacked,
            shift,
        })
    }

    pub fn dim(&self) -> usize {
        self.n
    }

    pub fn shift(&self) -> F {
        self.shift
    }

    /// One tangent sweep in the direction `[v; a v]`.
    pub fn apply(&self, v: &[F]) -> Result<Vec<F>> {
        check_len("direction", self.n, v.len())?;
        let mut direction = Vec::with_capacity(2 * self.n);
        direction.extend_from_slice(v);
        direction.extend(v.iter().map(|&vi| self.shift * vi));
        let (_, jv) = self.trace.jvp(&self.stacked, &direction)?;
        Ok(jv)
    }

    /// One adjoint sweep; the `xdot` half of the gradient is scaled by `a`.
    pub fn apply_transpose(&self, w: &[F]) -> Result<Vec<F>> {
        let (_, g) = self.trace.vjp(&self.stacked, w)?;
        let (gx, gxdot) = g.split_at(self.n);
        Ok(gx
            .iter()
            .zip(gxdot)
            .map(|(&a, &b)| a + self.shift * b)
            .collect())
    }
}
