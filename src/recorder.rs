//! Explicit trace recording.
//!
//! A [`Recorder`] owns the trace under construction. Every [`Active`] value
//! carries a reference to the recorder it was created by, so operations know
//! where to record without any thread-local or global "current tape".

use std::cell::RefCell;

use crate::active::Active;
use crate::float::Float;
use crate::opcode::{OpCode, UNUSED};
use crate::trace::Trace;

/// Trace builder shared by the [`Active`] values of one recording.
pub struct Recorder<F: Float> {
    trace: RefCell<Trace<F>>,
}

impl<F: Float> Recorder<F> {
    /// Create an empty recorder with room for about `est_ops` entries.
    pub fn with_capacity(est_ops: usize) -> Self {
        Recorder {
            trace: RefCell::new(Trace::with_capacity(est_ops)),
        }
    }

    /// Register an input variable.
    ///
    /// All inputs must be registered before the first operation is recorded.
    ///
    /// # Panics
    ///
    /// If an operation or constant was already recorded.
    pub fn input(&self, value: F) -> Active<'_, F> {
        let index = self.trace.borrow_mut().new_input(value);
        Active::on_trace(value, self, index)
    }

    /// Trace index of `x`, promoting a constant to a `Const` entry.
    #[inline]
    fn index_of(&self, trace: &mut Trace<F>, x: &Active<'_, F>) -> u32 {
        match x.recorder {
            Some(r) => {
                assert!(
                    std::ptr::eq(r, self),
                    "Active values from different recorders were combined"
                );
                x.index
            }
            None => trace.push_const(x.value),
        }
    }

    pub(crate) fn push_unary(&self, x: &Active<'_, F>, op: OpCode, value: F) -> u32 {
        let mut trace = self.trace.borrow_mut();
        let xi = self.index_of(&mut trace, x);
        trace.push_op(op, xi, UNUSED, value)
    }

    pub(crate) fn push_binary(
        &self,
        lhs: &Active<'_, F>,
        rhs: &Active<'_, F>,
        op: OpCode,
        value: F,
    ) -> u32 {
        let mut trace = self.trace.borrow_mut();
        let li = self.index_of(&mut trace, lhs);
        let ri = self.index_of(&mut trace, rhs);
        trace.push_op(op, li, ri, value)
    }

    pub(crate) fn push_powi(&self, x: &Active<'_, F>, exp: i32, value: F) -> u32 {
        let mut trace = self.trace.borrow_mut();
        let xi = self.index_of(&mut trace, x);
        trace.push_powi(xi, exp, value)
    }

    /// Mark `outputs` as the function's results and return their trace indices.
    ///
    /// Outputs that are constants become `Const` entries, so they appear in
    /// the pattern as rows without columns.
    pub fn outputs(&self, outputs: &[Active<'_, F>]) -> Vec<u32> {
        let mut trace = self.trace.borrow_mut();
        outputs
            .iter()
            .map(|o| self.index_of(&mut trace, o))
            .collect()
    }

    /// Finish the recording. `output_indices` comes from [`outputs`](Self::outputs).
    pub fn finish(self, output_indices: Vec<u32>) -> Trace<F> {
        let mut trace = self.trace.into_inner();
        trace.set_outputs(output_indices);
        log::debug!(
            "recorded trace {}: {} inputs, {} outputs, {} entries",
            trace.id(),
            trace.num_inputs(),
            trace.num_outputs(),
            trace.num_ops()
        );
        trace
    }
}

/// Record a vector function `f: R^n -> R^m` at `x`.
///
/// Returns the trace and `f(x)`. Write `f` against [`Scalar`](crate::Scalar)
/// so the same code evaluates plain floats:
///
/// ```
/// use jacolor::{record, Scalar};
///
/// fn f<T: Scalar>(x: &[T]) -> Vec<T> {
///     vec![x[0] * x[1], x[1].sin()]
/// }
///
/// let (trace, y) = record(|v| f(v), &[2.0_f64, 0.5]);
/// assert_eq!(trace.num_outputs(), 2);
/// assert!((y[0] - 1.0).abs() < 1e-15);
/// ```
pub fn record<F: Float>(
    f: impl for<'r> FnOnce(&[Active<'r, F>]) -> Vec<Active<'r, F>>,
    x: &[F],
) -> (Trace<F>, Vec<F>) {
    let recorder = Recorder::with_capacity(x.len() * 10);
    let (indices, values) = {
        let inputs: Vec<Active<'_, F>> = x.iter().map(|&v| recorder.input(v)).collect();
        let outputs = f(&inputs);
        let values: Vec<F> = outputs.iter().map(|o| o.value).collect();
        (recorder.outputs(&outputs), values)
    };
    (recorder.finish(indices), values)
}
