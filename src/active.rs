//! Recording scalar.
//!
//! [`Active<'r, F>`] is either a plain constant or a value living on the trace
//! of a [`Recorder`]. Arithmetic on an `Active` records the operation on that
//! recorder; arithmetic on constants only is evaluated directly and never
//! reaches a trace.

use std::fmt::{self, Display};

use crate::float::Float;
use crate::opcode::OpCode;
use crate::recorder::Recorder;

/// Sentinel index for constants (not on any trace).
pub(crate) const CONSTANT: u32 = u32::MAX;

/// Operator-overloading scalar used while recording a [`Trace`](crate::Trace).
///
/// `Copy`, and tied to its recorder by the lifetime `'r`, so it cannot
/// outlive the recording.
#[derive(Clone, Copy)]
pub struct Active<'r, F: Float> {
    pub(crate) value: F,
    pub(crate) recorder: Option<&'r Recorder<F>>,
    pub(crate) index: u32,
}

impl<'r, F: Float> Active<'r, F> {
    /// Create a constant (not tracked on any trace).
    #[inline]
    pub fn constant(value: F) -> Self {
        Active {
            value,
            recorder: None,
            index: CONSTANT,
        }
    }

    #[inline]
    pub(crate) fn on_trace(value: F, recorder: &'r Recorder<F>, index: u32) -> Self {
        Active {
            value,
            recorder: Some(recorder),
            index,
        }
    }

    /// Primal value at the recording point.
    #[inline]
    pub fn value(&self) -> F {
        self.value
    }

    /// True if this value does not depend on any input.
    #[inline]
    pub fn is_constant(&self) -> bool {
        self.recorder.is_none()
    }

    /// Record a unary op producing `value`.
    #[inline]
    pub(crate) fn unary(self, op: OpCode, value: F) -> Self {
        match self.recorder {
            None => Active::constant(value),
            Some(r) => Active::on_trace(value, r, r.push_unary(&self, op, value)),
        }
    }

    /// Record a binary op producing `value`. Constants are promoted to trace
    /// entries only when the other operand is on a trace.
    #[inline]
    pub(crate) fn binary(self, rhs: Self, op: OpCode, value: F) -> Self {
        match self.recorder.or(rhs.recorder) {
            None => Active::constant(value),
            Some(r) => Active::on_trace(value, r, r.push_binary(&self, &rhs, op, value)),
        }
    }

    #[inline]
    pub(crate) fn powi_op(self, exp: i32, value: F) -> Self {
        match self.recorder {
            None => Active::constant(value),
            Some(r) => Active::on_trace(value, r, r.push_powi(&self, exp, value)),
        }
    }
}

impl<F: Float> fmt::Debug for Active<'_, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.recorder.is_some() {
            write!(f, "Active({:?} @ {})", self.value, self.index)
        } else {
            write!(f, "Active({:?} const)", self.value)
        }
    }
}

impl<F: Float> Display for Active<'_, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<F: Float> Default for Active<'_, F> {
    fn default() -> Self {
        Active::constant(F::zero())
    }
}
