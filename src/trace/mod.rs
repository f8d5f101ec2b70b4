//! Re-evaluable opcode trace of a vector function `f: R^n -> R^m`.
//!
//! A [`Trace`] is produced once by [`record`](crate::record) and is read-only
//! afterwards. All sweeps take `&self` and write into caller-owned buffers, so a
//! single trace can be shared by several engines and evaluated at any point.
//!
//! # Limitations
//!
//! The trace records one execution path. If the recorded function contains
//! branches (`if x > 0 { ... } else { ... }`), re-evaluating at inputs that
//! take a different branch produces incorrect results.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{ConfigurationError, Result};
use crate::float::Float;
use crate::opcode::{self, OpCode, UNUSED};

// Submodules add impl blocks to Trace<F>.
mod forward;
mod reverse;
mod sparsity;
mod tangent;

pub use self::forward::ZeroOrderReport;

static NEXT_TRACE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a recorded trace.
///
/// Patterns and engines remember the id of the trace they were derived from and
/// refuse to run against any other trace. Ids are process-local; a deserialized
/// trace receives a fresh one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TraceId(u64);

impl TraceId {
    fn next() -> Self {
        TraceId(NEXT_TRACE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A recorded sequence of elementary operations.
///
/// Entries are stored in evaluation order. Inputs occupy the first
/// `num_inputs` slots; every other entry is a constant or an opcode whose
/// arguments point to earlier entries.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(
        try_from = "TraceData<F>",
        bound(deserialize = "F: serde::Deserialize<'de>")
    )
)]
pub struct Trace<F: Float> {
    #[cfg_attr(feature = "serde", serde(skip, default = "TraceId::next"))]
    pub(crate) id: TraceId,
    pub(crate) opcodes: Vec<OpCode>,
    pub(crate) arg_indices: Vec<[u32; 2]>,
    pub(crate) values: Vec<F>,
    pub(crate) num_inputs: u32,
    pub(crate) output_indices: Vec<u32>,
}

impl<F: Float> Trace<F> {
    pub(crate) fn with_capacity(est_ops: usize) -> Self {
        Trace {
            id: TraceId::next(),
            opcodes: Vec::with_capacity(est_ops),
            arg_indices: Vec::with_capacity(est_ops),
            values: Vec::with_capacity(est_ops),
            num_inputs: 0,
            output_indices: Vec::new(),
        }
    }

    #[inline]
    fn push_entry(&mut self, op: OpCode, args: [u32; 2], value: F) -> u32 {
        let idx = self.opcodes.len() as u32;
        self.opcodes.push(op);
        self.arg_indices.push(args);
        self.values.push(value);
        idx
    }

    /// Register a new input variable. Returns its index.
    ///
    /// # Panics
    ///
    /// If any other entry was recorded before this input.
    #[inline]
    pub(crate) fn new_input(&mut self, value: F) -> u32 {
        assert!(
            self.opcodes.len() == self.num_inputs as usize,
            "inputs must precede all other entries: input {} registered after {} recorded entries",
            self.num_inputs,
            self.opcodes.len()
        );
        self.num_inputs += 1;
        self.push_entry(OpCode::Input, [UNUSED, UNUSED], value)
    }

    /// Register a scalar constant. Returns its index.
    #[inline]
    pub(crate) fn push_const(&mut self, value: F) -> u32 {
        self.push_entry(OpCode::Const, [UNUSED, UNUSED], value)
    }

    #[inline]
    fn is_const(&self, idx: u32) -> bool {
        self.opcodes[idx as usize] == OpCode::Const
    }

    /// Record an operation. Returns the result index.
    ///
    /// If every operand is a `Const` entry the result is folded into a single
    /// `Const`. Identity patterns (`x + 0`, `x * 1`, `x / 1`) return the
    /// operand index unchanged.
    pub(crate) fn push_op(&mut self, op: OpCode, arg0: u32, arg1: u32, value: F) -> u32 {
        let arg0_const = self.is_const(arg0);
        let arg1_const = arg1 == UNUSED || self.is_const(arg1);
        if arg0_const && arg1_const {
            return self.push_const(value);
        }

        if arg1 != UNUSED && (arg0_const || arg1_const) {
            if let Some(idx) = self.try_identity(op, arg0, arg1, arg0_const, arg1_const) {
                return idx;
            }
        }

        self.push_entry(op, [arg0, arg1], value)
    }

    /// Identity simplification for a binary op with exactly one constant operand.
    ///
    /// Absorbing patterns such as `x * 0` are not folded; the entry must stay in
    /// the sparsity pattern.
    fn try_identity(
        &self,
        op: OpCode,
        arg0: u32,
        arg1: u32,
        arg0_const: bool,
        arg1_const: bool,
    ) -> Option<u32> {
        let zero = F::zero();
        let one = F::one();
        let c0 = self.values[arg0 as usize];
        let c1 = self.values[arg1 as usize];
        match op {
            OpCode::Add if arg1_const && c1 == zero => Some(arg0),
            OpCode::Add if arg0_const && c0 == zero => Some(arg1),
            OpCode::Sub if arg1_const && c1 == zero => Some(arg0),
            OpCode::Mul if arg1_const && c1 == one => Some(arg0),
            OpCode::Mul if arg0_const && c0 == one => Some(arg1),
            OpCode::Div if arg1_const && c1 == one => Some(arg0),
            _ => None,
        }
    }

    /// Record a powi operation. The `i32` exponent is stored in `arg_indices[1]`.
    pub(crate) fn push_powi(&mut self, arg0: u32, exp: i32, value: F) -> u32 {
        if self.is_const(arg0) {
            return self.push_const(value);
        }
        if exp == 1 {
            return arg0;
        }
        if exp == -1 {
            return self.push_op(OpCode::Recip, arg0, UNUSED, value);
        }
        self.push_entry(OpCode::Powi, [arg0, opcode::powi_exp_encode(exp)], value)
    }

    pub(crate) fn set_outputs(&mut self, indices: Vec<u32>) {
        self.output_indices = indices;
    }

    /// Identity of this trace.
    #[inline]
    pub fn id(&self) -> TraceId {
        self.id
    }

    /// Number of input variables `n`.
    #[inline]
    pub fn num_inputs(&self) -> usize {
        self.num_inputs as usize
    }

    /// Number of outputs `m`.
    #[inline]
    pub fn num_outputs(&self) -> usize {
        self.output_indices.len()
    }

    /// Number of entries (inputs, constants and operations).
    #[inline]
    pub fn num_ops(&self) -> usize {
        self.opcodes.len()
    }

    /// Output values at the recording point.
    pub fn recorded_outputs(&self) -> Vec<F> {
        self.output_indices
            .iter()
            .map(|&idx| self.values[idx as usize])
            .collect()
    }

    /// Input values at the recording point.
    pub fn recorded_inputs(&self) -> &[F] {
        &self.values[..self.num_inputs as usize]
    }

    /// Check the recording invariants: inputs first, arguments point to
    /// earlier entries, outputs point into the trace.
    #[cfg(any(feature = "serde", test))]
    fn check_structure(&self) -> Result<()> {
        let invalid =
            |msg: String| -> Result<()> { Err(ConfigurationError::InvalidTrace(msg).into()) };
        let len = self.opcodes.len();
        if self.arg_indices.len() != len || self.values.len() != len {
            return invalid(format!(
                "{len} opcodes, {} argument pairs, {} values",
                self.arg_indices.len(),
                self.values.len()
            ));
        }
        let num_inputs = self.num_inputs as usize;
        if num_inputs > len {
            return invalid(format!("{num_inputs} inputs in a trace of {len} entries"));
        }
        for (i, (&op, &[a, b])) in self.opcodes.iter().zip(&self.arg_indices).enumerate() {
            match op {
                OpCode::Input if i < num_inputs => {}
                OpCode::Input => return invalid(format!("input at entry {i} follows an operation")),
                _ if i < num_inputs => return invalid(format!("entry {i} must be an input")),
                OpCode::Const => {}
                _ => {
                    let b_ok = op == OpCode::Powi || b == UNUSED || (b as usize) < i;
                    if (a as usize) >= i || !b_ok {
                        return invalid(format!(
                            "entry {i} reads arguments ({a}, {b}) not yet recorded"
                        ));
                    }
                }
            }
        }
        if let Some(&o) = self.output_indices.iter().find(|&&o| o as usize >= len) {
            return invalid(format!("output index {o} outside a trace of {len} entries"));
        }
        Ok(())
    }

    /// Fail with [`ConfigurationError::StaleTrace`] unless this trace has id `expected`.
    pub fn check_id(&self, expected: TraceId) -> Result<()> {
        if self.id != expected {
            return Err(ConfigurationError::StaleTrace {
                expected,
                actual: self.id,
            }
            .into());
        }
        Ok(())
    }

    /// Second operand of entry `i` as seen by [`opcode::eval_forward`], read
    /// from `values`.
    #[inline]
    pub(crate) fn operand_b(&self, op: OpCode, b_idx: u32, values: &[F]) -> F {
        if op == OpCode::Powi {
            opcode::powi_operand(b_idx)
        } else if b_idx != UNUSED {
            values[b_idx as usize]
        } else {
            F::zero()
        }
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct TraceData<F> {
    opcodes: Vec<OpCode>,
    arg_indices: Vec<[u32; 2]>,
    values: Vec<F>,
    num_inputs: u32,
    output_indices: Vec<u32>,
}

#[cfg(feature = "serde")]
impl<F: Float> TryFrom<TraceData<F>> for Trace<F> {
    type Error = crate::Error;

    fn try_from(data: TraceData<F>) -> Result<Self> {
        let trace = Trace {
            id: TraceId::next(),
            opcodes: data.opcodes,
            arg_indices: data.arg_indices,
            values: data.values,
            num_inputs: data.num_inputs,
            output_indices: data.output_indices,
        };
        trace.check_structure()?;
        Ok(trace)
    }
}
