//! Elementary operations recorded on a [`Trace`](crate::Trace).
//!
//! Each opcode is evaluated by [`eval_forward`] and differentiated by [`partials`].
//! Both are shared by the primal, tangent and adjoint sweeps so that every sweep
//! applies exactly the same arithmetic.

use crate::float::Float;

/// Sentinel used in `arg_indices[1]` for unary ops (the second argument slot is unused).
pub const UNUSED: u32 = u32::MAX;

/// Elementary operation codes.
///
/// Binary ops use both `arg_indices` slots; unary ops use slot 0 only
/// (slot 1 = [`UNUSED`], except for [`OpCode::Powi`] which stores the `i32`
/// exponent reinterpreted as `u32` in slot 1).
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OpCode {
    // ── Structural ──
    /// Input variable (leaf node).
    Input,
    /// Scalar constant.
    Const,

    // ── Binary arithmetic ──
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Powf,
    Atan2,
    Hypot,
    Max,
    Min,

    // ── Unary ──
    Neg,
    Recip,
    Sqrt,
    Cbrt,
    /// Integer power. Exponent stored in `arg_indices[1]` as `exp as u32`.
    Powi,

    // ── Exp / Log ──
    Exp,
    Exp2,
    ExpM1,
    Ln,
    Log2,
    Log10,
    Ln1p,

    // ── Trig ──
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,

    // ── Hyperbolic ──
    Sinh,
    Cosh,
    Tanh,
    Asinh,
    Acosh,
    Atanh,

    // ── Misc ──
    Abs,
    /// Zero derivative but needed for re-evaluation.
    Signum,
    /// Zero derivative but needed for re-evaluation.
    Floor,
    /// Zero derivative but needed for re-evaluation.
    Ceil,
    /// Zero derivative but needed for re-evaluation.
    Round,
    /// Zero derivative but needed for re-evaluation.
    Trunc,
    Fract,
}

impl OpCode {
    /// True for ops that read both argument slots as tape indices.
    #[inline]
    pub fn is_binary(self) -> bool {
        matches!(
            self,
            OpCode::Add
                | OpCode::Sub
                | OpCode::Mul
                | OpCode::Div
                | OpCode::Rem
                | OpCode::Powf
                | OpCode::Atan2
                | OpCode::Hypot
                | OpCode::Max
                | OpCode::Min
        )
    }

    /// Ops whose derivative is zero wherever it exists.
    #[inline]
    pub fn is_piecewise_constant(self) -> bool {
        matches!(
            self,
            OpCode::Signum | OpCode::Floor | OpCode::Ceil | OpCode::Round | OpCode::Trunc
        )
    }
}

/// Evaluate a single opcode in the forward direction.
///
/// For binary ops, `a` and `b` are the two operand values. For unary ops `b` is
/// ignored, except for [`OpCode::Powi`] where `b` holds the exponent as a float
/// (see [`powi_operand`]).
#[inline]
pub fn eval_forward<T: Float>(op: OpCode, a: T, b: T) -> T {
    match op {
        OpCode::Input | OpCode::Const => {
            unreachable!("Input/Const entries are seeded by the sweep, not re-evaluated")
        }

        // Binary arithmetic
        OpCode::Add => a + b,
        OpCode::Sub => a - b,
        OpCode::Mul => a * b,
        OpCode::Div => a / b,
        OpCode::Rem => a % b,
        OpCode::Powf => a.powf(b),
        OpCode::Atan2 => a.atan2(b),
        OpCode::Hypot => a.hypot(b),
        OpCode::Max => {
            if a >= b {
                a
            } else {
                b
            }
        }
        OpCode::Min => {
            if a <= b {
                a
            } else {
                b
            }
        }

        // Unary
        OpCode::Neg => -a,
        OpCode::Recip => a.recip(),
        OpCode::Sqrt => a.sqrt(),
        OpCode::Cbrt => a.cbrt(),
        OpCode::Powi => a.powi(b.to_i32().unwrap_or(0)),

        // Exp/Log
        OpCode::Exp => a.exp(),
        OpCode::Exp2 => a.exp2(),
        OpCode::ExpM1 => a.exp_m1(),
        OpCode::Ln => a.ln(),
        OpCode::Log2 => a.log2(),
        OpCode::Log10 => a.log10(),
        OpCode::Ln1p => a.ln_1p(),

        // Trig
        OpCode::Sin => a.sin(),
        OpCode::Cos => a.cos(),
        OpCode::Tan => a.tan(),
        OpCode::Asin => a.asin(),
        OpCode::Acos => a.acos(),
        OpCode::Atan => a.atan(),

        // Hyperbolic
        OpCode::Sinh => a.sinh(),
        OpCode::Cosh => a.cosh(),
        OpCode::Tanh => a.tanh(),
        OpCode::Asinh => a.asinh(),
        OpCode::Acosh => a.acosh(),
        OpCode::Atanh => a.atanh(),

        // Misc
        OpCode::Abs => a.abs(),
        OpCode::Signum => a.signum(),
        OpCode::Floor => a.floor(),
        OpCode::Ceil => a.ceil(),
        OpCode::Round => a.round(),
        OpCode::Trunc => a.trunc(),
        OpCode::Fract => a.fract(),
    }
}

/// Partial derivatives of a single opcode.
///
/// Returns `(∂result/∂arg0, ∂result/∂arg1)`. For unary ops the second partial
/// is zero. `a`, `b` are the operand values and `r` is the result value.
#[inline]
pub fn partials<T: Float>(op: OpCode, a: T, b: T, r: T) -> (T, T) {
    let zero = T::zero();
    let one = T::one();
    match op {
        OpCode::Input | OpCode::Const => (zero, zero),

        // Binary
        OpCode::Add => (one, one),
        OpCode::Sub => (one, -one),
        OpCode::Mul => (b, a),
        OpCode::Div => {
            let inv = one / b;
            (inv, -a * inv * inv)
        }
        OpCode::Rem => (one, -(a / b).trunc()),
        OpCode::Powf => {
            // d/da a^b = b * a^(b-1)
            // d/db a^b = a^b * ln(a)
            let da = b * a.powf(b - one);
            let db = if r == zero { zero } else { r * a.ln() };
            (da, db)
        }
        OpCode::Atan2 => {
            // atan2(a, b): d/da = b/(a²+b²), d/db = -a/(a²+b²)
            let denom = a * a + b * b;
            (b / denom, -a / denom)
        }
        OpCode::Hypot => (a / r, b / r),
        OpCode::Max => {
            if a >= b {
                (one, zero)
            } else {
                (zero, one)
            }
        }
        OpCode::Min => {
            if a <= b {
                (one, zero)
            } else {
                (zero, one)
            }
        }

        // Unary
        OpCode::Neg => (-one, zero),
        OpCode::Recip => {
            let inv = one / a;
            (-inv * inv, zero)
        }
        OpCode::Sqrt => {
            let two = one + one;
            (one / (two * r), zero)
        }
        OpCode::Cbrt => {
            let three = one + one + one;
            (one / (three * r * r), zero)
        }
        OpCode::Powi => {
            let n = b.to_i32().unwrap_or(0);
            (b * a.powi(n - 1), zero)
        }

        // Exp/Log
        OpCode::Exp => (r, zero),
        OpCode::Exp2 => (r * T::LN_2(), zero),
        OpCode::ExpM1 => (r + one, zero),
        OpCode::Ln => (one / a, zero),
        OpCode::Log2 => (one / (a * T::LN_2()), zero),
        OpCode::Log10 => (one / (a * T::LN_10()), zero),
        OpCode::Ln1p => (one / (one + a), zero),

        // Trig
        OpCode::Sin => (a.cos(), zero),
        OpCode::Cos => (-a.sin(), zero),
        OpCode::Tan => {
            let c = a.cos();
            (one / (c * c), zero)
        }
        OpCode::Asin => (one / (one - a * a).sqrt(), zero),
        OpCode::Acos => (-one / (one - a * a).sqrt(), zero),
        OpCode::Atan => (one / (one + a * a), zero),

        // Hyperbolic
        OpCode::Sinh => (a.cosh(), zero),
        OpCode::Cosh => (a.sinh(), zero),
        OpCode::Tanh => {
            let c = a.cosh();
            (one / (c * c), zero)
        }
        OpCode::Asinh => (one / (a * a + one).sqrt(), zero),
        OpCode::Acosh => (one / (a * a - one).sqrt(), zero),
        OpCode::Atanh => (one / (one - a * a), zero),

        // Misc
        OpCode::Abs => (a.signum(), zero),
        OpCode::Signum | OpCode::Floor | OpCode::Ceil | OpCode::Round | OpCode::Trunc => {
            (zero, zero)
        }
        OpCode::Fract => (one, zero),
    }
}

/// Encode a `powi` exponent for storage in `arg_indices[1]`.
#[inline]
pub fn powi_exp_encode(exp: i32) -> u32 {
    exp as u32
}

/// Decode a `powi` exponent stored by [`powi_exp_encode`].
#[inline]
pub fn powi_exp_decode(bits: u32) -> i32 {
    bits as i32
}

/// The exponent of a `Powi` slot as a float, the form [`eval_forward`] and
/// [`partials`] expect in their `b` argument.
#[inline]
pub fn powi_operand<T: Float>(bits: u32) -> T {
    T::from_i32(powi_exp_decode(bits)).unwrap_or_else(T::zero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn powi_negative_exponent_survives_f32() {
        let bits = powi_exp_encode(-3);
        let b: f32 = powi_operand(bits);
        assert_eq!(b, -3.0);
        assert_relative_eq!(eval_forward(OpCode::Powi, 2.0_f32, b), 0.125);
        let (da, _) = partials(OpCode::Powi, 2.0_f32, b, 0.125);
        assert_relative_eq!(da, -3.0 / 16.0);
    }

    #[test]
    #[should_panic(expected = "seeded by the sweep")]
    fn leaves_are_not_evaluated() {
        eval_forward(OpCode::Input, 1.0_f64, 0.0);
    }

    #[test]
    fn rem_partial_wrt_divisor() {
        let (da, db) = partials(OpCode::Rem, 7.5_f64, 2.0, 1.5);
        assert_eq!(da, 1.0);
        assert_eq!(db, -3.0);
    }

    #[test]
    fn piecewise_constant_ops_have_zero_partials() {
        for op in [
            OpCode::Signum,
            OpCode::Floor,
            OpCode::Ceil,
            OpCode::Round,
            OpCode::Trunc,
        ] {
            assert!(op.is_piecewise_constant());
            assert_eq!(partials(op, 1.3_f64, 0.0, 1.0), (0.0, 0.0));
        }
    }
}
