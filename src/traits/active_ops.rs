//! `std::ops` implementations for [`Active<F>`].
//!
//! Each operator records an opcode on the operand's recorder, or folds to a
//! constant when both operands are constants.

use std::ops::{
    Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Rem, RemAssign, Sub, SubAssign,
};

use crate::active::Active;
use crate::float::Float;
use crate::opcode::OpCode;

// ──────────────────────────────────────────────
//  Active<F> ↔ Active<F> operators
// ──────────────────────────────────────────────

impl<F: Float> Add for Active<'_, F> {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        self.binary(rhs, OpCode::Add, self.value + rhs.value)
    }
}

impl<F: Float> Sub for Active<'_, F> {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        self.binary(rhs, OpCode::Sub, self.value - rhs.value)
    }
}

impl<F: Float> Mul for Active<'_, F> {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        self.binary(rhs, OpCode::Mul, self.value * rhs.value)
    }
}

impl<F: Float> Div for Active<'_, F> {
    type Output = Self;
    #[inline]
    fn div(self, rhs: Self) -> Self {
        self.binary(rhs, OpCode::Div, self.value / rhs.value)
    }
}

impl<F: Float> Rem for Active<'_, F> {
    type Output = Self;
    #[inline]
    fn rem(self, rhs: Self) -> Self {
        self.binary(rhs, OpCode::Rem, self.value % rhs.value)
    }
}

impl<F: Float> Neg for Active<'_, F> {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        self.unary(OpCode::Neg, -self.value)
    }
}

// Assign variants delegate to the binary ops.
impl<F: Float> AddAssign for Active<'_, F> {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<F: Float> SubAssign for Active<'_, F> {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl<F: Float> MulAssign for Active<'_, F> {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl<F: Float> DivAssign for Active<'_, F> {
    #[inline]
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}

impl<F: Float> RemAssign for Active<'_, F> {
    #[inline]
    fn rem_assign(&mut self, rhs: Self) {
        *self = *self % rhs;
    }
}

// ──────────────────────────────────────────────
//  Mixed ops: Active<F> with primitive floats
// ──────────────────────────────────────────────

// The primitive is lifted to a constant; it reaches the trace only if the
// other operand is recorded.
macro_rules! impl_active_scalar_ops {
    ($f:ty, $($trait:ident, $method:ident, $op:expr, $sym:tt);+ $(;)?) => {
        $(
            impl<'r> $trait<$f> for Active<'r, $f> {
                type Output = Active<'r, $f>;
                #[inline]
                fn $method(self, rhs: $f) -> Active<'r, $f> {
                    self.binary(Active::constant(rhs), $op, self.value $sym rhs)
                }
            }

            impl<'r> $trait<Active<'r, $f>> for $f {
                type Output = Active<'r, $f>;
                #[inline]
                fn $method(self, rhs: Active<'r, $f>) -> Active<'r, $f> {
                    Active::constant(self).binary(rhs, $op, self $sym rhs.value)
                }
            }
        )+
    };
}

macro_rules! impl_active_scalar_assign {
    ($f:ty) => {
        impl AddAssign<$f> for Active<'_, $f> {
            #[inline]
            fn add_assign(&mut self, rhs: $f) {
                *self = *self + rhs;
            }
        }

        impl SubAssign<$f> for Active<'_, $f> {
            #[inline]
            fn sub_assign(&mut self, rhs: $f) {
                *self = *self - rhs;
            }
        }

        impl MulAssign<$f> for Active<'_, $f> {
            #[inline]
            fn mul_assign(&mut self, rhs: $f) {
                *self = *self * rhs;
            }
        }

        impl DivAssign<$f> for Active<'_, $f> {
            #[inline]
            fn div_assign(&mut self, rhs: $f) {
                *self = *self / rhs;
            }
        }
    };
}

impl_active_scalar_ops!(
    f32,
    Add, add, OpCode::Add, +;
    Sub, sub, OpCode::Sub, -;
    Mul, mul, OpCode::Mul, *;
    Div, div, OpCode::Div, /;
    Rem, rem, OpCode::Rem, %;
);
impl_active_scalar_ops!(
    f64,
    Add, add, OpCode::Add, +;
    Sub, sub, OpCode::Sub, -;
    Mul, mul, OpCode::Mul, *;
    Div, div, OpCode::Div, /;
    Rem, rem, OpCode::Rem, %;
);
impl_active_scalar_assign!(f32);
impl_active_scalar_assign!(f64);

// ── Comparison ──

impl<F: Float> PartialEq for Active<'_, F> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<F: Float> PartialOrd for Active<'_, F> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.value.partial_cmp(&other.value)
    }
}
