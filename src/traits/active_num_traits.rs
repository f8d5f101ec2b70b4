//! `num_traits` implementations for [`Active<F>`].
//!
//! Every transcendental records one opcode. Composite functions (`log`,
//! `mul_add`, `to_degrees`, ...) are decomposed into recorded primitives.

use std::num::FpCategory;

use num_traits::{
    Float as NumFloat, FloatConst, FromPrimitive, Num, NumCast, One, Signed, ToPrimitive, Zero,
};

use crate::active::Active;
use crate::float::Float;
use crate::opcode::OpCode;

// ══════════════════════════════════════════════
//  Basic numeric traits
// ══════════════════════════════════════════════

impl<F: Float> Zero for Active<'_, F> {
    #[inline]
    fn zero() -> Self {
        Active::constant(F::zero())
    }
    #[inline]
    fn is_zero(&self) -> bool {
        self.value.is_zero()
    }
}

impl<F: Float> One for Active<'_, F> {
    #[inline]
    fn one() -> Self {
        Active::constant(F::one())
    }
}

impl<F: Float> Num for Active<'_, F> {
    type FromStrRadixErr = F::FromStrRadixErr;
    fn from_str_radix(str: &str, radix: u32) -> Result<Self, Self::FromStrRadixErr> {
        F::from_str_radix(str, radix).map(Active::constant)
    }
}

impl<F: Float> FromPrimitive for Active<'_, F> {
    #[inline]
    fn from_i64(n: i64) -> Option<Self> {
        F::from_i64(n).map(Active::constant)
    }
    #[inline]
    fn from_u64(n: u64) -> Option<Self> {
        F::from_u64(n).map(Active::constant)
    }
    #[inline]
    fn from_f32(n: f32) -> Option<Self> {
        F::from_f32(n).map(Active::constant)
    }
    #[inline]
    fn from_f64(n: f64) -> Option<Self> {
        F::from_f64(n).map(Active::constant)
    }
}

impl<F: Float> ToPrimitive for Active<'_, F> {
    #[inline]
    fn to_i64(&self) -> Option<i64> {
        self.value.to_i64()
    }
    #[inline]
    fn to_u64(&self) -> Option<u64> {
        self.value.to_u64()
    }
    #[inline]
    fn to_f32(&self) -> Option<f32> {
        self.value.to_f32()
    }
    #[inline]
    fn to_f64(&self) -> Option<f64> {
        self.value.to_f64()
    }
}

impl<F: Float> NumCast for Active<'_, F> {
    #[inline]
    fn from<T: ToPrimitive>(n: T) -> Option<Self> {
        <F as NumCast>::from(n).map(Active::constant)
    }
}

// ══════════════════════════════════════════════
//  Signed
// ══════════════════════════════════════════════

impl<F: Float> Signed for Active<'_, F> {
    #[inline]
    fn abs(&self) -> Self {
        self.unary(OpCode::Abs, self.value.abs())
    }
    #[inline]
    fn abs_sub(&self, other: &Self) -> Self {
        if self.value > other.value {
            *self - *other
        } else {
            Self::zero()
        }
    }
    #[inline]
    fn signum(&self) -> Self {
        self.unary(OpCode::Signum, self.value.signum())
    }
    #[inline]
    fn is_positive(&self) -> bool {
        self.value.is_sign_positive()
    }
    #[inline]
    fn is_negative(&self) -> bool {
        self.value.is_sign_negative()
    }
}

// ══════════════════════════════════════════════
//  FloatConst
// ══════════════════════════════════════════════

macro_rules! active_float_consts {
    ($($name:ident),+ $(,)?) => {
        impl<F: Float> FloatConst for Active<'_, F> {
            $(
                fn $name() -> Self {
                    Active::constant(F::$name())
                }
            )+
        }
    };
}

active_float_consts!(
    E,
    FRAC_1_PI,
    FRAC_1_SQRT_2,
    FRAC_2_PI,
    FRAC_2_SQRT_PI,
    FRAC_PI_2,
    FRAC_PI_3,
    FRAC_PI_4,
    FRAC_PI_6,
    FRAC_PI_8,
    LN_10,
    LN_2,
    LOG10_E,
    LOG2_E,
    PI,
    SQRT_2,
    TAU,
    LOG10_2,
    LOG2_10,
);

// ══════════════════════════════════════════════
//  Float (num_traits::Float)
// ══════════════════════════════════════════════

impl<F: Float> NumFloat for Active<'_, F> {
    fn nan() -> Self {
        Active::constant(F::nan())
    }
    fn infinity() -> Self {
        Active::constant(F::infinity())
    }
    fn neg_infinity() -> Self {
        Active::constant(F::neg_infinity())
    }
    fn neg_zero() -> Self {
        Active::constant(F::neg_zero())
    }

    fn min_value() -> Self {
        Active::constant(F::min_value())
    }
    fn min_positive_value() -> Self {
        Active::constant(F::min_positive_value())
    }
    fn max_value() -> Self {
        Active::constant(F::max_value())
    }
    fn epsilon() -> Self {
        Active::constant(F::epsilon())
    }

    fn is_nan(self) -> bool {
        self.value.is_nan()
    }
    fn is_infinite(self) -> bool {
        self.value.is_infinite()
    }
    fn is_finite(self) -> bool {
        self.value.is_finite()
    }
    fn is_normal(self) -> bool {
        self.value.is_normal()
    }
    fn is_sign_positive(self) -> bool {
        self.value.is_sign_positive()
    }
    fn is_sign_negative(self) -> bool {
        self.value.is_sign_negative()
    }
    fn classify(self) -> FpCategory {
        self.value.classify()
    }

    // ── Rounding (zero derivative, recorded for re-evaluation) ──

    fn floor(self) -> Self {
        self.unary(OpCode::Floor, self.value.floor())
    }
    fn ceil(self) -> Self {
        self.unary(OpCode::Ceil, self.value.ceil())
    }
    fn round(self) -> Self {
        self.unary(OpCode::Round, self.value.round())
    }
    fn trunc(self) -> Self {
        self.unary(OpCode::Trunc, self.value.trunc())
    }
    fn fract(self) -> Self {
        self.unary(OpCode::Fract, self.value.fract())
    }
    fn abs(self) -> Self {
        self.unary(OpCode::Abs, self.value.abs())
    }
    fn signum(self) -> Self {
        self.unary(OpCode::Signum, self.value.signum())
    }

    fn mul_add(self, a: Self, b: Self) -> Self {
        self * a + b
    }

    fn recip(self) -> Self {
        self.unary(OpCode::Recip, self.value.recip())
    }

    fn powi(self, n: i32) -> Self {
        self.powi_op(n, self.value.powi(n))
    }

    fn powf(self, n: Self) -> Self {
        self.binary(n, OpCode::Powf, self.value.powf(n.value))
    }

    fn sqrt(self) -> Self {
        self.unary(OpCode::Sqrt, self.value.sqrt())
    }
    fn cbrt(self) -> Self {
        self.unary(OpCode::Cbrt, self.value.cbrt())
    }

    fn exp(self) -> Self {
        self.unary(OpCode::Exp, self.value.exp())
    }
    fn exp2(self) -> Self {
        self.unary(OpCode::Exp2, self.value.exp2())
    }
    fn exp_m1(self) -> Self {
        self.unary(OpCode::ExpM1, self.value.exp_m1())
    }
    fn ln(self) -> Self {
        self.unary(OpCode::Ln, self.value.ln())
    }
    fn log2(self) -> Self {
        self.unary(OpCode::Log2, self.value.log2())
    }
    fn log10(self) -> Self {
        self.unary(OpCode::Log10, self.value.log10())
    }
    fn ln_1p(self) -> Self {
        self.unary(OpCode::Ln1p, self.value.ln_1p())
    }
    fn log(self, base: Self) -> Self {
        // log_b(x) = ln(x) / ln(b)
        self.ln() / base.ln()
    }

    fn sin(self) -> Self {
        self.unary(OpCode::Sin, self.value.sin())
    }
    fn cos(self) -> Self {
        self.unary(OpCode::Cos, self.value.cos())
    }
    fn tan(self) -> Self {
        self.unary(OpCode::Tan, self.value.tan())
    }
    fn sin_cos(self) -> (Self, Self) {
        let (s, c) = self.value.sin_cos();
        (self.unary(OpCode::Sin, s), self.unary(OpCode::Cos, c))
    }
    fn asin(self) -> Self {
        self.unary(OpCode::Asin, self.value.asin())
    }
    fn acos(self) -> Self {
        self.unary(OpCode::Acos, self.value.acos())
    }
    fn atan(self) -> Self {
        self.unary(OpCode::Atan, self.value.atan())
    }
    fn atan2(self, other: Self) -> Self {
        self.binary(other, OpCode::Atan2, self.value.atan2(other.value))
    }

    fn sinh(self) -> Self {
        self.unary(OpCode::Sinh, self.value.sinh())
    }
    fn cosh(self) -> Self {
        self.unary(OpCode::Cosh, self.value.cosh())
    }
    fn tanh(self) -> Self {
        self.unary(OpCode::Tanh, self.value.tanh())
    }
    fn asinh(self) -> Self {
        self.unary(OpCode::Asinh, self.value.asinh())
    }
    fn acosh(self) -> Self {
        self.unary(OpCode::Acosh, self.value.acosh())
    }
    fn atanh(self) -> Self {
        self.unary(OpCode::Atanh, self.value.atanh())
    }

    fn hypot(self, other: Self) -> Self {
        self.binary(other, OpCode::Hypot, self.value.hypot(other.value))
    }

    fn max(self, other: Self) -> Self {
        let v = if self.value >= other.value {
            self.value
        } else {
            other.value
        };
        self.binary(other, OpCode::Max, v)
    }

    fn min(self, other: Self) -> Self {
        let v = if self.value <= other.value {
            self.value
        } else {
            other.value
        };
        self.binary(other, OpCode::Min, v)
    }

    fn abs_sub(self, other: Self) -> Self {
        if self.value > other.value {
            self - other
        } else {
            Self::zero()
        }
    }

    fn integer_decode(self) -> (u64, i16, i8) {
        self.value.integer_decode()
    }

    fn to_degrees(self) -> Self {
        let factor = F::one().to_degrees();
        self.binary(Active::constant(factor), OpCode::Mul, self.value.to_degrees())
    }

    fn to_radians(self) -> Self {
        let factor = F::one().to_radians();
        self.binary(Active::constant(factor), OpCode::Mul, self.value.to_radians())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use num_traits::Float;

    use crate::record;

    #[test]
    fn transcendental_derivatives() {
        let x = [0.3_f64, 1.7];
        let (trace, _) = record(
            |v| {
                vec![
                    v[0].sin() * v[1].ln(),
                    v[0].atan2(v[1]),
                    v[1].powi(3),
                    v[1].powf(v[0]),
                ]
            },
            &x,
        );
        let jac = trace.jacobian(&x).unwrap();
        let (a, b) = (x[0], x[1]);
        assert_relative_eq!(jac[0][0], a.cos() * b.ln(), epsilon = 1e-14);
        assert_relative_eq!(jac[0][1], a.sin() / b, epsilon = 1e-14);
        assert_relative_eq!(jac[1][0], b / (a * a + b * b), epsilon = 1e-14);
        assert_relative_eq!(jac[1][1], -a / (a * a + b * b), epsilon = 1e-14);
        assert_relative_eq!(jac[2][1], 3.0 * b * b, epsilon = 1e-13);
        assert_relative_eq!(jac[3][0], b.powf(a) * b.ln(), epsilon = 1e-14);
        assert_relative_eq!(jac[3][1], a * b.powf(a - 1.0), epsilon = 1e-14);
    }
}
