//! The [`Scalar`] trait for writing recordable numeric code.
//!
//! Functions written as `fn f<T: Scalar>(x: &[T]) -> Vec<T>` evaluate plain
//! `f32`/`f64` values and record traces through [`Active`] with the same body.

use std::fmt::{Debug, Display};

use num_traits::FromPrimitive;

use crate::active::Active;
use crate::float::Float;

/// The central trait for recordable numeric code.
pub trait Scalar:
    num_traits::Float + num_traits::FloatConst + FromPrimitive + Copy + Default + Debug + Display
{
    /// The underlying primitive float type.
    type Float: Float;

    /// Lift a plain float to this scalar (constant, zero derivative).
    fn from_f(val: Self::Float) -> Self;

    /// Lift an `f64` literal. Shorthand for `from_f(Float::from_f64(v))`.
    #[inline]
    fn lit(val: f64) -> Self {
        let v = <Self::Float as FromPrimitive>::from_f64(val)
            .unwrap_or_else(<Self::Float as num_traits::Float>::nan);
        Self::from_f(v)
    }

    /// Extract the primal value.
    fn value(&self) -> Self::Float;
}

impl Scalar for f32 {
    type Float = f32;

    #[inline]
    fn from_f(val: f32) -> Self {
        val
    }

    #[inline]
    fn value(&self) -> f32 {
        *self
    }
}

impl Scalar for f64 {
    type Float = f64;

    #[inline]
    fn from_f(val: f64) -> Self {
        val
    }

    #[inline]
    fn value(&self) -> f64 {
        *self
    }
}

impl<F: Float> Scalar for Active<'_, F> {
    type Float = F;

    #[inline]
    fn from_f(val: F) -> Self {
        Active::constant(val)
    }

    #[inline]
    fn value(&self) -> F {
        self.value
    }
}
