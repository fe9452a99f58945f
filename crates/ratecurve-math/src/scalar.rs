//! Generic numeric abstraction over plain `f64` and [`Dual`] values.
//!
//! Interpolation and curve-lookup code is written once against [`Scalar`]
//! and reused unchanged both at calibration time (where discount factors
//! carry node-sensitivity partials as [`Dual`]) and at pricing-only time
//! (where a [`Curve<f64>`](crate) is queried with no AD overhead).

use crate::dual::Dual;
use crate::error::MathResult;
use std::ops::{Add, Div, Mul, Sub};

/// A scalar type usable inside interpolation and curve arithmetic.
///
/// Implemented for `f64` (plain pricing) and [`Dual`] (calibration, where
/// sensitivities to node values must be propagated through every
/// arithmetic operation).
pub trait Scalar:
    Sized
    + Clone
    + PartialOrd
    + From<f64>
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
{
    /// The real (f64) part of this value, discarding any sensitivities.
    fn real(&self) -> f64;

    /// Natural exponential.
    fn exp(&self) -> Self;

    /// Natural logarithm.
    ///
    /// # Errors
    ///
    /// Returns a domain error if this value is non-positive.
    fn ln(&self) -> MathResult<Self>;
}

impl Scalar for f64 {
    fn real(&self) -> f64 {
        *self
    }

    fn exp(&self) -> Self {
        f64::exp(*self)
    }

    fn ln(&self) -> MathResult<Self> {
        if *self <= 0.0 {
            return Err(crate::error::MathError::domain(format!(
                "log of non-positive value {self}"
            )));
        }
        Ok(f64::ln(*self))
    }
}

impl Scalar for Dual {
    fn real(&self) -> f64 {
        self.real
    }

    fn exp(&self) -> Self {
        Dual::exp(self)
    }

    fn ln(&self) -> MathResult<Self> {
        Dual::log(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generic_affine<S: Scalar>(a: S, b: S, t: f64) -> S {
        a.clone() + (b - a) * S::from(t)
    }

    #[test]
    fn works_for_f64() {
        let out = generic_affine(1.0f64, 3.0f64, 0.5);
        assert_eq!(out, 2.0);
    }

    #[test]
    fn works_for_dual() {
        let a = Dual::variable(1, 1.0);
        let b = Dual::variable(2, 3.0);
        let out = generic_affine(a, b, 0.5);
        assert_eq!(out.real, 2.0);
        assert_eq!(out.partial(1), 0.5);
        assert_eq!(out.partial(2), 0.5);
    }
}
