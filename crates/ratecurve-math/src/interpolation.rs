//! The curve interpolation kernel.
//!
//! Dates are passed in as `f64` day-ordinals (days since some fixed
//! epoch — callers in `ratecurve-curves` use `Date::as_naive_date().num_days_from_ce()`
//! cast to `f64`) so that the kernel itself stays generic over [`Scalar`]
//! and has no dependency on a concrete date type.

use crate::error::MathResult;
use crate::scalar::Scalar;
use serde::{Deserialize, Serialize};

/// The three interpolation rules a [`Curve`](crate) node table can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Linear interpolation directly on node values.
    Linear,
    /// Linear interpolation on the logarithm of node values, exponentiated
    /// back (i.e. log-linear on discount factors).
    LogLinear,
    /// Linear interpolation on the continuously-compounded zero rate
    /// implied by each node relative to the curve's anchor date, converted
    /// back to a discount factor.
    LinearZeroRate,
}

/// Interpolates between two curve nodes `(x1, y1)` and `(x2, y2)` at query
/// point `x`, under `rule`. `anchor` is the curve's node-zero date ordinal;
/// it is only consulted by [`Interpolation::LinearZeroRate`].
///
/// # Errors
///
/// Returns a domain error if `rule` is [`Interpolation::LogLinear`] or
/// [`Interpolation::LinearZeroRate`] and a node value is non-positive.
pub fn interpolate<S: Scalar>(
    x: f64,
    x1: f64,
    y1: S,
    x2: f64,
    y2: S,
    rule: Interpolation,
    anchor: f64,
) -> MathResult<S> {
    match rule {
        Interpolation::Linear => Ok(affine(x, x1, y1, x2, y2)),
        Interpolation::LogLinear => {
            let ly1 = y1.ln()?;
            let ly2 = y2.ln()?;
            Ok(affine(x, x1, ly1, x2, ly2).exp())
        }
        Interpolation::LinearZeroRate => {
            const DAYS_PER_YEAR: f64 = 365.0;
            let t2 = (anchor - x2) / DAYS_PER_YEAR;
            let z2 = y2.ln()? * S::from(1.0 / t2);
            let z1 = if (anchor - x1).abs() < f64::EPSILON {
                z2.clone()
            } else {
                let t1 = (anchor - x1) / DAYS_PER_YEAR;
                y1.ln()? * S::from(1.0 / t1)
            };
            let z = affine(x, x1, z1, x2, z2);
            let t = (anchor - x) / DAYS_PER_YEAR;
            Ok((z * S::from(t)).exp())
        }
    }
}

fn affine<S: Scalar>(x: f64, x1: f64, y1: S, x2: f64, y2: S) -> S {
    let weight = (x - x1) / (x2 - x1);
    y1.clone() + (y2 - y1) * S::from(weight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dual::Dual;
    use approx::assert_relative_eq;

    #[test]
    fn linear_is_exact_at_nodes() {
        let y = interpolate(10.0, 0.0, 1.0f64, 10.0, 2.0f64, Interpolation::Linear, 0.0).unwrap();
        assert_relative_eq!(y, 2.0);
        let mid =
            interpolate(5.0, 0.0, 1.0f64, 10.0, 2.0f64, Interpolation::Linear, 0.0).unwrap();
        assert_relative_eq!(mid, 1.5);
    }

    #[test]
    fn log_linear_is_exact_at_nodes() {
        let y0 =
            interpolate(0.0, 0.0, 1.0f64, 10.0, 0.5f64, Interpolation::LogLinear, 0.0).unwrap();
        assert_relative_eq!(y0, 1.0, epsilon = 1e-12);
        let y1 =
            interpolate(10.0, 0.0, 1.0f64, 10.0, 0.5f64, Interpolation::LogLinear, 0.0).unwrap();
        assert_relative_eq!(y1, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn linear_zero_rate_anchor_guard() {
        // Node 1 sits exactly at the anchor date: y1 must collapse to y2's
        // implied zero rate rather than dividing by a zero year fraction.
        let y = interpolate(
            0.0,
            0.0,
            1.0f64,
            365.0,
            0.95f64,
            Interpolation::LinearZeroRate,
            0.0,
        )
        .unwrap();
        assert_relative_eq!(y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn interpolation_is_generic_over_dual() {
        let y1 = Dual::variable(1, 1.0);
        let y2 = Dual::variable(2, 0.5);
        let mid = interpolate(5.0, 0.0, y1, 10.0, y2, Interpolation::LogLinear, 0.0).unwrap();
        assert!(mid.partial(1) > 0.0);
        assert!(mid.partial(2) > 0.0);
    }
}
