//! Forward-mode automatic differentiation via sparse first-order dual numbers.
//!
//! Unlike a single-epsilon dual number (one directional derivative per
//! value), [`Dual`] tracks a partial derivative per independent node id, so
//! a single forward pass through the curve/pricing code yields the full
//! gradient with respect to every calibration node simultaneously.

use crate::error::{MathError, MathResult};
use std::collections::BTreeMap;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A real number carrying a sparse vector of first-order partial derivatives,
/// indexed by small integer node ids.
///
/// A missing entry in `partials` means the partial derivative with respect
/// to that node is zero. Two `Dual`s combine by merging their partial maps
/// key-by-key, so the cost of an operation is proportional to the number of
/// nonzero partials involved, not the total number of nodes in a curve.
#[derive(Debug, Clone)]
pub struct Dual {
    /// The real-valued part.
    pub real: f64,
    /// Nonzero partial derivatives, keyed by node id.
    pub partials: BTreeMap<u32, f64>,
}

impl Dual {
    /// Creates a constant with no partial derivatives.
    #[must_use]
    pub fn constant(real: f64) -> Self {
        Self {
            real,
            partials: BTreeMap::new(),
        }
    }

    /// Creates a free variable: real value `real`, with a unit partial
    /// derivative with respect to its own node id.
    #[must_use]
    pub fn variable(node: u32, real: f64) -> Self {
        let mut partials = BTreeMap::new();
        partials.insert(node, 1.0);
        Self { real, partials }
    }

    /// Returns the partial derivative with respect to `node`, or `0.0` if
    /// this value does not depend on it.
    #[must_use]
    pub fn partial(&self, node: u32) -> f64 {
        self.partials.get(&node).copied().unwrap_or(0.0)
    }

    /// Natural exponential. Never fails; overflow propagates as `f64::INFINITY`.
    #[must_use]
    pub fn exp(&self) -> Self {
        let real = self.real.exp();
        let partials = self
            .partials
            .iter()
            .map(|(&k, &v)| (k, v * real))
            .collect();
        Self { real, partials }
    }

    /// Natural logarithm.
    ///
    /// # Errors
    ///
    /// Returns [`MathError::Domain`] if `real <= 0.0`.
    pub fn log(&self) -> MathResult<Self> {
        if self.real <= 0.0 {
            return Err(MathError::domain(format!(
                "log of non-positive value {}",
                self.real
            )));
        }
        let real = self.real.ln();
        let partials = self
            .partials
            .iter()
            .map(|(&k, &v)| (k, v / self.real))
            .collect();
        Ok(Self { real, partials })
    }

    /// Raises this value to an integer power: `d/dk (a^n) = n a^(n-1) a'_k`.
    ///
    /// Unlike [`Dual::powf`], this is defined for negative or zero `real`
    /// (any power a real `f64` would accept), since it never routes through
    /// `log`.
    #[must_use]
    pub fn powi(&self, n: i32) -> Self {
        let real = self.real.powi(n);
        let deriv = f64::from(n) * self.real.powi(n - 1);
        let partials = self.partials.iter().map(|(&k, &v)| (k, v * deriv)).collect();
        Self { real, partials }
    }

    /// Raises this value to a (possibly non-integer, possibly dual) power
    /// via `a^b = exp(b * log(a))`.
    ///
    /// # Errors
    ///
    /// Returns [`MathError::Domain`] if `self.real <= 0.0`.
    pub fn powf(&self, exponent: &Self) -> MathResult<Self> {
        Ok((exponent.clone() * self.log()?).exp())
    }

    fn combine(
        &self,
        other: &Self,
        f: impl Fn(f64, f64) -> f64,
        df_da: impl Fn(f64, f64) -> f64,
        df_db: impl Fn(f64, f64) -> f64,
    ) -> Self {
        let real = f(self.real, other.real);
        let mut partials = BTreeMap::new();
        let da = df_da(self.real, other.real);
        let db = df_db(self.real, other.real);
        for (&k, &v) in &self.partials {
            *partials.entry(k).or_insert(0.0) += v * da;
        }
        for (&k, &v) in &other.partials {
            *partials.entry(k).or_insert(0.0) += v * db;
        }
        partials.retain(|_, v| *v != 0.0);
        Self { real, partials }
    }
}

impl From<f64> for Dual {
    fn from(real: f64) -> Self {
        Dual::constant(real)
    }
}

impl Add for Dual {
    type Output = Dual;
    fn add(self, rhs: Dual) -> Dual {
        self.combine(&rhs, |a, b| a + b, |_, _| 1.0, |_, _| 1.0)
    }
}

impl Sub for Dual {
    type Output = Dual;
    fn sub(self, rhs: Dual) -> Dual {
        self.combine(&rhs, |a, b| a - b, |_, _| 1.0, |_, _| -1.0)
    }
}

impl Mul for Dual {
    type Output = Dual;
    fn mul(self, rhs: Dual) -> Dual {
        self.combine(&rhs, |a, b| a * b, |_, b| b, |a, _| a)
    }
}

impl Div for Dual {
    type Output = Dual;
    fn div(self, rhs: Dual) -> Dual {
        self.combine(
            &rhs,
            |a, b| a / b,
            |_, b| 1.0 / b,
            |a, b| -a / (b * b),
        )
    }
}

impl Neg for Dual {
    type Output = Dual;
    fn neg(self) -> Dual {
        let partials = self.partials.iter().map(|(&k, &v)| (k, -v)).collect();
        Dual {
            real: -self.real,
            partials,
        }
    }
}

macro_rules! impl_ref_binop {
    ($trait:ident, $method:ident) => {
        impl $trait<&Dual> for &Dual {
            type Output = Dual;
            fn $method(self, rhs: &Dual) -> Dual {
                self.clone().$method(rhs.clone())
            }
        }
        impl $trait<Dual> for &Dual {
            type Output = Dual;
            fn $method(self, rhs: Dual) -> Dual {
                self.clone().$method(rhs)
            }
        }
        impl $trait<&Dual> for Dual {
            type Output = Dual;
            fn $method(self, rhs: &Dual) -> Dual {
                self.$method(rhs.clone())
            }
        }
    };
}

impl_ref_binop!(Add, add);
impl_ref_binop!(Sub, sub);
impl_ref_binop!(Mul, mul);
impl_ref_binop!(Div, div);

/// Equality and ordering compare the real component only, ignoring
/// partials.
impl PartialEq for Dual {
    fn eq(&self, other: &Self) -> bool {
        self.real == other.real
    }
}

impl PartialOrd for Dual {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.real.partial_cmp(&other.real)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn constant_has_no_partials() {
        let c = Dual::constant(5.0);
        assert_eq!(c.partial(0), 0.0);
    }

    #[test]
    fn variable_has_unit_self_partial() {
        let v = Dual::variable(3, 2.0);
        assert_relative_eq!(v.partial(3), 1.0);
        assert_relative_eq!(v.partial(4), 0.0);
    }

    #[test]
    fn product_rule() {
        let a = Dual::variable(1, 3.0);
        let b = Dual::variable(2, 4.0);
        let p = a * b;
        assert_relative_eq!(p.real, 12.0);
        assert_relative_eq!(p.partial(1), 4.0);
        assert_relative_eq!(p.partial(2), 3.0);
    }

    #[test]
    fn quotient_rule() {
        let a = Dual::variable(1, 6.0);
        let b = Dual::variable(2, 2.0);
        let q = a / b;
        assert_relative_eq!(q.real, 3.0);
        assert_relative_eq!(q.partial(1), 0.5);
        assert_relative_eq!(q.partial(2), -1.5);
    }

    #[test]
    fn powi_matches_the_power_rule() {
        let x = Dual::variable(1, 3.0);
        let cubed = x.powi(3);
        assert_relative_eq!(cubed.real, 27.0);
        assert_relative_eq!(cubed.partial(1), 27.0); // 3 * 3^2
    }

    #[test]
    fn powf_agrees_with_powi_for_integer_exponents() {
        let x = Dual::variable(1, 2.0);
        let via_powf = x.powf(&Dual::constant(3.0)).unwrap();
        let via_powi = x.powi(3);
        assert_relative_eq!(via_powf.real, via_powi.real, epsilon = 1e-12);
        assert_relative_eq!(via_powf.partial(1), via_powi.partial(1), epsilon = 1e-12);
    }

    #[test]
    fn log_exp_are_inverse() {
        let x = Dual::variable(1, 2.5);
        let back = x.log().unwrap().exp();
        assert_relative_eq!(back.real, 2.5, epsilon = 1e-12);
        assert_relative_eq!(back.partial(1), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn log_of_nonpositive_is_domain_error() {
        let x = Dual::constant(-1.0);
        assert!(matches!(x.log(), Err(MathError::Domain { .. })));
    }

    #[test]
    fn combined_partials_stay_sorted_and_sparse() {
        let a = Dual::variable(5, 1.0);
        let b = Dual::variable(2, 1.0);
        let sum = a + b;
        let keys: Vec<u32> = sum.partials.keys().copied().collect();
        assert_eq!(keys, vec![2, 5]);
    }

    proptest::proptest! {
        #[test]
        fn chain_rule_for_exp_log(x in 0.1f64..50.0) {
            let v = Dual::variable(0, x);
            let round_tripped = v.clone().log().unwrap().exp();
            assert_relative_eq!(round_tripped.real, v.real, epsilon = 1e-9);
            assert_relative_eq!(round_tripped.partial(0), v.partial(0), epsilon = 1e-9);
        }
    }
}
