//! Clamped cubic (degree 3) B-spline fitting and evaluation.
//!
//! Used by the advanced curve variant to smooth log-discount-factors past a
//! given tenor, replacing raw node-to-node interpolation with a fitted
//! spline subject to natural (second-derivative-zero) boundary conditions.
//!
//! Control points are kept as [`Dual`] throughout so that a spline fitted
//! against calibration-time node values (which carry sensitivity partials)
//! evaluates back out with those partials intact — the fit is linear in the
//! input ordinates, so the same real-valued design matrix solves both the
//! real column and every partial column of the right-hand side.

use crate::dual::Dual;
use crate::error::{MathError, MathResult};
use crate::linear_algebra::lu_decomposition;
use nalgebra::{DMatrix, DVector};
use std::collections::BTreeSet;

const DEGREE: usize = 3;
const ORDER: usize = DEGREE + 1;

/// A fitted clamped cubic B-spline over log-discount-factors.
#[derive(Debug, Clone)]
pub struct ClampedCubicBSpline {
    knots: Vec<f64>,
    control_points: Vec<Dual>,
}

impl ClampedCubicBSpline {
    /// Fits a degree-3 B-spline through `(tau[i], y[i])` pairs, clamped at
    /// `t[0]` and `t[t.len() - 1]`, subject to zero second derivative at
    /// both ends (the natural-spline boundary condition).
    ///
    /// `t` gives the interior+boundary knot sequence (strictly increasing,
    /// at least 2 entries); it is internally extended to a clamped knot
    /// vector by repeating the first and last knots `DEGREE` times. The
    /// fit's linear system is square only when `tau` supplies exactly one
    /// sample per resulting basis function minus the two natural-boundary
    /// rows this function inserts itself — in practice `tau` is `t`.
    ///
    /// # Errors
    ///
    /// Returns [`MathError::InsufficientData`] if fewer than `ORDER` control
    /// points would result, or [`MathError::SingularMatrix`] if the fit's
    /// normal system is singular.
    pub fn fit(t: &[f64], tau: &[f64], y: &[Dual]) -> MathResult<Self> {
        if tau.len() != y.len() {
            return Err(MathError::invalid_input(
                "tau and y must have the same length",
            ));
        }
        let knots = clamped_knot_vector(t);
        let n_basis = knots.len() - ORDER;
        if n_basis < ORDER || tau.len() < n_basis {
            return Err(MathError::insufficient_data(n_basis, tau.len()));
        }

        // Interpolation rows: basis functions evaluated at each tau.
        let mut rows: Vec<Vec<f64>> = Vec::with_capacity(tau.len() + 2);
        for &x in tau {
            rows.push(basis_row(&knots, n_basis, x, 0));
        }
        // Natural boundary rows: zero second derivative at both ends.
        rows.insert(0, basis_row(&knots, n_basis, t[0], 2));
        rows.push(basis_row(&knots, n_basis, t[t.len() - 1], 2));

        if rows.len() != n_basis {
            return Err(MathError::invalid_input(format!(
                "fit system has {} equations for {n_basis} unknown control points",
                rows.len()
            )));
        }

        let mut flat = Vec::with_capacity(n_basis * n_basis);
        for row in &rows {
            flat.extend_from_slice(row);
        }
        let design = DMatrix::from_row_slice(n_basis, n_basis, &flat);

        // y supplies interior rows only; boundary rows target 0.
        let mut node_ids: BTreeSet<u32> = BTreeSet::new();
        for value in y {
            node_ids.extend(value.partials.keys().copied());
        }

        let mut rhs_real = vec![0.0; n_basis];
        for (i, value) in y.iter().enumerate() {
            rhs_real[i + 1] = value.real;
        }
        let control_real = solve_design(&design, &rhs_real)?;

        let mut control_points: Vec<Dual> = control_real
            .iter()
            .map(|&r| Dual::constant(r))
            .collect();

        for node in node_ids {
            let mut rhs = vec![0.0; n_basis];
            for (i, value) in y.iter().enumerate() {
                rhs[i + 1] = value.partial(node);
            }
            let column = solve_design(&design, &rhs)?;
            for (cp, partial) in control_points.iter_mut().zip(column.iter()) {
                if *partial != 0.0 {
                    cp.partials.insert(node, *partial);
                }
            }
        }

        Ok(Self {
            knots,
            control_points,
        })
    }

    /// Evaluates the fitted spline at `x`, returning the value with its
    /// sensitivity partials intact.
    #[must_use]
    pub fn evaluate(&self, x: f64) -> Dual {
        let n_basis = self.control_points.len();
        let row = basis_row(&self.knots, n_basis, x, 0);
        let mut acc = Dual::constant(0.0);
        for (coeff, cp) in row.iter().zip(self.control_points.iter()) {
            if *coeff != 0.0 {
                acc = acc + cp.clone() * Dual::constant(*coeff);
            }
        }
        acc
    }
}

fn solve_design(design: &DMatrix<f64>, rhs: &[f64]) -> MathResult<Vec<f64>> {
    let n = design.nrows();
    let b = DVector::from_row_slice(rhs);
    let (l, u) = lu_decomposition(design)?;
    let mut y = DVector::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[(i, j)] * y[j];
        }
        y[i] = sum / l[(i, i)];
    }
    let mut x = DVector::zeros(n);
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in i + 1..n {
            sum -= u[(i, j)] * x[j];
        }
        if u[(i, i)].abs() < 1e-15 {
            return Err(MathError::SingularMatrix);
        }
        x[i] = sum / u[(i, i)];
    }
    Ok(x.iter().copied().collect())
}

fn clamped_knot_vector(t: &[f64]) -> Vec<f64> {
    let mut knots = Vec::with_capacity(t.len() + 2 * DEGREE);
    for _ in 0..DEGREE {
        knots.push(t[0]);
    }
    knots.extend_from_slice(t);
    for _ in 0..DEGREE {
        knots.push(t[t.len() - 1]);
    }
    knots
}

/// Evaluates every basis function (or its `deriv`-th derivative) at `x`,
/// returning a row of length `n_basis`.
fn basis_row(knots: &[f64], n_basis: usize, x: f64, deriv: usize) -> Vec<f64> {
    (0..n_basis)
        .map(|i| {
            if deriv == 0 {
                basis_value(knots, i, DEGREE, x)
            } else {
                basis_derivative(knots, i, DEGREE, x, deriv)
            }
        })
        .collect()
}

/// Cox-de Boor recursion for the `i`-th basis function of degree `k`.
fn basis_value(knots: &[f64], i: usize, k: usize, x: f64) -> f64 {
    if k == 0 {
        let lo = knots[i];
        let hi = knots[i + 1];
        return if (x >= lo && x < hi) || (hi == *knots.last().unwrap() && x == hi) {
            1.0
        } else {
            0.0
        };
    }
    let denom_a = knots[i + k] - knots[i];
    let term_a = if denom_a.abs() > 1e-14 {
        (x - knots[i]) / denom_a * basis_value(knots, i, k - 1, x)
    } else {
        0.0
    };
    let denom_b = knots[i + k + 1] - knots[i + 1];
    let term_b = if denom_b.abs() > 1e-14 {
        (knots[i + k + 1] - x) / denom_b * basis_value(knots, i + 1, k - 1, x)
    } else {
        0.0
    };
    term_a + term_b
}

/// `deriv`-th derivative of the `i`-th basis function of degree `k`, via the
/// standard B-spline derivative reduction (each derivative drops the degree
/// by one and rescales by the knot span).
fn basis_derivative(knots: &[f64], i: usize, k: usize, x: f64, deriv: usize) -> f64 {
    if deriv == 0 {
        return basis_value(knots, i, k, x);
    }
    if k == 0 {
        return 0.0;
    }
    let denom_a = knots[i + k] - knots[i];
    let term_a = if denom_a.abs() > 1e-14 {
        k as f64 / denom_a * basis_derivative(knots, i, k - 1, x, deriv - 1)
    } else {
        0.0
    };
    let denom_b = knots[i + k + 1] - knots[i + 1];
    let term_b = if denom_b.abs() > 1e-14 {
        k as f64 / denom_b * basis_derivative(knots, i + 1, k - 1, x, deriv - 1)
    } else {
        0.0
    };
    term_a - term_b
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn fits_a_straight_line_through_interior_points() {
        // `fit`'s linear system is square only when `tau` has exactly as
        // many abscissas as `t` has knots (the two extra rows it inserts
        // are the natural-boundary conditions, not extra samples) — the
        // real call site in `advanced.rs` always passes `tau == t`.
        let t = vec![0.0, 1.0, 2.0, 3.0, 4.0];
        let y: Vec<Dual> = t.iter().map(|&x| Dual::constant(x)).collect();
        let spline = ClampedCubicBSpline::fit(&t, &t, &y).unwrap();
        for &x in &[0.5, 1.5, 2.5, 3.5] {
            assert_relative_eq!(spline.evaluate(x).real, x, epsilon = 1e-6);
        }
    }

    #[test]
    fn propagates_partials_linearly() {
        let t = vec![0.0, 1.0, 2.0, 3.0];
        let y = vec![
            Dual::variable(1, 0.0),
            Dual::variable(1, 1.0) + Dual::variable(2, 0.0),
            Dual::variable(2, 2.0),
            Dual::variable(2, 3.0),
        ];
        let spline = ClampedCubicBSpline::fit(&t, &t, &y).unwrap();
        let at_mid = spline.evaluate(1.5);
        assert!(at_mid.partial(1).abs() + at_mid.partial(2).abs() > 0.0);
    }
}
