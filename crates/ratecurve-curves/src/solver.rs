//! Nonlinear least-squares calibration of a discount curve's node values
//! against market swap par rates.

use std::fmt;

use nalgebra::{DMatrix, DVector};
use ratecurve_core::Date;
use ratecurve_math::dual::Dual;
use ratecurve_math::interpolation::Interpolation;
use ratecurve_math::linear_algebra::solve_linear_system;
use rayon::prelude::*;

use crate::config::{Algorithm, CalibrationConfig};
use crate::curve::Curve;
use crate::error::{CurveError, CurveResult};
use crate::swap::Swap;

/// The Levenberg-Marquardt damping factor's starting value.
const INITIAL_LAMBDA: f64 = 1000.0;

/// Seeds the "previous objective" before the first iteration so the very
/// first Levenberg-Marquardt step halves `lambda` unconditionally, matching
/// an unconditional improvement on the first damped step rather than
/// skipping the lambda update entirely.
const INITIAL_OBJECTIVE_SENTINEL: f64 = 1e10;

/// The central-difference step used by [`SolvedCurve::sensitivity`].
const SENSITIVITY_DS: f64 = 1e-2;

/// Why a calibration loop stopped. This is a status, never an exception:
/// exhausting the iteration budget without converging is a normal outcome,
/// not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The objective decreased between iterations by less than `tol`.
    Converged {
        /// Number of iterations run before the stop criterion was met.
        iterations: usize,
    },
    /// `max_iter` iterations ran without meeting the stop criterion.
    MaxIterationsReached {
        /// The exhausted iteration budget.
        iterations: usize,
    },
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Converged { iterations } => {
                write!(f, "converged after {iterations} iteration(s)")
            }
            Termination::MaxIterationsReached { iterations } => {
                write!(f, "max iterations ({iterations}) reached without convergence")
            }
        }
    }
}

/// Builds a `Curve<Dual>` from node dates and free node values `v`: node 0 is
/// the fixed anchor (`Dual::constant(1.0)`), and `v[i]` becomes node `i+1`,
/// tagged as a free variable with a unit self-partial (`v{i+1}` in the node
/// indexing convention used throughout this module).
///
/// # Errors
/// Propagates [`CurveError`] if the resulting node table is invalid.
pub(crate) fn build_dual_curve(
    dates: &[Date],
    interpolation: Interpolation,
    v: &[f64],
) -> CurveResult<Curve<Dual>> {
    let mut nodes = Vec::with_capacity(dates.len());
    nodes.push((dates[0], Dual::constant(1.0)));
    for (i, &value) in v.iter().enumerate() {
        nodes.push((dates[i + 1], Dual::variable((i + 1) as u32, value)));
    }
    Curve::new(nodes, interpolation)
}

/// Runs the calibration loop against an arbitrary `rates_fn`: given the
/// current free node values, it must return the model rate (with node-value
/// sensitivity partials intact) of every calibrating instrument.
///
/// This is the shared core behind both [`Solver::iterate`] (which prices
/// through a plain [`Curve`]) and [`crate::advanced::AdvancedCurve::solve`]
/// (which prices through the B-spline-wrapped curve instead) — the update
/// rules and stopping criterion are identical either way.
///
/// # Errors
/// Propagates any error `rates_fn` or the linear solve raises.
pub(crate) fn resolve_with<F>(
    mut rates_fn: F,
    quotes: &[f64],
    weights: Option<&[f64]>,
    algorithm: Algorithm,
    max_iter: usize,
    tol: f64,
    mut v: Vec<f64>,
) -> CurveResult<(Vec<f64>, Vec<f64>, Termination)>
where
    F: FnMut(&[f64]) -> CurveResult<Vec<Dual>>,
{
    let n = v.len();
    let m = quotes.len();
    let w: Vec<f64> = weights.map(<[f64]>::to_vec).unwrap_or_else(|| vec![1.0; m]);
    let weight_diag = DMatrix::from_diagonal(&DVector::from_row_slice(&w));

    let mut lambda = INITIAL_LAMBDA;
    let mut last_f: f64 = INITIAL_OBJECTIVE_SENTINEL;
    let mut f_history = Vec::with_capacity(max_iter.min(256));
    let mut termination = Termination::MaxIterationsReached {
        iterations: max_iter,
    };

    for iter in 0..max_iter {
        let r = rates_fn(&v)?;
        let x: Vec<Dual> = r
            .into_iter()
            .zip(quotes)
            .map(|(ri, &si)| ri - Dual::constant(si))
            .collect();

        let f = x
            .iter()
            .zip(&w)
            .fold(Dual::constant(0.0), |acc, (xi, &wi)| {
                acc + xi.clone() * xi.clone() * Dual::constant(wi)
            });
        f_history.push(f.real);

        log::trace!("iteration {iter}: f={:.6e} lambda={lambda:.3e}", f.real);

        if f.real < last_f && (last_f - f.real) < tol {
            termination = Termination::Converged {
                iterations: iter + 1,
            };
            break;
        }

        if algorithm == Algorithm::LevenbergMarquardt {
            lambda *= if f.real > last_f { 2.0 } else { 0.5 };
        }
        last_f = f.real;

        let grad_v_f = DVector::from_iterator(n, (1..=n as u32).map(|id| f.partial(id)));
        let mut jacobian = DMatrix::zeros(n, m);
        for (j, xi) in x.iter().enumerate() {
            for i in 0..n {
                jacobian[(i, j)] = xi.partial((i + 1) as u32);
            }
        }
        let residual = DVector::from_iterator(m, x.iter().map(|xi| xi.real));

        let delta = match algorithm {
            Algorithm::GradientDescent => {
                let y = jacobian.transpose() * &grad_v_f;
                let denom = y.dot(&y);
                let alpha = if denom.abs() < f64::EPSILON {
                    0.0
                } else {
                    y.dot(&residual) / denom
                };
                grad_v_f.clone() * -alpha
            }
            Algorithm::GaussNewton => {
                let normal = &jacobian * &weight_diag * jacobian.transpose();
                let rhs = &grad_v_f * -0.5;
                solve_linear_system(&normal, &rhs)?
            }
            Algorithm::LevenbergMarquardt => {
                let mut normal = &jacobian * &weight_diag * jacobian.transpose();
                for i in 0..n {
                    normal[(i, i)] += lambda;
                }
                let rhs = &grad_v_f * -0.5;
                solve_linear_system(&normal, &rhs)?
            }
        };

        for i in 0..n {
            v[i] += delta[i];
        }
    }

    log::debug!("solver terminated: {termination}");
    Ok((v, f_history, termination))
}

/// Calibrates a curve's free node values against market swap par rates.
///
/// Represents the `Iterating` state of the curve calibration lifecycle: it
/// borrows the calibrating instruments for the duration of
/// [`Solver::iterate`] and is consumed by it, producing a [`SolvedCurve`]
/// (`Converged` or `MaxIter`).
#[derive(Debug, Clone)]
pub struct Solver {
    dates: Vec<Date>,
    interpolation: Interpolation,
    quotes: Vec<f64>,
    weights: Option<Vec<f64>>,
    algorithm: Algorithm,
    max_iter: usize,
    tol: f64,
    v: Vec<f64>,
}

impl Solver {
    /// Builds a solver from an initial curve, target quotes, and a
    /// configuration.
    ///
    /// # Errors
    /// Returns [`CurveError::Dimension`] if the number of free node values
    /// doesn't equal the number of quotes — the `J·(W·Jᵀ)` normal-equations
    /// dimensioning used below is only well-posed for the square case — or
    /// if `weights` has the wrong length.
    pub fn new(
        initial: &Curve<f64>,
        quotes: Vec<f64>,
        config: &CalibrationConfig,
    ) -> CurveResult<Self> {
        let n = initial.dof_count();
        let m = quotes.len();
        if n != m {
            return Err(CurveError::dimension(n, m));
        }
        if let Some(w) = &config.weights {
            if w.len() != m {
                return Err(CurveError::dimension(w.len(), m));
            }
        }
        let dates: Vec<Date> = initial.nodes().iter().map(|(d, _)| *d).collect();
        let v: Vec<f64> = initial.nodes()[1..].iter().map(|(_, y)| *y).collect();
        Ok(Self {
            dates,
            interpolation: initial.interpolation(),
            quotes,
            weights: config.weights.clone(),
            algorithm: config.algorithm,
            max_iter: config.max_iter,
            tol: config.tol,
            v,
        })
    }

    /// Runs the calibration loop to termination against `instruments` and
    /// returns the solved curve.
    ///
    /// # Errors
    /// Propagates pricing or linear-algebra errors from an iteration step.
    pub fn iterate(self, instruments: &[Swap]) -> CurveResult<SolvedCurve> {
        let dates = self.dates.clone();
        let interpolation = self.interpolation;
        let (v_final, f_history, termination) = resolve_with(
            |v: &[f64]| -> CurveResult<Vec<Dual>> {
                let curve = build_dual_curve(&dates, interpolation, v)?;
                instruments.iter().map(|s| s.rate(&curve)).collect()
            },
            &self.quotes,
            self.weights.as_deref(),
            self.algorithm,
            self.max_iter,
            self.tol,
            self.v,
        )?;

        let curve = build_dual_curve(&self.dates, self.interpolation, &v_final)?;
        Ok(SolvedCurve {
            curve,
            quotes: self.quotes,
            weights: self.weights,
            max_iter: self.max_iter,
            tol: self.tol,
            termination,
            f_history,
            sensitivity: None,
        })
    }
}

/// The result of a converged (or iteration-exhausted) calibration run.
///
/// This is the `Converged`/`MaxIter` state of the curve calibration
/// lifecycle — the only state from which [`SolvedCurve::sensitivity`] is
/// reachable.
#[derive(Debug, Clone)]
pub struct SolvedCurve {
    curve: Curve<Dual>,
    quotes: Vec<f64>,
    weights: Option<Vec<f64>>,
    max_iter: usize,
    tol: f64,
    termination: Termination,
    f_history: Vec<f64>,
    sensitivity: Option<DMatrix<f64>>,
}

impl SolvedCurve {
    /// The solved curve. Node values are still `Dual`, carrying sensitivity
    /// partials with respect to every node's own id.
    #[must_use]
    pub fn curve(&self) -> &Curve<Dual> {
        &self.curve
    }

    /// Why the calibration loop stopped.
    #[must_use]
    pub fn termination(&self) -> Termination {
        self.termination
    }

    /// The objective value `f.real` recorded at each iteration, for
    /// diagnosing a `MaxIterationsReached` run.
    #[must_use]
    pub fn f_history(&self) -> &[f64] {
        &self.f_history
    }

    /// The calibrating quotes this curve was solved against.
    #[must_use]
    pub fn quotes(&self) -> &[f64] {
        &self.quotes
    }

    /// The per-quote weights this curve was solved against, if any.
    #[must_use]
    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    /// The iteration budget this curve was solved under.
    #[must_use]
    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    /// The convergence tolerance this curve was solved under.
    #[must_use]
    pub fn tol(&self) -> f64 {
        self.tol
    }

    /// The already-computed `∂v/∂s` cache, if [`SolvedCurve::sensitivity`]
    /// has been called.
    #[must_use]
    pub fn sensitivity_cached(&self) -> Option<&DMatrix<f64>> {
        self.sensitivity.as_ref()
    }

    /// Computes (caching the result) `∂v/∂s ∈ ℝᵐˣⁿ` by central differences:
    /// re-solve (via Gauss-Newton, from the already-converged node values)
    /// under each quote bumped by `±ds = 1e-2` in turn.
    ///
    /// Rows are computed in parallel over quote index — each an
    /// independent inner calibration against its own copy of the node
    /// table and solver state.
    ///
    /// # Errors
    /// Propagates any [`CurveError`] from an inner re-solve.
    pub fn sensitivity(&mut self, instruments: &[Swap]) -> CurveResult<&DMatrix<f64>> {
        if self.sensitivity.is_none() {
            let computed = self.compute_sensitivity(instruments)?;
            self.sensitivity = Some(computed);
        }
        Ok(self.sensitivity.as_ref().unwrap())
    }

    fn compute_sensitivity(&self, instruments: &[Swap]) -> CurveResult<DMatrix<f64>> {
        let m = self.quotes.len();
        let n = self.curve.dof_count();
        let dates: Vec<Date> = self.curve.nodes().iter().map(|(d, _)| *d).collect();
        let interpolation = self.curve.interpolation();
        let v0: Vec<f64> = self.curve.nodes()[1..].iter().map(|(_, y)| y.real).collect();

        let rows: Vec<CurveResult<Vec<f64>>> = (0..m)
            .into_par_iter()
            .map(|j| {
                let mut s_plus = self.quotes.clone();
                s_plus[j] += SENSITIVITY_DS;
                let mut s_minus = self.quotes.clone();
                s_minus[j] -= SENSITIVITY_DS;

                let (v_plus, _, _) = resolve_with(
                    |v: &[f64]| -> CurveResult<Vec<Dual>> {
                        let curve = build_dual_curve(&dates, interpolation, v)?;
                        instruments.iter().map(|s| s.rate(&curve)).collect()
                    },
                    &s_plus,
                    self.weights.as_deref(),
                    Algorithm::GaussNewton,
                    self.max_iter,
                    self.tol,
                    v0.clone(),
                )?;
                let (v_minus, _, _) = resolve_with(
                    |v: &[f64]| -> CurveResult<Vec<Dual>> {
                        let curve = build_dual_curve(&dates, interpolation, v)?;
                        instruments.iter().map(|s| s.rate(&curve)).collect()
                    },
                    &s_minus,
                    self.weights.as_deref(),
                    Algorithm::GaussNewton,
                    self.max_iter,
                    self.tol,
                    v0.clone(),
                )?;

                log::debug!("sensitivity row {j}/{m} complete");
                Ok((0..n)
                    .map(|i| (v_plus[i] - v_minus[i]) / (2.0 * SENSITIVITY_DS))
                    .collect())
            })
            .collect();

        let mut matrix = DMatrix::zeros(m, n);
        for (j, row) in rows.into_iter().enumerate() {
            let row = row?;
            for (i, value) in row.into_iter().enumerate() {
                matrix[(j, i)] = value;
            }
        }
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::PeriodUnit;
    use approx::assert_relative_eq;
    use ratecurve_math::interpolation::Interpolation;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    fn single_swap_setup(algorithm: Algorithm) -> (Curve<f64>, Vec<Swap>, Vec<f64>) {
        let t0 = date(2024, 1, 2);
        let t1 = date(2025, 1, 2);
        let initial = Curve::new(vec![(t0, 1.0), (t1, 0.99)], Interpolation::LogLinear).unwrap();
        let swap = Swap::new(t0, 12, 12, 12, PeriodUnit::Months, 1_000_000.0).unwrap();
        let _ = algorithm;
        (initial, vec![swap], vec![5.0])
    }

    #[test]
    fn single_swap_calibration_hits_the_quote() {
        let (initial, instruments, quotes) = single_swap_setup(Algorithm::GaussNewton);
        let config = CalibrationConfig::new(Interpolation::LogLinear, Algorithm::GaussNewton);
        let solver = Solver::new(&initial, quotes.clone(), &config).unwrap();
        let solved = solver.iterate(&instruments).unwrap();

        assert!(matches!(solved.termination(), Termination::Converged { .. }));
        let rate = instruments[0].rate(solved.curve()).unwrap();
        assert_relative_eq!(rate.real, quotes[0], epsilon = 1e-4);
        assert!(*solved.f_history().last().unwrap() < 1e-10 + 1e-12);
    }

    #[test]
    fn three_algorithms_agree_on_node_values() {
        let mut finals = Vec::new();
        for algorithm in [
            Algorithm::GradientDescent,
            Algorithm::GaussNewton,
            Algorithm::LevenbergMarquardt,
        ] {
            let (initial, instruments, quotes) = single_swap_setup(algorithm);
            let config =
                CalibrationConfig::new(Interpolation::LogLinear, algorithm).with_max_iter(5000);
            let solver = Solver::new(&initial, quotes, &config).unwrap();
            let solved = solver.iterate(&instruments).unwrap();
            let v1 = solved.curve().nodes()[1].1.real;
            finals.push(v1);
        }
        for pair in finals.windows(2) {
            assert_relative_eq!(pair[0], pair[1], epsilon = 1e-4);
        }
    }

    #[test]
    fn node_zero_is_never_mutated() {
        let (initial, instruments, quotes) = single_swap_setup(Algorithm::GaussNewton);
        let config = CalibrationConfig::new(Interpolation::LogLinear, Algorithm::GaussNewton);
        let solver = Solver::new(&initial, quotes, &config).unwrap();
        let solved = solver.iterate(&instruments).unwrap();
        assert_relative_eq!(solved.curve().nodes()[0].1.real, 1.0);
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let t0 = date(2024, 1, 2);
        let t1 = date(2025, 1, 2);
        let t2 = date(2026, 1, 2);
        let initial = Curve::new(
            vec![(t0, 1.0), (t1, 0.99), (t2, 0.97)],
            Interpolation::LogLinear,
        )
        .unwrap();
        let config = CalibrationConfig::new(Interpolation::LogLinear, Algorithm::GaussNewton);
        let result = Solver::new(&initial, vec![5.0], &config);
        assert!(matches!(result, Err(CurveError::Dimension { n: 2, m: 1 })));
    }

    #[test]
    fn sensitivity_matches_analytic_inverse_for_a_quadratic_objective() {
        // For a single swap/single node, the implicit function theorem
        // gives an analytic ∂v/∂s of
        // `1 / (dr/dv)` at the solution, which the central difference
        // should match closely for ds = 1e-2.
        let (initial, instruments, quotes) = single_swap_setup(Algorithm::GaussNewton);
        let config = CalibrationConfig::new(Interpolation::LogLinear, Algorithm::GaussNewton);
        let solver = Solver::new(&initial, quotes, &config).unwrap();
        let mut solved = solver.iterate(&instruments).unwrap();

        let sensitivity = solved.sensitivity(&instruments).unwrap().clone();
        let dr_dv = instruments[0].rate(solved.curve()).unwrap().partial(1);
        let analytic = 1.0 / dr_dv;
        assert_relative_eq!(sensitivity[(0, 0)], analytic, epsilon = 1e-3);
    }
}
