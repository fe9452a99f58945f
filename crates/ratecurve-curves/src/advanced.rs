//! The advanced curve variant: a second-stage cubic B-spline smoother
//! applied over a base-solved curve's log-discount-factors, replacing raw
//! interpolation past a client-supplied knot.

use std::fmt;

use nalgebra::DMatrix;
use rayon::prelude::*;

use ratecurve_core::Date;
use ratecurve_math::bspline::ClampedCubicBSpline;
use ratecurve_math::dual::Dual;

use crate::config::{Algorithm, CalibrationConfig};
use crate::curve::{ordinal, Curve, Discount};
use crate::error::{CurveError, CurveResult};
use crate::solver::{build_dual_curve, resolve_with, SolvedCurve, Termination};
use crate::swap::Swap;

/// The central-difference step used by [`AdvancedSolvedCurve::sensitivity`],
/// matching [`crate::solver::SolvedCurve::sensitivity`].
const SENSITIVITY_DS: f64 = 1e-2;

/// A fully-converged plain (non-spline) curve: the only input
/// [`AdvancedCurve::from_base`]/[`AdvancedCurve::solve`] accept.
///
/// A distinct type, rather than a `not_iterated` boolean flag on
/// [`AdvancedCurve`] itself, so "the spline has been initialized from a base
/// solve" is a property of which type a value has, not a runtime flag.
#[derive(Debug, Clone)]
pub struct BaseSolvedCurve(SolvedCurve);

impl From<SolvedCurve> for BaseSolvedCurve {
    fn from(solved: SolvedCurve) -> Self {
        Self(solved)
    }
}

impl BaseSolvedCurve {
    /// The underlying base solve.
    #[must_use]
    pub fn solved(&self) -> &SolvedCurve {
        &self.0
    }
}

/// Fits a spline over `(tau, y)` samples taken at `knots`: `tau` is each
/// knot's day ordinal, `y` is the log-discount-factor there. The two
/// natural-boundary rows are added internally by
/// [`ClampedCubicBSpline::fit`], so `knots` doubles as both the knot vector
/// `t` and the sample abscissas `tau`.
fn fit_spline(curve: &Curve<Dual>, knots: &[Date]) -> CurveResult<ClampedCubicBSpline> {
    let t: Vec<f64> = knots.iter().map(|&d| ordinal(d)).collect();
    let mut y = Vec::with_capacity(knots.len());
    for &date in knots {
        let df = curve.discount_factor(date)?;
        y.push(df.log()?);
    }
    ClampedCubicBSpline::fit(&t, &t, &y).map_err(Into::into)
}

/// A discount curve whose values past the first interior knot are replaced
/// by a fitted cubic B-spline over log-discount-factors, falling back to the
/// wrapped base curve's ordinary interpolation before that knot.
#[derive(Debug, Clone)]
pub struct AdvancedCurve {
    base: Curve<Dual>,
    spline: ClampedCubicBSpline,
    first_knot: Date,
}

impl AdvancedCurve {
    /// Builds an advanced curve directly from a completed base solve,
    /// fitting the spline over `knots` (strictly increasing, at least two
    /// entries — the first interior knot and the last).
    ///
    /// # Errors
    /// Returns [`CurveError::InvalidData`] if fewer than two knots are
    /// given, or propagates a discount-factor lookup or spline-fit error.
    pub fn from_base(base: &BaseSolvedCurve, knots: Vec<Date>) -> CurveResult<Self> {
        if knots.len() < 2 {
            return Err(CurveError::invalid_data(
                "advanced curve needs at least two knots",
            ));
        }
        let curve = base.solved().curve().clone();
        let spline = fit_spline(&curve, &knots)?;
        Ok(Self {
            base: curve,
            spline,
            first_knot: knots[0],
        })
    }

    /// Re-iterates the calibration under Gauss-Newton through the spline
    /// wrapper: the advanced iterator first runs a full base solve (`base`,
    /// already completed by the
    /// caller), adopts those nodes, then re-iterates under `gauss_newton`
    /// pricing instruments through the spline instead of raw interpolation.
    ///
    /// # Errors
    /// Propagates a pricing, spline-fit, or linear-algebra error from an
    /// iteration step.
    pub fn solve(
        base: BaseSolvedCurve,
        instruments: &[Swap],
        knots: Vec<Date>,
        config: &CalibrationConfig,
    ) -> CurveResult<AdvancedSolvedCurve> {
        if knots.len() < 2 {
            return Err(CurveError::invalid_data(
                "advanced curve needs at least two knots",
            ));
        }
        let solved = base.solved();
        let dates: Vec<Date> = solved.curve().nodes().iter().map(|(d, _)| *d).collect();
        let interpolation = solved.curve().interpolation();
        let quotes = solved.quotes().to_vec();
        let weights = solved.weights().map(<[f64]>::to_vec);
        let v0: Vec<f64> = solved
            .curve()
            .nodes()[1..]
            .iter()
            .map(|(_, y)| y.real)
            .collect();

        let (v_final, f_history, termination) = resolve_with(
            |v: &[f64]| -> CurveResult<Vec<Dual>> {
                let advanced = Self::from_nodes(&dates, interpolation, v, &knots)?;
                instruments.iter().map(|s| s.rate(&advanced)).collect()
            },
            &quotes,
            weights.as_deref(),
            Algorithm::GaussNewton,
            config.max_iter,
            config.tol,
            v0,
        )?;

        let advanced = Self::from_nodes(&dates, interpolation, &v_final, &knots)?;

        Ok(AdvancedSolvedCurve {
            curve: advanced,
            quotes,
            weights,
            max_iter: config.max_iter,
            tol: config.tol,
            termination,
            f_history,
            knots,
            sensitivity: None,
        })
    }

    fn from_nodes(
        dates: &[Date],
        interpolation: ratecurve_math::interpolation::Interpolation,
        v: &[f64],
        knots: &[Date],
    ) -> CurveResult<Self> {
        let curve = build_dual_curve(dates, interpolation, v)?;
        let spline = fit_spline(&curve, knots)?;
        Ok(Self {
            base: curve,
            spline,
            first_knot: knots[0],
        })
    }
}

impl Discount<Dual> for AdvancedCurve {
    /// Returns `exp(spline(x))` for dates past the first interior knot,
    /// otherwise falls back to the wrapped base curve's own interpolation
    /// rule.
    fn discount_factor(&self, date: Date) -> CurveResult<Dual> {
        if date > self.first_knot {
            Ok(self.spline.evaluate(ordinal(date)).exp())
        } else {
            self.base.discount_factor(date)
        }
    }
}

impl fmt::Display for AdvancedCurve {
    /// Renders each base node as `date  discount_factor`, matching
    /// [`Curve`]'s own printable representation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (date, df) in self.base.nodes() {
            writeln!(f, "{date}  {:.6}", df.real)?;
        }
        Ok(())
    }
}

/// The result of re-iterating a base solve through the B-spline wrapper.
///
/// Mirrors [`SolvedCurve`] (the state-machine's `Converged`/`MaxIter` state
/// for the advanced pipeline), with its own independent `∂v/∂s` cache since
/// the spline wrapper changes how a quote perturbation propagates into node
/// values.
#[derive(Debug, Clone)]
pub struct AdvancedSolvedCurve {
    curve: AdvancedCurve,
    quotes: Vec<f64>,
    weights: Option<Vec<f64>>,
    max_iter: usize,
    tol: f64,
    termination: Termination,
    f_history: Vec<f64>,
    knots: Vec<Date>,
    sensitivity: Option<DMatrix<f64>>,
}

impl AdvancedSolvedCurve {
    /// The solved, spline-wrapped curve.
    #[must_use]
    pub fn curve(&self) -> &AdvancedCurve {
        &self.curve
    }

    /// Why the calibration loop stopped.
    #[must_use]
    pub fn termination(&self) -> Termination {
        self.termination
    }

    /// The objective value recorded at each iteration.
    #[must_use]
    pub fn f_history(&self) -> &[f64] {
        &self.f_history
    }

    /// The already-computed `∂v/∂s` cache, if [`AdvancedSolvedCurve::sensitivity`]
    /// has been called.
    #[must_use]
    pub fn sensitivity_cached(&self) -> Option<&DMatrix<f64>> {
        self.sensitivity.as_ref()
    }

    /// Computes (caching the result) `∂v/∂s` by central differences,
    /// re-solving through the spline wrapper at each perturbed quote —
    /// mirrors [`SolvedCurve::sensitivity`] exactly, substituting the
    /// spline-wrapped pricing path for the plain curve.
    ///
    /// # Errors
    /// Propagates any error from an inner re-solve.
    pub fn sensitivity(&mut self, instruments: &[Swap]) -> CurveResult<&DMatrix<f64>> {
        if self.sensitivity.is_none() {
            let computed = self.compute_sensitivity(instruments)?;
            self.sensitivity = Some(computed);
        }
        Ok(self.sensitivity.as_ref().unwrap())
    }

    fn compute_sensitivity(&self, instruments: &[Swap]) -> CurveResult<DMatrix<f64>> {
        let m = self.quotes.len();
        let n = self.curve.base.dof_count();
        let dates: Vec<Date> = self.curve.base.nodes().iter().map(|(d, _)| *d).collect();
        let interpolation = self.curve.base.interpolation();
        let v0: Vec<f64> = self
            .curve
            .base
            .nodes()[1..]
            .iter()
            .map(|(_, y)| y.real)
            .collect();
        let knots = self.knots.clone();

        let rows: Vec<CurveResult<Vec<f64>>> = (0..m)
            .into_par_iter()
            .map(|j| {
                let mut s_plus = self.quotes.clone();
                s_plus[j] += SENSITIVITY_DS;
                let mut s_minus = self.quotes.clone();
                s_minus[j] -= SENSITIVITY_DS;

                let solve_once = |quotes: &[f64]| -> CurveResult<Vec<f64>> {
                    let (v, _, _) = resolve_with(
                        |v: &[f64]| -> CurveResult<Vec<Dual>> {
                            let advanced =
                                AdvancedCurve::from_nodes(&dates, interpolation, v, &knots)?;
                            instruments.iter().map(|s| s.rate(&advanced)).collect()
                        },
                        quotes,
                        self.weights.as_deref(),
                        Algorithm::GaussNewton,
                        self.max_iter,
                        self.tol,
                        v0.clone(),
                    )?;
                    Ok(v)
                };

                let v_plus = solve_once(&s_plus)?;
                let v_minus = solve_once(&s_minus)?;
                log::debug!("advanced sensitivity row {j}/{m} complete");
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
