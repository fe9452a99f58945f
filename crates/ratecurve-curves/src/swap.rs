//! Fixed-for-floating interest rate swap pricing.

use nalgebra::DVector;
use ratecurve_core::Date;
use ratecurve_math::dual::Dual;
use ratecurve_math::scalar::Scalar;

use crate::curve::Discount;
use crate::error::CurveResult;
use crate::schedule::{PeriodUnit, Schedule};
use crate::solver::SolvedCurve;

/// Which leg of a [`Swap`] a quantity pertains to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    /// The fixed leg.
    Fixed,
    /// The floating leg.
    Float,
}

/// A vanilla fixed-for-floating interest rate swap, priced off a single
/// discount curve.
///
/// There is no separate floating-leg projection curve: the floating leg's
/// schedule exists only to size its (unused in pricing) accrual periods and
/// to document the leg convention — `rate`/`npv`/`analytic_delta` price
/// purely off the fixed leg and the shared start/end dates.
#[derive(Debug, Clone, PartialEq)]
pub struct Swap {
    fixed: Schedule,
    float: Schedule,
    notional: f64,
}

impl Swap {
    /// Builds a swap running for `tenor` (in `unit`) from `start`, with
    /// fixed and floating legs paying every `fixed_period`/`float_period`
    /// units of `unit`.
    ///
    /// # Errors
    /// Propagates a [`crate::error::CurveError`] from schedule construction.
    pub fn new(
        start: Date,
        tenor: i64,
        fixed_period: i64,
        float_period: i64,
        unit: PeriodUnit,
        notional: f64,
    ) -> CurveResult<Self> {
        Ok(Self {
            fixed: Schedule::new(start, tenor, fixed_period, unit)?,
            float: Schedule::new(start, tenor, float_period, unit)?,
            notional,
        })
    }

    /// The swap's start (effective) date.
    #[must_use]
    pub fn start(&self) -> Date {
        self.fixed.start()
    }

    /// The swap's end (maturity) date.
    #[must_use]
    pub fn end(&self) -> Date {
        self.fixed.end()
    }

    /// The swap's notional.
    #[must_use]
    pub fn notional(&self) -> f64 {
        self.notional
    }

    fn schedule(&self, leg: Leg) -> &Schedule {
        match leg {
            Leg::Fixed => &self.fixed,
            Leg::Float => &self.float,
        }
    }

    /// The analytic delta (DV01-like annuity) of `leg`:
    /// `Σ DF(period_end) * year_fraction`, scaled by `notional/10000`.
    ///
    /// # Errors
    /// Propagates a discount-factor lookup error.
    pub fn analytic_delta<S: Scalar, C: Discount<S>>(
        &self,
        curve: &C,
        leg: Leg,
    ) -> CurveResult<S> {
        let mut total = S::from(0.0);
        for period in self.schedule(leg).periods() {
            let df = curve.discount_factor(period.end)?;
            total = total + df * S::from(period.year_fraction);
        }
        Ok(total * S::from(self.notional / 10_000.0))
    }

    /// The par rate (in percent) making this swap's NPV zero at inception:
    /// `(DF(start) - DF(end)) / analytic_delta(fix) * 100`.
    ///
    /// # Errors
    /// Propagates a discount-factor lookup error.
    pub fn rate<S: Scalar, C: Discount<S>>(&self, curve: &C) -> CurveResult<S> {
        let df_start = curve.discount_factor(self.start())?;
        let df_end = curve.discount_factor(self.end())?;
        let delta = self.analytic_delta(curve, Leg::Fixed)?;
        Ok((df_start - df_end) / delta * S::from(100.0))
    }

    /// Net present value at `fixed_rate` (percent) and `notional`:
    /// `(rate - fixed_rate) * analytic_delta(fix) * notional / 100`.
    ///
    /// Note `analytic_delta` already folds in `self.notional / 10000`; this
    /// formula multiplies by `notional` a second time, dividing by `100`
    /// rather than `10000`. This double notional-scaling is reproduced
    /// deliberately rather than "corrected", matching a similarly
    /// idiosyncratic scaling convention elsewhere in the solver.
    ///
    /// # Errors
    /// Propagates a discount-factor lookup error.
    pub fn npv<S: Scalar, C: Discount<S>>(
        &self,
        curve: &C,
        fixed_rate: f64,
        notional: f64,
    ) -> CurveResult<S> {
        let rate = self.rate(curve)?;
        let delta = self.analytic_delta(curve, Leg::Fixed)?;
        Ok((rate - S::from(fixed_rate)) * delta * S::from(notional / 100.0))
    }

    /// Per-quote risk (DV01-like, in the same units as `notional / 100`):
    /// this swap's NPV sensitivity to each calibrating quote.
    ///
    /// Computed by pricing this swap's NPV against the solved curve (whose
    /// node values carry `∂npv/∂v` in their `Dual` partials), then chaining
    /// through the cached `∂v/∂s` sensitivity matrix:
    /// `risk = (∂v/∂s) · grad_v(npv) / 100`.
    ///
    /// # Errors
    /// Propagates a pricing error, or [`crate::error::CurveError::InvalidData`]
    /// if [`SolvedCurve::sensitivity`] hasn't been called yet.
    pub fn risk(
        &self,
        solved: &SolvedCurve,
        fixed_rate: f64,
        notional: f64,
    ) -> CurveResult<DVector<f64>> {
        let npv: Dual = self.npv(solved.curve(), fixed_rate, notional)?;
        let sensitivity = match solved.sensitivity_cached() {
            Some(matrix) => matrix,
            None => {
                return Err(crate::error::CurveError::invalid_data(
                    "Swap::risk requires SolvedCurve::sensitivity to have been computed first",
                ))
            }
        };
        let n = solved.curve().dof_count();
        let grad_v_npv = DVector::from_iterator(n, (1..=n as u32).map(|id| npv.partial(id)));
        Ok(sensitivity * grad_v_npv / 100.0)
    }
}

/// The par-rate spread between two swaps against a common curve:
/// `swap_2.rate() - swap_1.rate()`, in percent.
///
/// Typically used to quote a curve point as a spread over another tenor
/// (e.g. a 2s10s spread) rather than as an outright rate.
#[derive(Debug, Clone)]
pub struct SwapSpread {
    near: Swap,
    far: Swap,
}

impl SwapSpread {
    /// Builds a spread between `near` and `far`, quoted as `far - near`.
    #[must_use]
    pub fn new(near: Swap, far: Swap) -> Self {
        Self { near, far }
    }

    /// The spread's value (in percent) against `curve`: `far.rate() - near.rate()`.
    ///
    /// # Errors
    /// Propagates a discount-factor lookup error from either leg.
    pub fn rate<S: Scalar, C: Discount<S>>(&self, curve: &C) -> CurveResult<S> {
        Ok(self.far.rate(curve)? - self.near.rate(curve)?)
    }
}
