//! Curve: an ordered node-date -> discount-factor mapping plus an
//! interpolation rule.

use std::fmt;

use ratecurve_core::Date;
use ratecurve_math::interpolation::{interpolate, Interpolation};
use ratecurve_math::scalar::Scalar;

use crate::error::{CurveError, CurveResult};

/// Converts a date to the day-ordinal `f64` the interpolation kernel
/// expects; the kernel itself stays generic over [`Scalar`] and has no
/// dependency on a concrete date type.
pub(crate) fn ordinal(date: Date) -> f64 {
    f64::from(date.as_naive_date().num_days_from_ce())
}

/// A source of discount factors that a [`crate::swap::Swap`] can price
/// against.
///
/// [`Curve`] is the only implementor used directly by calibration; the
/// advanced (B-spline-smoothed) curve variant in [`crate::advanced`]
/// implements it too, so `Swap`'s pricing methods work unchanged against
/// either.
pub trait Discount<S: Scalar> {
    /// The discount factor at `date`.
    ///
    /// # Errors
    /// Returns a [`CurveError`] if interpolation fails (e.g. a domain
    /// violation under `log_linear`/`linear_zero_rate`).
    fn discount_factor(&self, date: Date) -> CurveResult<S>;
}

/// A discount-factor curve: an ordered node table plus an interpolation
/// rule.
///
/// Generic over [`Scalar`] so the same lookup code serves both pricing
/// (`Curve<f64>`) and calibration (`Curve<Dual>`, where node values carry
/// sensitivity partials with respect to every other node).
#[derive(Debug, Clone, PartialEq)]
pub struct Curve<S: Scalar> {
    nodes: Vec<(Date, S)>,
    interpolation: Interpolation,
}

impl<S: Scalar> Curve<S> {
    /// Builds a curve from an ordered node table.
    ///
    /// # Errors
    /// Returns [`CurveError::InvalidData`] if fewer than two nodes are given
    /// or the node dates are not strictly increasing.
    pub fn new(nodes: Vec<(Date, S)>, interpolation: Interpolation) -> CurveResult<Self> {
        if nodes.len() < 2 {
            return Err(CurveError::invalid_data("curve needs at least two nodes"));
        }
        for pair in nodes.windows(2) {
            if pair[0].0 >= pair[1].0 {
                return Err(CurveError::invalid_data(
                    "node dates must be strictly increasing",
                ));
            }
        }
        Ok(Self {
            nodes,
            interpolation,
        })
    }

    /// The anchor (node 0) date.
    #[must_use]
    pub fn anchor_date(&self) -> Date {
        self.nodes[0].0
    }

    /// The curve's node table, in date order.
    #[must_use]
    pub fn nodes(&self) -> &[(Date, S)] {
        &self.nodes
    }

    /// The curve's interpolation rule.
    #[must_use]
    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// The number of free node values: node 0's value is fixed at 1.0 and is
    /// never a calibration degree of freedom.
    #[must_use]
    pub fn dof_count(&self) -> usize {
        self.nodes.len() - 1
    }

    /// The simple annualized forward rate (in percent) between `start` and
    /// `end`: `(DF(start)/DF(end) - 1) * 365/(end-start) * 100`.
    ///
    /// # Errors
    /// Returns [`CurveError::InvalidData`] if `end` is not after `start`, or
    /// propagates a lookup error from [`Curve::discount_factor`].
    pub fn forward_rate(&self, start: Date, end: Date) -> CurveResult<S> {
        let df_start = self.discount_factor(start)?;
        let df_end = self.discount_factor(end)?;
        let days = (end - start) as f64;
        if days <= 0.0 {
            return Err(CurveError::invalid_data(
                "forward_rate: end date must be after start date",
            ));
        }
        let scale = 365.0 / days * 100.0;
        Ok((df_start / df_end - S::from(1.0)) * S::from(scale))
    }

    /// [`Curve::forward_rate`] with `end` given as `months` after `start`,
    /// rolled with the modified month-end rule.
    ///
    /// # Errors
    /// Propagates a [`CurveError`] from the date roll or the rate lookup.
    pub fn rate(&self, start: Date, months: i32) -> CurveResult<S> {
        let end = start.add_months(months)?;
        self.forward_rate(start, end)
    }
}

impl<S: Scalar> Discount<S> for Curve<S> {
    /// Looks up the discount factor at `date` by bracketing interpolation:
    /// scans node dates for the first `i` with `date <= node[i].date`,
    /// falling back to the last bracket (extrapolating) past the final
    /// node.
    fn discount_factor(&self, date: Date) -> CurveResult<S> {
        let n = self.nodes.len();
        let mut idx = n - 1;
        for (i, (node_date, _)) in self.nodes.iter().enumerate().skip(1) {
            if date <= *node_date {
                idx = i;
                break;
            }
        }
        let (x1, y1) = &self.nodes[idx - 1];
        let (x2, y2) = &self.nodes[idx];
        let anchor = ordinal(self.anchor_date());
        interpolate(
            ordinal(date),
            ordinal(*x1),
            y1.clone(),
            ordinal(*x2),
            y2.clone(),
            self.interpolation,
            anchor,
        )
        .map_err(Into::into)
    }
}

impl fmt::Display for Curve<f64> {
    /// Renders each node as `date  discount_factor`, DF to six decimals.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (date, df) in &self.nodes {
            writeln!(f, "{date}  {df:.6}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn two_node_linear_curve_midpoint() {
        let curve = Curve::new(
            vec![(date(2020, 1, 1), 1.0), (date(2030, 1, 1), 0.6065)],
            Interpolation::Linear,
        )
        .unwrap();
        let mid = curve.discount_factor(date(2025, 1, 1)).unwrap();
        // Not exactly the midpoint date (2030 - 2020 spans a leap day), but
        // close enough to the halfway weight to land near (1.0+0.6065)/2.
        assert_relative_eq!(mid, 0.80325, epsilon = 2e-3);
    }

    #[test]
    fn log_linear_identity() {
        let start = date(2020, 1, 1);
        let end = date(2025, 1, 1);
        let y_end = (-0.25f64).exp();
        let curve = Curve::new(vec![(start, 1.0), (end, y_end)], Interpolation::LogLinear).unwrap();
        let query = date(2022, 6, 30);
        let total_days = (end - start) as f64;
        let t = (query - start) as f64 / total_days;
        let expected = (-0.25 * t).exp();
        let got = curve.discount_factor(query).unwrap();
        assert_relative_eq!(got, expected, epsilon = 1e-9);
    }

    #[test]
    fn interpolation_is_exact_at_nodes() {
        let curve = Curve::new(
            vec![
                (date(2020, 1, 1), 1.0),
                (date(2022, 1, 1), 0.95),
                (date(2025, 1, 1), 0.87),
            ],
            Interpolation::LinearZeroRate,
        )
        .unwrap();
        for &(d, y) in curve.nodes() {
            assert_relative_eq!(curve.discount_factor(d).unwrap(), y, epsilon = 1e-9);
        }
    }

    #[test]
    fn last_bracket_extrapolates_past_final_node() {
        let curve = Curve::new(
            vec![(date(2020, 1, 1), 1.0), (date(2025, 1, 1), 0.9)],
            Interpolation::Linear,
        )
        .unwrap();
        let past = curve.discount_factor(date(2030, 1, 1)).unwrap();
        assert!(past < 0.9);
    }

    #[test]
    fn rejects_non_increasing_dates() {
        let result = Curve::new(
            vec![(date(2020, 1, 1), 1.0), (date(2020, 1, 1), 0.9)],
            Interpolation::Linear,
        );
        assert!(result.is_err());
    }

    #[test]
    fn display_formats_six_decimals() {
        let curve = Curve::new(
            vec![(date(2020, 1, 1), 1.0), (date(2025, 1, 1), 0.9_123_456)],
            Interpolation::Linear,
        )
        .unwrap();
        let rendered = format!("{curve}");
        assert!(rendered.contains("0.912346"));
    }
}
