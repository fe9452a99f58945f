//! Period schedule generation for swap legs.

use crate::error::{CurveError, CurveResult};
use ratecurve_core::Date;

/// Whether a schedule's tenor/period are expressed in calendar months or in
/// raw calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodUnit {
    /// Tenor and period length are counted in months, rolled with the
    /// modified month-end rule.
    Months,
    /// Tenor and period length are counted in raw calendar days.
    Days,
}

/// A single accrual period: `[start, end)` plus its ACT/365-fixed year
/// fraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Period {
    /// Period start date.
    pub start: Date,
    /// Period end date.
    pub end: Date,
    /// ACT/365-fixed day-count fraction for this period.
    pub year_fraction: f64,
}

/// An ordered sequence of accrual periods spanning `[start, start + tenor)`.
///
/// The final period is a stub whenever `tenor` is not an exact multiple of
/// `period`: every period before the last runs a full `period` length, and
/// the last period's end is always exactly `start + tenor`, never rolled
/// past it.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    periods: Vec<Period>,
}

impl Schedule {
    /// Builds a schedule from `start` running for `tenor` units of `unit`,
    /// split into periods of length `period` units of `unit`.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::InvalidData`] if `tenor` or `period` is zero,
    /// or if the date arithmetic underlying a roll fails.
    pub fn new(start: Date, tenor: i64, period: i64, unit: PeriodUnit) -> CurveResult<Self> {
        if tenor <= 0 || period <= 0 {
            return Err(CurveError::invalid_data(
                "tenor and period must both be positive",
            ));
        }

        let roll = |date: Date, amount: i64| -> CurveResult<Date> {
            match unit {
                PeriodUnit::Months => Ok(date.add_months(amount as i32)?),
                PeriodUnit::Days => Ok(date.add_days(amount)),
            }
        };

        let end = roll(start, tenor)?;
        let n_periods = (tenor as f64 / period as f64).ceil() as i64;

        let mut periods = Vec::with_capacity(n_periods as usize);
        let mut period_start = start;
        for _ in 0..n_periods.saturating_sub(1) {
            let period_end = roll(period_start, period)?;
            periods.push(Period {
                start: period_start,
                end: period_end,
                year_fraction: year_fraction(period_start, period_end),
            });
            period_start = period_end;
        }
        periods.push(Period {
            start: period_start,
            end,
            year_fraction: year_fraction(period_start, end),
        });

        Ok(Self { periods })
    }

    /// The schedule's accrual periods, in order.
    #[must_use]
    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// The schedule's start date.
    #[must_use]
    pub fn start(&self) -> Date {
        self.periods[0].start
    }

    /// The schedule's end date.
    #[must_use]
    pub fn end(&self) -> Date {
        self.periods[self.periods.len() - 1].end
    }
}

fn year_fraction(start: Date, end: Date) -> f64 {
    (end - start) as f64 / 365.0
}
