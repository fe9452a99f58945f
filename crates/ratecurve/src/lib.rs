//! # Ratecurve
//!
//! Swap curve calibration and risk-sensitivity engine. Re-exports the public
//! surface of [`ratecurve_core`], [`ratecurve_math`], and [`ratecurve_curves`]
//! so downstream callers need only one dependency.
//!
//! ## Worked example
//!
//! Calibrate a two-node curve to a single one-year par swap quote and read
//! off its quote-basis risk:
//!
//! ```
//! use ratecurve::prelude::*;
//!
//! let t0 = Date::from_ymd(2024, 1, 2).unwrap();
//! let t1 = Date::from_ymd(2025, 1, 2).unwrap();
//! let initial = Curve::new(vec![(t0, 1.0), (t1, 0.99)], Interpolation::LogLinear).unwrap();
//!
//! let swap = Swap::new(t0, 12, 12, 12, PeriodUnit::Months, 1_000_000.0).unwrap();
//! let config = CalibrationConfig::new(Interpolation::LogLinear, Algorithm::GaussNewton);
//! let solver = Solver::new(&initial, vec![5.0], &config).unwrap();
//! let mut solved = solver.iterate(&[swap.clone()]).unwrap();
//!
//! assert!(matches!(solved.termination(), Termination::Converged { .. }));
//! let rate = swap.rate(solved.curve()).unwrap();
//! assert!((rate.real - 5.0).abs() < 1e-6);
//!
//! solved.sensitivity(&[swap.clone()]).unwrap();
//! let risk = swap.risk(&solved, 5.0, swap.notional()).unwrap();
//! assert_eq!(risk.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use ratecurve_core as core;
pub use ratecurve_curves as curves;
pub use ratecurve_math as math;

/// Convenience re-export of the whole public surface.
pub mod prelude {
    pub use ratecurve_core::{CoreError, CoreResult, Date};
    pub use ratecurve_curves::prelude::*;
    pub use ratecurve_math::prelude::*;
}
