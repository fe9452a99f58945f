//! # Ratecurve Curves
//!
//! Swap curve calibration and risk: node-table discount curves, the
//! nonlinear least-squares solver with three interchangeable update rules,
//! the B-spline-smoothed advanced curve variant, and fixed-for-floating swap
//! pricing.
//!
//! ## Quick start
//!
//! ```
//! use ratecurve_core::Date;
//! use ratecurve_curves::prelude::*;
//! use ratecurve_math::interpolation::Interpolation;
//!
//! let start = Date::from_ymd(2024, 1, 2).unwrap();
//! let end = Date::from_ymd(2025, 1, 2).unwrap();
//! let initial = Curve::new(vec![(start, 1.0), (end, 0.97)], Interpolation::LogLinear).unwrap();
//!
//! let swap = Swap::new(start, 12, 12, 12, PeriodUnit::Months, 1_000_000.0).unwrap();
//! let config = CalibrationConfig::new(Interpolation::LogLinear, Algorithm::GaussNewton);
//! let solver = Solver::new(&initial, vec![5.0], &config).unwrap();
//! let solved = solver.iterate(&[swap]).unwrap();
//! assert!(matches!(solved.termination(), Termination::Converged { .. }));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod advanced;
pub mod config;
pub mod curve;
pub mod error;
pub mod schedule;
pub mod solver;
pub mod swap;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::advanced::{AdvancedCurve, AdvancedSolvedCurve, BaseSolvedCurve};
    pub use crate::config::{Algorithm, CalibrationConfig};
    pub use crate::curve::{Curve, Discount};
    pub use crate::error::{CurveError, CurveResult};
    pub use crate::schedule::{Period, PeriodUnit, Schedule};
    pub use crate::solver::{Solver, SolvedCurve, Termination};
    pub use crate::swap::{Leg, Swap, SwapSpread};
}

pub use config::{Algorithm, CalibrationConfig};
pub use curve::{Curve, Discount};
pub use error::{CurveError, CurveResult};
pub use solver::{Solver, SolvedCurve, Termination};
pub use swap::{Leg, Swap, SwapSpread};
