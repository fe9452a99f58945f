//! Calibration configuration: interpolation rule, update-rule algorithm,
//! optional quote weights, and solver stopping criteria.

use ratecurve_math::interpolation::Interpolation;
use serde::{Deserialize, Serialize};

/// Which nonlinear least-squares update rule the solver applies each
/// iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Steepest-descent step, with the step size chosen by a one-dimensional
    /// minimization along the gradient direction rather than a fixed rate.
    GradientDescent,
    /// Gauss-Newton normal equations, undamped.
    GaussNewton,
    /// Gauss-Newton with adaptive diagonal (Levenberg-Marquardt) damping.
    LevenbergMarquardt,
}

/// Calibration configuration: the curve and solver knobs a caller selects
/// before running a solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// The curve's interpolation rule.
    pub interpolation: Interpolation,
    /// The solver's update rule.
    pub algorithm: Algorithm,
    /// Optional per-quote weights (`None` means identity, i.e. unweighted).
    #[serde(default)]
    pub weights: Option<Vec<f64>>,
    /// Maximum number of solver iterations.
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    /// Objective-decrease convergence tolerance.
    #[serde(default = "default_tol")]
    pub tol: f64,
}

fn default_max_iter() -> usize {
    2000
}

fn default_tol() -> f64 {
    1e-10
}

impl CalibrationConfig {
    /// Builds a configuration with the given interpolation and algorithm,
    /// using the default `max_iter`/`tol` and unweighted quotes.
    #[must_use]
    pub fn new(interpolation: Interpolation, algorithm: Algorithm) -> Self {
        Self {
            interpolation,
            algorithm,
            weights: None,
            max_iter: default_max_iter(),
            tol: default_tol(),
        }
    }

    /// Sets explicit per-quote weights.
    #[must_use]
    pub fn with_weights(mut self, weights: Vec<f64>) -> Self {
        self.weights = Some(weights);
        self
    }

    /// Overrides the iteration budget.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Overrides the convergence tolerance.
    #[must_use]
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }
}
