//! End-to-end integration test against the public facade crate only: build
//! a curve, calibrate it to swap quotes with each update rule, and check
//! the three algorithms agree within tolerance.

use approx::assert_relative_eq;
use ratecurve::prelude::*;

fn date(y: i32, m: u32, d: u32) -> Date {
    Date::from_ymd(y, m, d).unwrap()
}

#[test]
fn three_algorithms_agree_through_the_facade() {
    let t0 = date(2025, 6, 1);
    let t1 = t0.add_months(12).unwrap();
    let swap = Swap::new(t0, 12, 12, 12, PeriodUnit::Months, 5_000_000.0).unwrap();
    let quotes = vec![4.25];

    let mut node_values = Vec::new();
    for algorithm in [
        Algorithm::GradientDescent,
        Algorithm::GaussNewton,
        Algorithm::LevenbergMarquardt,
    ] {
        let initial = Curve::new(vec![(t0, 1.0), (t1, 0.96)], Interpolation::LogLinear).unwrap();
        let config =
            CalibrationConfig::new(Interpolation::LogLinear, algorithm).with_max_iter(5000);
        let solver = Solver::new(&initial, quotes.clone(), &config).unwrap();
        let solved = solver.iterate(&[swap.clone()]).unwrap();
        assert!(matches!(solved.termination(), Termination::Converged { .. }));
        node_values.push(solved.curve().nodes()[1].1.real);
    }

    for pair in node_values.windows(2) {
        assert_relative_eq!(pair[0], pair[1], epsilon = 1e-4);
    }
}

#[test]
fn calibrated_swap_reports_finite_quote_basis_risk() {
    let t0 = date(2025, 6, 1);
    let t1 = t0.add_months(12).unwrap();
    let initial = Curve::new(vec![(t0, 1.0), (t1, 0.96)], Interpolation::LogLinear).unwrap();
    let swap = Swap::new(t0, 12, 12, 12, PeriodUnit::Months, 5_000_000.0).unwrap();
    let quotes = vec![4.25];

    let config = CalibrationConfig::new(Interpolation::LogLinear, Algorithm::GaussNewton);
    let solver = Solver::new(&initial, quotes.clone(), &config).unwrap();
    let mut solved = solver.iterate(&[swap.clone()]).unwrap();
    solved.sensitivity(&[swap.clone()]).unwrap();

    let risk = swap.risk(&solved, quotes[0], swap.notional()).unwrap();
    assert_eq!(risk.len(), 1);
    assert!(risk[0].is_finite());
}
