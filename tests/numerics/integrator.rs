//! Integration tests for the implicit ODE integrator.

use approx::assert_relative_eq;
use kinopt_rs::ode::{integrate_at, OdeOptions, OdeSystem, ScalarOde};
use kinopt_rs::KinOptError;
use nalgebra::DMatrix;

/// Robertson's chemical kinetics problem, the classic stiff benchmark.
struct Robertson;

impl OdeSystem for Robertson {
    fn ndim(&self) -> usize {
        3
    }

    fn rhs(&self, _t: f64, y: &[f64], dydt: &mut [f64]) {
        dydt[0] = -0.04 * y[0] + 1e4 * y[1] * y[2];
        dydt[1] = 0.04 * y[0] - 1e4 * y[1] * y[2] - 3e7 * y[1] * y[1];
        dydt[2] = 3e7 * y[1] * y[1];
    }

    fn jacobian(&self, _t: f64, y: &[f64], jac: &mut DMatrix<f64>) {
        *jac = DMatrix::from_row_slice(
            3,
            3,
            &[
                -0.04,
                1e4 * y[2],
                1e4 * y[1],
                0.04,
                -1e4 * y[2] - 6e7 * y[1],
                -1e4 * y[1],
                0.0,
                6e7 * y[1],
                0.0,
            ],
        );
    }
}

#[test]
fn test_logistic_growth_matches_closed_form() {
    let r = 0.3;
    let system = ScalarOde::new(move |_t, y| r * y * (1.0 - y));
    let times = [0.0, 1.0, 5.0, 10.0, 20.0, 40.0];
    let solution = integrate_at(&system, &[0.01], &times, &OdeOptions::default()).unwrap();

    assert_eq!(solution.t, times.to_vec());
    for (t, y) in times.iter().zip(solution.component(0)) {
        let expected = 1.0 / (1.0 + 99.0 * (-r * t).exp());
        assert_relative_eq!(y, expected, max_relative = 1e-4);
    }
}

#[test]
fn test_robertson_stiff_system() {
    let times = [0.4, 4.0, 40.0, 400.0];
    let opts = OdeOptions::default().with_tolerances(1e-6, 1e-10);
    let solution = integrate_at(&Robertson, &[1.0, 0.0, 0.0], &times, &opts).unwrap();

    for y in &solution.y {
        assert_relative_eq!(y.iter().sum::<f64>(), 1.0, epsilon = 1e-5);
        assert!(y.iter().all(|v| *v > -1e-8));
    }
    // y1(40) = 0.7158
    assert_relative_eq!(solution.y[2][0], 0.7158, max_relative = 1e-2);
    assert!(solution.stats.accepted_steps < 20_000);
}

#[test]
fn test_rejects_bad_time_grids() {
    let system = ScalarOde::new(|_t, y| -y);
    let opts = OdeOptions::default();

    for times in [vec![], vec![1.0, 1.0], vec![-1.0, 2.0], vec![0.0, f64::NAN]] {
        let result = integrate_at(&system, &[1.0], &times, &opts);
        assert!(
            matches!(result, Err(KinOptError::InvalidInput(_))),
            "accepted {times:?}"
        );
    }
}
