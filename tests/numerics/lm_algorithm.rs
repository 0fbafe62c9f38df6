//! Integration tests for the Levenberg-Marquardt algorithm.

use approx::assert_relative_eq;
use kinopt_rs::lm::{ConvergenceStatus, LevenbergMarquardt, LmConfig};
use kinopt_rs::parameters::ParameterBounds;
use kinopt_rs::problem::BoundedProblem;
use kinopt_rs::{KinOptError, Problem, Result};
use ndarray::{array, Array1, Array2};

/// Test Problem: Simple 1D linear function f(x) = a*x + b
struct LinearProblem {
    x_data: Array1<f64>,
    y_data: Array1<f64>,
}

impl Problem for LinearProblem {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        if params.len() != 2 {
            return Err(KinOptError::DimensionMismatch(format!(
                "Expected 2 parameters, got {}",
                params.len()
            )));
        }
        Ok(self.x_data.mapv(|x| params[0] * x + params[1]) - &self.y_data)
    }

    fn parameter_count(&self) -> usize {
        2
    }

    fn residual_count(&self) -> usize {
        self.x_data.len()
    }

    fn jacobian(&self, _params: &Array1<f64>) -> Result<Array2<f64>> {
        let n = self.x_data.len();
        let mut jac = Array2::zeros((n, 2));
        for i in 0..n {
            jac[[i, 0]] = self.x_data[i];
            jac[[i, 1]] = 1.0;
        }
        Ok(jac)
    }

    fn has_custom_jacobian(&self) -> bool {
        true
    }
}

/// Michaelis-Menten initial rates: v = vmax * s / (km + s)
struct MichaelisMenten {
    s: Array1<f64>,
    v: Array1<f64>,
}

impl Problem for MichaelisMenten {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let (vmax, km) = (params[0], params[1]);
        Ok(self.s.mapv(|s| vmax * s / (km + s)) - &self.v)
    }

    fn parameter_count(&self) -> usize {
        2
    }

    fn residual_count(&self) -> usize {
        self.s.len()
    }
}

#[test]
fn test_linear_fit_with_analytic_jacobian() {
    let x = Array1::linspace(0.0, 10.0, 11);
    let problem = LinearProblem {
        y_data: x.mapv(|x| 2.0 * x + 1.0),
        x_data: x,
    };

    let result = LevenbergMarquardt::new()
        .minimize(&problem, array![0.0, 0.0])
        .unwrap();

    assert!(result.success, "{}", result.message);
    assert_relative_eq!(result.params[0], 2.0, epsilon = 1e-6);
    assert_relative_eq!(result.params[1], 1.0, epsilon = 1e-6);
}

#[test]
fn test_noisy_michaelis_menten() {
    let s = array![0.1, 0.25, 0.5, 1.0, 2.0, 4.0, 8.0, 16.0];
    let noise = array![0.01, -0.02, 0.015, -0.01, 0.02, -0.015, 0.01, -0.005];
    let v = s.mapv(|s| 3.0 * s / (1.2 + s)) + &noise;
    let problem = MichaelisMenten { s, v };

    let result = LevenbergMarquardt::new()
        .minimize(&problem, array![1.0, 1.0])
        .unwrap();

    assert!(result.success, "{}", result.message);
    assert_relative_eq!(result.params[0], 3.0, max_relative = 0.05);
    assert_relative_eq!(result.params[1], 1.2, max_relative = 0.05);
    assert!(result.cost < 0.01);
}

#[test]
fn test_bounds_hold_the_solution_in_the_box() {
    // the unconstrained optimum km = 1.2 lies above the upper bound
    let s = array![0.1, 0.25, 0.5, 1.0, 2.0, 4.0, 8.0, 16.0];
    let problem = MichaelisMenten {
        v: s.mapv(|s| 3.0 * s / (1.2 + s)),
        s,
    };
    let bounds = ParameterBounds::new(vec![0.1, 0.01], vec![10.0, 1.0]).unwrap();
    let bounded = BoundedProblem::new(&problem, &bounds).unwrap();

    let start = bounded.to_internal(&array![1.0, 0.5]).unwrap();
    let result = LevenbergMarquardt::new().minimize(&bounded, start).unwrap();
    let params = bounded.to_external(&result.params);

    assert!(bounds.contains(&params));
    assert!(params[1] <= 1.0);
    assert_relative_eq!(params[1], 1.0, max_relative = 1e-2);
}

#[test]
fn test_budget_is_respected() {
    let s = array![0.1, 0.25, 0.5, 1.0, 2.0, 4.0, 8.0, 16.0];
    let problem = MichaelisMenten {
        v: s.mapv(|s| 3.0 * s / (1.2 + s)),
        s,
    };
    let config = LmConfig {
        max_function_evals: 12,
        ..LmConfig::default()
    };

    let result = LevenbergMarquardt::with_config(config)
        .minimize(&problem, array![0.5, 5.0])
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.status, ConvergenceStatus::MaxFunctionEvaluationsReached);
    assert!(result.func_evals <= 12);
}
