//! Configuration options for the Levenberg-Marquardt algorithm.
//!
//! This module defines the convergence tolerances, damping schedule and
//! evaluation budget used by [`LevenbergMarquardt`](super::LevenbergMarquardt).

use serde::{Deserialize, Serialize};

use crate::error::{KinOptError, Result};

/// Configuration options for the Levenberg-Marquardt algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LmConfig {
    /// Maximum number of accepted iterations. Default: 10_000
    pub max_iterations: usize,

    /// Maximum number of residual evaluations, Jacobian columns included.
    /// Default: 100_000
    pub max_function_evals: usize,

    /// Tolerance for relative change in cost. Default: 1e-8
    pub ftol: f64,

    /// Tolerance for relative change in parameter values. Default: 1e-8
    pub xtol: f64,

    /// Tolerance for the gradient norm. Default: 1e-10
    pub gtol: f64,

    /// Initial value for the damping parameter. Default: 1e-3
    pub initial_lambda: f64,

    /// Factor by which to increase lambda. Default: 10.0
    pub lambda_up_factor: f64,

    /// Factor by which to decrease lambda. Default: 0.1
    pub lambda_down_factor: f64,

    /// Minimum value for lambda. Default: 1e-10
    pub min_lambda: f64,

    /// Maximum value for lambda. Default: 1e10
    pub max_lambda: f64,

    /// Relative step for the finite-difference Jacobian. Default: 1e-7
    pub fd_epsilon: f64,

    /// Evaluate Jacobian columns on the Rayon pool when the `parallel`
    /// feature is enabled. Default: true
    pub parallel_jacobian: bool,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            max_function_evals: 100_000,
            ftol: 1e-8,
            xtol: 1e-8,
            gtol: 1e-10,
            initial_lambda: 1e-3,
            lambda_up_factor: 10.0,
            lambda_down_factor: 0.1,
            min_lambda: 1e-10,
            max_lambda: 1e10,
            fd_epsilon: crate::utils::finite_difference::DEFAULT_EPSILON,
            parallel_jacobian: true,
        }
    }
}

impl LmConfig {
    pub fn validate(&self) -> Result<()> {
        let tolerances = [
            ("ftol", self.ftol),
            ("xtol", self.xtol),
            ("gtol", self.gtol),
            ("fd_epsilon", self.fd_epsilon),
            ("initial_lambda", self.initial_lambda),
        ];
        for (name, value) in tolerances {
            if !value.is_finite() || value < 0.0 {
                return Err(KinOptError::InvalidInput(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        if self.fd_epsilon == 0.0 {
            return Err(KinOptError::InvalidInput("fd_epsilon must be > 0".into()));
        }
        if self.max_iterations == 0 || self.max_function_evals == 0 {
            return Err(KinOptError::InvalidInput(
                "max_iterations and max_function_evals must be > 0".into(),
            ));
        }
        let down_ok = self.lambda_down_factor > 0.0 && self.lambda_down_factor < 1.0;
        if !(self.lambda_up_factor > 1.0) || !down_ok {
            return Err(KinOptError::InvalidInput(
                "lambda factors must satisfy up > 1 and 0 < down < 1".into(),
            ));
        }
        if !(self.min_lambda > 0.0) || !(self.max_lambda >= self.min_lambda) {
            return Err(KinOptError::InvalidInput(
                "lambda bounds must satisfy 0 < min_lambda <= max_lambda".into(),
            ));
        }
        Ok(())
    }
}
