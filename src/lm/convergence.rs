//! Convergence criteria for the Levenberg-Marquardt iteration.

use ndarray::Array1;

use super::config::LmConfig;

/// Possible convergence states for an optimization algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceStatus {
    /// The algorithm is still running.
    Running,

    /// The algorithm has converged due to a small parameter change.
    ParameterConvergence,

    /// The algorithm has converged due to a small function value change.
    FunctionValueConvergence,

    /// The algorithm has converged due to a small gradient.
    GradientConvergence,

    /// The algorithm has terminated due to reaching the maximum number of iterations.
    MaxIterationsReached,

    /// The evaluation budget ran out.
    MaxFunctionEvaluationsReached,

    /// Damping saturated without finding a step that lowers the cost.
    NumericalError,
}

impl ConvergenceStatus {
    /// Returns true if the optimization has terminated (either converged or failed).
    pub fn is_terminated(&self) -> bool {
        !matches!(self, ConvergenceStatus::Running)
    }

    /// Returns true if the optimization has converged.
    pub fn is_converged(&self) -> bool {
        matches!(
            self,
            ConvergenceStatus::ParameterConvergence
                | ConvergenceStatus::FunctionValueConvergence
                | ConvergenceStatus::GradientConvergence
        )
    }

    /// Returns a description of the convergence status.
    pub fn description(&self) -> &'static str {
        match self {
            ConvergenceStatus::Running => "Optimization is still running",
            ConvergenceStatus::ParameterConvergence => "Converged: small parameter change",
            ConvergenceStatus::FunctionValueConvergence => "Converged: small function value change",
            ConvergenceStatus::GradientConvergence => "Converged: small gradient",
            ConvergenceStatus::MaxIterationsReached => "Terminated: maximum iterations reached",
            ConvergenceStatus::MaxFunctionEvaluationsReached => {
                "Terminated: maximum function evaluations reached"
            }
            ConvergenceStatus::NumericalError => {
                "Terminated: damping saturated without reducing the cost"
            }
        }
    }
}

/// Criteria for determining when an optimization algorithm has converged.
#[derive(Debug, Clone)]
pub struct ConvergenceCriteria {
    /// Tolerance for change in parameter values.
    pub xtol: f64,

    /// Tolerance for change in function value.
    pub ftol: f64,

    /// Tolerance for gradient norm.
    pub gtol: f64,

    pub max_iterations: usize,
    pub max_function_evals: usize,
}

impl Default for ConvergenceCriteria {
    fn default() -> Self {
        Self::from_config(&LmConfig::default())
    }
}

impl ConvergenceCriteria {
    pub fn from_config(config: &LmConfig) -> Self {
        Self {
            xtol: config.xtol,
            ftol: config.ftol,
            gtol: config.gtol,
            max_iterations: config.max_iterations,
            max_function_evals: config.max_function_evals,
        }
    }

    /// Largest parameter change relative to `max(|p|, 1)`.
    pub fn relative_step(params: &Array1<f64>, step: &Array1<f64>) -> f64 {
        step.iter()
            .zip(params.iter())
            .map(|(dx, x)| dx.abs() / x.abs().max(1.0))
            .fold(0.0, f64::max)
    }

    pub fn step_is_small(&self, params: &Array1<f64>, step: &Array1<f64>) -> bool {
        Self::relative_step(params, step) < self.xtol
    }

    pub fn gradient_converged(&self, gradient_norm: f64) -> bool {
        gradient_norm < self.gtol
    }

    /// Status after an accepted step from `params` to `params + step`.
    pub fn check_accepted(
        &self,
        params: &Array1<f64>,
        step: &Array1<f64>,
        cost: f64,
        new_cost: f64,
    ) -> ConvergenceStatus {
        if self.step_is_small(params, step) {
            return ConvergenceStatus::ParameterConvergence;
        }

        let cost_change = (cost - new_cost).abs() / cost.max(1e-300);
        if new_cost == 0.0 || cost_change < self.ftol {
            return ConvergenceStatus::FunctionValueConvergence;
        }

        ConvergenceStatus::Running
    }

    /// Budget status, checked before any further evaluation is spent.
    pub fn check_budget(&self, iterations: usize, func_evals: usize) -> ConvergenceStatus {
        if func_evals >= self.max_function_evals {
            ConvergenceStatus::MaxFunctionEvaluationsReached
        } else if iterations >= self.max_iterations {
            ConvergenceStatus::MaxIterationsReached
        } else {
            ConvergenceStatus::Running
        }
    }
}
