//! Implementation of the Levenberg-Marquardt algorithm.
//!
//! Trial steps whose residuals cannot be evaluated (for instance when the
//! integrator fails for an extreme parameter candidate) are treated as
//! rejected steps: the damping is raised and a shorter step is tried.

use log::{debug, trace};
use ndarray::{Array1, Array2};
use std::fmt;

use crate::error::{KinOptError, Result};
use crate::problem::Problem;
use crate::utils::finite_difference;

use super::config::LmConfig;
use super::convergence::{ConvergenceCriteria, ConvergenceStatus};
use super::step::LmStep;
use super::trust_region::TrustRegion;

/// Result of the Levenberg-Marquardt optimization.
#[derive(Debug, Clone)]
pub struct LmResult {
    /// Optimized parameter values
    pub params: Array1<f64>,

    /// Residuals at the solution
    pub residuals: Array1<f64>,

    /// Sum of squared residuals
    pub cost: f64,

    /// Number of accepted iterations
    pub iterations: usize,

    /// Number of residual evaluations, Jacobian columns included
    pub func_evals: usize,

    /// Whether the optimization converged
    pub success: bool,

    pub status: ConvergenceStatus,

    /// A message describing the result
    pub message: String,
}

impl fmt::Display for LmResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Result:")?;
        writeln!(f, "  Success: {}", self.success)?;
        writeln!(f, "  Message: {}", self.message)?;
        writeln!(f, "  Cost: {:.6e}", self.cost)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.func_evals)?;
        writeln!(f, "  Parameters: {:?}", self.params)?;
        Ok(())
    }
}

/// The Levenberg-Marquardt optimizer.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    config: LmConfig,
}

impl LevenbergMarquardt {
    /// Create a new Levenberg-Marquardt optimizer with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LmConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LmConfig {
        &self.config
    }

    /// Set the residual evaluation budget.
    pub fn with_max_function_evals(mut self, max_function_evals: usize) -> Self {
        self.config.max_function_evals = max_function_evals;
        self
    }

    pub fn with_parallel_jacobian(mut self, parallel: bool) -> Self {
        self.config.parallel_jacobian = parallel;
        self
    }

    fn jacobian<P: Problem + Sync>(
        &self,
        problem: &P,
        params: &Array1<f64>,
        residuals: &Array1<f64>,
    ) -> Result<Array2<f64>> {
        if problem.has_custom_jacobian() {
            return problem.jacobian(params);
        }
        let eps = Some(self.config.fd_epsilon);

        #[cfg(feature = "parallel")]
        if self.config.parallel_jacobian {
            return crate::utils::parallel::jacobian_parallel(problem, params, residuals, eps);
        }

        finite_difference::jacobian_at(problem, params, residuals, eps)
    }

    /// Minimize the sum of squared residuals for the given problem.
    ///
    /// Errors from the initial residual evaluation and from Jacobian
    /// evaluations are propagated. Running out of budget or damping is not an
    /// error: the best point found is returned with `success == false`.
    pub fn minimize<P: Problem + Sync>(
        &self,
        problem: &P,
        initial_params: Array1<f64>,
    ) -> Result<LmResult> {
        self.config.validate()?;

        let n_params = problem.parameter_count();
        if initial_params.len() != n_params {
            return Err(KinOptError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                n_params,
                initial_params.len()
            )));
        }

        let criteria = ConvergenceCriteria::from_config(&self.config);
        let mut trust_region = TrustRegion::from_config(&self.config);

        let mut params = initial_params;
        let mut residuals = problem.eval(&params)?;
        let mut func_evals = 1;
        let mut cost = sum_of_squares(&residuals);
        if !cost.is_finite() {
            return Err(KinOptError::InvalidInput(
                "residuals at the initial parameters are not finite".to_string(),
            ));
        }
        let mut iterations = 0;

        let status = 'outer: loop {
            let budget = criteria.check_budget(iterations, func_evals + n_params);
            if budget.is_terminated() {
                break budget;
            }

            let jacobian = self.jacobian(problem, &params, &residuals)?;
            func_evals += n_params;
            let lm_step = LmStep::new(&jacobian, &residuals);

            let gradient_norm = lm_step.gradient_norm();
            if criteria.gradient_converged(gradient_norm) {
                break ConvergenceStatus::GradientConvergence;
            }

            // Trial steps with the same Jacobian until one is accepted.
            loop {
                if trust_region.is_saturated() {
                    break 'outer ConvergenceStatus::NumericalError;
                }
                if func_evals >= criteria.max_function_evals {
                    break 'outer ConvergenceStatus::MaxFunctionEvaluationsReached;
                }

                let Some(step) = lm_step.calculate_step(trust_region.lambda) else {
                    trace!("lambda = {:.3e}: damped system not solvable", trust_region.lambda);
                    trust_region.increase();
                    continue;
                };
                let small_step = criteria.step_is_small(&params, &step.step);

                let new_params = &params + &step.step;
                func_evals += 1;
                let new_residuals = match problem.eval(&new_params) {
                    Ok(r) => r,
                    Err(err) if err.is_recoverable() => {
                        trace!("trial step rejected: {err}");
                        if small_step {
                            break 'outer ConvergenceStatus::ParameterConvergence;
                        }
                        trust_region.increase();
                        continue;
                    }
                    Err(err) => return Err(err),
                };
                let new_cost = sum_of_squares(&new_residuals);

                let gain = TrustRegion::gain_ratio(cost, new_cost, step.predicted_reduction);
                if new_cost <= cost && trust_region.update_lambda(gain) {
                    let status = criteria.check_accepted(&params, &step.step, cost, new_cost);
                    params = new_params;
                    residuals = new_residuals;
                    cost = new_cost;
                    iterations += 1;
                    debug!(
                        "iteration {iterations}: cost = {cost:.6e}, lambda = {:.3e}, evals = {func_evals}",
                        trust_region.lambda
                    );
                    if status.is_terminated() {
                        break 'outer status;
                    }
                    break;
                }

                if !(new_cost <= cost) {
                    // uphill or non-finite: update_lambda was not reached
                    trust_region.increase();
                }
                if small_step {
                    break 'outer ConvergenceStatus::ParameterConvergence;
                }
            }
        };

        let success = status.is_converged();
        let message = match status {
            ConvergenceStatus::MaxFunctionEvaluationsReached => format!(
                "{} ({} of {} evaluations used)",
                status.description(),
                func_evals,
                self.config.max_function_evals
            ),
            ConvergenceStatus::MaxIterationsReached => format!(
                "{} ({})",
                status.description(),
                self.config.max_iterations
            ),
            _ => status.description().to_string(),
        };

        Ok(LmResult {
            params,
            residuals,
            cost,
            iterations,
            func_evals,
            success,
            status,
            message,
        })
    }
}

fn sum_of_squares(residuals: &Array1<f64>) -> f64 {
    residuals.iter().map(|r| r.powi(2)).sum()
}
