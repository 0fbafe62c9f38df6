//! Parallel Jacobian evaluation.
//!
//! Each Jacobian column needs its own ODE solve, so the columns are
//! distributed over the Rayon thread pool.

use ndarray::{Array1, Array2};
use rayon::prelude::*;

use crate::error::Result;
use crate::problem::Problem;
use crate::utils::finite_difference::{check_residuals, step_size, DEFAULT_EPSILON};

/// Compute the Jacobian matrix using forward finite differences in parallel.
///
/// Numerically identical to
/// [`finite_difference::jacobian_at`](crate::utils::finite_difference::jacobian_at);
/// costs `params.len()` problem evaluations.
pub fn jacobian_parallel(
    problem: &(dyn Problem + Sync),
    params: &Array1<f64>,
    residuals: &Array1<f64>,
    epsilon: Option<f64>,
) -> Result<Array2<f64>> {
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    check_residuals(problem, residuals)?;

    let columns: Result<Vec<Array1<f64>>> = (0..params.len())
        .into_par_iter()
        .map(|j| {
            let h = step_size(params[j], eps);
            let mut perturbed = params.clone();
            perturbed[j] += h;

            let residuals_perturbed = problem.eval(&perturbed)?;
            check_residuals(problem, &residuals_perturbed)?;
            Ok((&residuals_perturbed - residuals) / h)
        })
        .collect();

    let mut jac = Array2::zeros((residuals.len(), params.len()));
    for (j, column) in columns?.into_iter().enumerate() {
        jac.column_mut(j).assign(&column);
    }

    Ok(jac)
}
