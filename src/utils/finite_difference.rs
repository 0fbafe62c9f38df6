//! Finite difference methods for numerical differentiation.
//!
//! The residuals of a kinetic fit come out of an adaptive integrator, so no
//! analytic derivatives are available and every Jacobian is built from
//! forward differences.

use crate::error::{KinOptError, Result};
use crate::problem::Problem;
use ndarray::{Array1, Array2};

/// Default relative step size for finite differences.
pub const DEFAULT_EPSILON: f64 = 1e-7;

/// Step for parameter `value`, scaled to its magnitude.
pub(crate) fn step_size(value: f64, eps: f64) -> f64 {
    if value.abs() > 1.0 {
        value.abs() * eps
    } else {
        eps
    }
}

/// Check that `residuals` has the length the problem advertises.
pub(crate) fn check_residuals(problem: &dyn Problem, residuals: &Array1<f64>) -> Result<()> {
    if residuals.len() != problem.residual_count() {
        return Err(KinOptError::DimensionMismatch(format!(
            "Expected {} residuals, got {}",
            problem.residual_count(),
            residuals.len()
        )));
    }
    Ok(())
}

/// Compute the Jacobian matrix using forward finite differences.
///
/// The Jacobian is the matrix of partial derivatives of the residuals with
/// respect to the parameters: J[i,j] = ∂residual[i]/∂param[j].
///
/// Costs `params.len() + 1` problem evaluations.
pub fn jacobian(
    problem: &dyn Problem,
    params: &Array1<f64>,
    epsilon: Option<f64>,
) -> Result<Array2<f64>> {
    let residuals = problem.eval(params)?;
    jacobian_at(problem, params, &residuals, epsilon)
}

/// Forward-difference Jacobian reusing residuals already evaluated at
/// `params`. Costs `params.len()` problem evaluations.
pub fn jacobian_at(
    problem: &dyn Problem,
    params: &Array1<f64>,
    residuals: &Array1<f64>,
    epsilon: Option<f64>,
) -> Result<Array2<f64>> {
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    check_residuals(problem, residuals)?;

    let mut jac = Array2::zeros((residuals.len(), params.len()));
    for j in 0..params.len() {
        let h = step_size(params[j], eps);
        let mut perturbed = params.clone();
        perturbed[j] += h;

        let residuals_perturbed = problem.eval(&perturbed)?;
        check_residuals(problem, &residuals_perturbed)?;

        let column = (&residuals_perturbed - residuals) / h;
        jac.column_mut(j).assign(&column);
    }

    Ok(jac)
}
