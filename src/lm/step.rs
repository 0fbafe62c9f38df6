//! Step calculation for the Levenberg-Marquardt algorithm.
//!
//! The damped normal equations `(JᵀJ + λ diag(JᵀJ)) δ = -Jᵀr` interpolate
//! between a Gauss-Newton step (small λ) and scaled gradient descent (large λ).

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};

use crate::utils::matrix_convert::{
    nalgebra_vec_to_ndarray, ndarray_to_nalgebra, ndarray_vec_to_nalgebra,
};

/// Result of a Levenberg-Marquardt step calculation.
pub struct StepResult {
    /// The calculated step vector
    pub step: Array1<f64>,

    /// The predicted reduction in the sum of squared residuals
    pub predicted_reduction: f64,

    /// The damping parameter used to calculate the step
    pub lambda: f64,
}

/// Normal-equation quantities at the current iterate, reused across trial
/// steps while the Jacobian is unchanged.
pub struct LmStep {
    j_t_j: DMatrix<f64>,
    j_t_r: DVector<f64>,
}

impl LmStep {
    pub fn new(jacobian: &Array2<f64>, residuals: &Array1<f64>) -> Self {
        let j = ndarray_to_nalgebra(jacobian);
        let r = ndarray_vec_to_nalgebra(residuals);
        Self {
            j_t_j: j.transpose() * &j,
            j_t_r: j.transpose() * r,
        }
    }

    /// Euclidean norm of the gradient of `½‖r‖²`.
    pub fn gradient_norm(&self) -> f64 {
        self.j_t_r.norm()
    }

    /// Solve the damped system for `lambda`.
    ///
    /// Returns `None` when the system cannot be solved or the step is not finite.
    pub fn calculate_step(&self, lambda: f64) -> Option<StepResult> {
        let mut augmented = self.j_t_j.clone();
        for i in 0..augmented.nrows() {
            augmented[(i, i)] += lambda * self.j_t_j[(i, i)].max(1e-10);
        }
        let rhs = -&self.j_t_r;

        let step = match augmented.clone().cholesky() {
            Some(chol) => chol.solve(&rhs),
            None => augmented.lu().solve(&rhs)?,
        };
        if step.iter().any(|v| !v.is_finite()) {
            return None;
        }

        let predicted_reduction = self.predicted_reduction(&step);
        Some(StepResult {
            step: nalgebra_vec_to_ndarray(&step),
            predicted_reduction,
            lambda,
        })
    }

    /// Reduction in `‖r‖²` predicted by the linear model `r + Jδ`.
    fn predicted_reduction(&self, step: &DVector<f64>) -> f64 {
        -(2.0 * step.dot(&self.j_t_r) + step.dot(&(&self.j_t_j * step)))
    }
}
