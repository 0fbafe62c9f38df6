//! Problem definition trait and the bounds adapter.
//!
//! This module defines the `Problem` trait, which represents a nonlinear
//! least squares problem to be solved with the Levenberg-Marquardt algorithm,
//! and [`BoundedProblem`], which lets the unconstrained optimizer search a
//! box-constrained problem through the Minuit transform.

use ndarray::{Array1, Array2};

use crate::error::{KinOptError, Result};
use crate::parameters::{ParameterBounds, VectorTransform};

/// A trait representing a nonlinear least squares problem.
pub trait Problem {
    /// Evaluate the residuals (model minus data) at the given parameters.
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>>;

    /// Get the number of parameters in the problem.
    fn parameter_count(&self) -> usize;

    /// Get the number of residuals in the problem.
    fn residual_count(&self) -> usize;

    /// Evaluate the Jacobian matrix at the given parameters.
    ///
    /// The default implementation uses forward finite differences.
    fn jacobian(&self, params: &Array1<f64>) -> Result<Array2<f64>>
    where
        Self: Sized,
    {
        crate::utils::finite_difference::jacobian(self, params, None)
    }

    /// Check if this problem provides a custom Jacobian implementation.
    fn has_custom_jacobian(&self) -> bool {
        false
    }

    /// Evaluate the sum of squared residuals at the given parameters.
    fn eval_cost(&self, params: &Array1<f64>) -> Result<f64> {
        let residuals = self.eval(params)?;
        Ok(residuals.iter().map(|r| r.powi(2)).sum())
    }
}

/// Presents a bounded problem to the optimizer in internal (unbounded)
/// coordinates.
pub struct BoundedProblem<'a, P: Problem> {
    inner: &'a P,
    transform: VectorTransform,
}

impl<'a, P: Problem> BoundedProblem<'a, P> {
    pub fn new(inner: &'a P, bounds: &ParameterBounds) -> Result<Self> {
        if bounds.len() != inner.parameter_count() {
            return Err(KinOptError::DimensionMismatch(format!(
                "Expected bounds for {} parameters, got {}",
                inner.parameter_count(),
                bounds.len()
            )));
        }
        Ok(Self {
            inner,
            transform: VectorTransform::new(bounds),
        })
    }

    pub fn transform(&self) -> &VectorTransform {
        &self.transform
    }

    pub fn to_internal(&self, external: &Array1<f64>) -> Result<Array1<f64>> {
        Ok(self.transform.to_internal(external)?)
    }

    pub fn to_external(&self, internal: &Array1<f64>) -> Array1<f64> {
        self.transform.to_external(internal)
    }
}

impl<P: Problem> Problem for BoundedProblem<'_, P> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        self.inner.eval(&self.to_external(params))
    }

    fn parameter_count(&self) -> usize {
        self.inner.parameter_count()
    }

    fn residual_count(&self) -> usize {
        self.inner.residual_count()
    }
}
