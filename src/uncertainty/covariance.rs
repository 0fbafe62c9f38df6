//! # Covariance Matrix Calculations
//!
//! Functions for estimating the parameter covariance of a least-squares fit
//! from the Jacobian at the solution.

use ndarray::{Array1, Array2};

use crate::error::{KinOptError, Result};
use crate::utils::matrix_convert::{nalgebra_to_ndarray, ndarray_to_nalgebra};

/// Calculate covariance matrix from Jacobian matrix.
///
/// For nonlinear least-squares problems, the covariance matrix is estimated as:
///   covar = redchi * inv(J^T * J)
/// where:
///   - J is the Jacobian matrix
///   - redchi is the reduced chi-square (chi^2 / dof)
///
/// Returns [`KinOptError::SingularMatrix`] when `J^T * J` cannot be inverted
/// or the inverse has a non-positive variance.
pub fn calculate_covariance(jacobian: &Array2<f64>, redchi: f64) -> Result<Array2<f64>> {
    let j = ndarray_to_nalgebra(jacobian);
    let jtj = j.transpose() * &j;

    let inverse = jtj.try_inverse().ok_or(KinOptError::SingularMatrix)?;
    let covar = nalgebra_to_ndarray(&(inverse * redchi));

    let valid = covar.iter().all(|v| v.is_finite())
        && (0..covar.nrows()).all(|i| covar[[i, i]] > 0.0 || redchi == 0.0);
    if !valid {
        return Err(KinOptError::SingularMatrix);
    }

    // symmetrise away round-off
    Ok((&covar + &covar.t()) / 2.0)
}

/// Calculate correlation matrix from covariance matrix.
///
/// correl[i,j] = covar[i,j] / sqrt(covar[i,i] * covar[j,j])
pub fn calculate_correlation(covar: &Array2<f64>) -> Array2<f64> {
    let n = covar.nrows();
    Array2::from_shape_fn((n, n), |(i, j)| {
        if i == j {
            return 1.0;
        }
        let denom = (covar[[i, i]] * covar[[j, j]]).sqrt();
        if denom > 0.0 {
            covar[[i, j]] / denom
        } else {
            0.0
        }
    })
}

/// Extract standard errors from the covariance matrix.
///
/// Standard errors are the square roots of the diagonal elements
/// of the covariance matrix.
pub fn standard_errors_from_covariance(covar: &Array2<f64>) -> Array1<f64> {
    covar.diag().mapv(|v| if v > 0.0 { v.sqrt() } else { 0.0 })
}
