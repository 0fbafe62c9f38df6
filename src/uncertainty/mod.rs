//! # Uncertainty Calculation
//!
//! Parameter uncertainties for a converged least-squares fit:
//!
//! - Covariance matrix estimation from the Jacobian
//! - Standard errors for each parameter
//! - Correlation matrix
//!
//! The estimate follows lmfit-py: `covar = redchi * inv(JᵀJ)` with
//! `redchi = chisqr / (ndata - nvarys)`.

mod covariance;

pub use covariance::{
    calculate_correlation, calculate_covariance, standard_errors_from_covariance,
};

use ndarray::{Array1, Array2};

use crate::error::{KinOptError, Result};

/// Structure to hold uncertainty calculation results.
#[derive(Debug, Clone)]
pub struct UncertaintyResult {
    /// Covariance matrix for the parameters
    pub covariance: Array2<f64>,
    /// Standard error of each parameter, in parameter order
    pub standard_errors: Array1<f64>,
    /// Correlation matrix derived from covariance
    pub correlation: Array2<f64>,
    /// Chi-square value at minimum
    pub chisqr: f64,
    /// Reduced chi-square (chi^2 / nfree)
    pub redchi: f64,
    /// Degrees of freedom (n_points - n_parameters)
    pub nfree: usize,
}

/// Degrees of freedom and χ² at the solution.
#[derive(Debug, Clone, Copy)]
struct UncertaintyCalculator {
    nfree: usize,
    chisqr: f64,
    redchi: f64,
}

impl UncertaintyCalculator {
    /// Fails with `InvalidInput` unless there are more data points than
    /// parameters.
    fn new(ndata: usize, nvarys: usize, chisqr: f64) -> Result<Self> {
        if ndata <= nvarys {
            return Err(KinOptError::InvalidInput(format!(
                "{ndata} data points leave no degrees of freedom for {nvarys} parameters"
            )));
        }
        let nfree = ndata - nvarys;
        Ok(Self {
            nfree,
            chisqr,
            redchi: chisqr / nfree as f64,
        })
    }

    fn analyse(&self, jacobian: &Array2<f64>) -> Result<UncertaintyResult> {
        let covariance = calculate_covariance(jacobian, self.redchi)?;
        Ok(UncertaintyResult {
            standard_errors: standard_errors_from_covariance(&covariance),
            correlation: calculate_correlation(&covariance),
            covariance,
            chisqr: self.chisqr,
            redchi: self.redchi,
            nfree: self.nfree,
        })
    }
}

/// Complete uncertainty analysis from the Jacobian at the solution.
pub fn uncertainty_analysis(jacobian: &Array2<f64>, chisqr: f64) -> Result<UncertaintyResult> {
    UncertaintyCalculator::new(jacobian.nrows(), jacobian.ncols(), chisqr)?.analyse(jacobian)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::arr2;

    #[test]
    fn test_uncertainty_analysis() {
        let jacobian = arr2(&[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]);
        let result = uncertainty_analysis(&jacobian, 2.0).unwrap();

        assert_eq!(result.covariance.shape(), &[2, 2]);
        assert_eq!(result.correlation.shape(), &[2, 2]);
        assert_eq!(result.standard_errors.len(), 2);
        assert_eq!(result.nfree, 1);
        assert_eq!(result.redchi, 2.0);
        assert_relative_eq!(
            result.standard_errors[0],
            (2.0 * 56.0 / 24.0f64).sqrt(),
            epsilon = 1e-10
        );
        assert!(result.correlation[[0, 1]] < 0.0);
    }

    #[test]
    fn test_no_degrees_of_freedom() {
        let jacobian = arr2(&[[1.0, 0.0], [0.0, 1.0]]);
        assert!(matches!(
            uncertainty_analysis(&jacobian, 1.0),
            Err(KinOptError::InvalidInput(_))
        ));
    }
}
