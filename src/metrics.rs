//! Goodness-of-fit statistics for a fitted conversion curve.

use ndarray::Array1;
use serde::Serialize;

use crate::error::{KinOptError, Result};

/// Quality of a fit at the experimental time points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityMetrics {
    /// Coefficient of determination
    pub r_squared: f64,
    /// Root mean squared error, in conversion percent
    pub rmse: f64,
}

fn check_lengths(observed: &Array1<f64>, predicted: &Array1<f64>) -> Result<()> {
    if observed.is_empty() || predicted.is_empty() {
        return Err(KinOptError::InvalidInput(
            "cannot evaluate a fit on zero data points".into(),
        ));
    }
    if observed.len() != predicted.len() {
        return Err(KinOptError::InvalidInput(format!(
            "{} observations but {} predictions",
            observed.len(),
            predicted.len()
        )));
    }
    Ok(())
}

/// Calculates the sum of squared errors (SSE) between predicted and observed values.
///
/// SSE = Σ(y_pred - y_obs)²
pub fn sum_of_squared_errors(observed: &Array1<f64>, predicted: &Array1<f64>) -> Result<f64> {
    check_lengths(observed, predicted)?;
    Ok((predicted - observed).mapv(|x| x * x).sum())
}

/// Coefficient of determination.
///
/// R² = 1 - SS_res / SS_tot
///
/// A constant series (SS_tot = 0) scores 1.0 when reproduced exactly and 0.0
/// otherwise.
pub fn r_squared(observed: &Array1<f64>, predicted: &Array1<f64>) -> Result<f64> {
    let ss_res = sum_of_squared_errors(observed, predicted)?;
    let mean = observed.sum() / observed.len() as f64;
    let ss_tot = observed.mapv(|y| (y - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Ok(1.0 - ss_res / ss_tot)
}

/// Root Mean Squared Error, in the same units as the data.
///
/// RMSE = √((1/n) * Σ(y_pred - y_obs)²)
pub fn root_mean_squared_error(observed: &Array1<f64>, predicted: &Array1<f64>) -> Result<f64> {
    let sse = sum_of_squared_errors(observed, predicted)?;
    Ok((sse / observed.len() as f64).sqrt())
}

/// Both statistics for one observed/predicted pair.
pub fn evaluate(observed: &Array1<f64>, predicted: &Array1<f64>) -> Result<QualityMetrics> {
    Ok(QualityMetrics {
        r_squared: r_squared(observed, predicted)?,
        rmse: root_mean_squared_error(observed, predicted)?,
    })
}
