//! One complete run: fit, evaluate, and prepare everything the reporters show.

use log::{info, warn};
use ndarray::Array1;

use crate::config::RunConfig;
use crate::data::TimeSeries;
use crate::error::Result;
use crate::fit::{FitResult, KineticsFitter};
use crate::metrics::{evaluate, QualityMetrics};
use crate::report::{FitReport, FitReporter};
use crate::simulate::{linspace, ConversionSimulator, PredictionCurve};

/// Results of [`run`]. All derived values come from `fit.params`.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub fit: FitResult,
    /// Model conversion at the experimental times
    pub fitted: Option<Array1<f64>>,
    /// Metrics at the experimental times, or why they could not be computed
    pub metrics: std::result::Result<QualityMetrics, String>,
    /// Model curve on the dense grid
    pub curve: Option<PredictionCurve>,
    /// Non-fatal problems met after the fit
    pub warnings: Vec<String>,
}

impl PipelineOutput {
    pub fn report<'a>(&'a self, series: &'a TimeSeries) -> FitReport<'a> {
        FitReport {
            series,
            fit: &self.fit,
            metrics: self.metrics.as_ref().map_err(String::as_str),
            curve: self.curve.as_ref(),
        }
    }

    /// Hand the same report to each reporter in turn.
    pub fn publish(
        &self,
        series: &TimeSeries,
        reporters: &mut [Box<dyn FitReporter>],
    ) -> Result<()> {
        let report = self.report(series);
        for reporter in reporters.iter_mut() {
            reporter.report(&report)?;
        }
        Ok(())
    }
}

/// Fit the configured series and evaluate the result.
///
/// Returns `Err` only for invalid configuration or input. A failed search
/// still produces an output built from the fallback parameters.
pub fn run(config: &RunConfig) -> Result<PipelineOutput> {
    config.validate()?;
    let series = &config.data;

    let simulator = ConversionSimulator::new(config.constants, config.integrator.clone())?;
    let fitter = KineticsFitter::new(simulator.clone(), config.fitter.clone())?;
    let fit = fitter.fit(series, &config.initial_guess, &config.bounds)?;

    let mut warnings = Vec::new();
    if let Some(reason) = &fit.failure {
        warnings.push(format!("degraded fit: {reason}"));
    }

    let times = series.times().to_vec();
    let (fitted, metrics) = match simulator.predict_values(&times, &fit.params) {
        Ok(predicted) => {
            let metrics = evaluate(series.conversions(), &predicted).map_err(|e| e.to_string());
            (Some(predicted), metrics)
        }
        Err(err) => {
            warn!("cannot evaluate the fitted model: {err}");
            warnings.push(format!("prediction at the experimental times failed: {err}"));
            (None, Err(err.to_string()))
        }
    };
    if let Ok(m) = &metrics {
        info!("R² = {:.4}, RMSE = {:.3}", m.r_squared, m.rmse);
    }

    let curve = linspace(series.max_time(), config.dense_points)
        .and_then(|grid| simulator.predict(&grid.to_vec(), &fit.params));
    let curve = match curve {
        Ok(curve) => Some(curve),
        Err(err) => {
            warn!("no dense model curve: {err}");
            warnings.push(format!("dense model curve unavailable: {err}"));
            None
        }
    };

    Ok(PipelineOutput {
        fit,
        fitted,
        metrics,
        curve,
        warnings,
    })
}
