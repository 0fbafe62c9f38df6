//! Forward prediction: conversion curves from a parameter vector.

use ndarray::Array1;
use crate::error::{KinOptError, Result};
use crate::kinetics::{KineticParams, RateModel, SystemConstants};
use crate::ode::{integrate_at, OdeOptions, ScalarOde};

/// Predicted conversion at a set of times.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionCurve {
    pub times: Array1<f64>,
    pub conversions: Array1<f64>,
}

impl PredictionCurve {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.times.iter().copied().zip(self.conversions.iter().copied())
    }
}

/// `n` evenly spaced points over `[0, t_max]`.
pub fn linspace(t_max: f64, n: usize) -> Result<Array1<f64>> {
    if n < 2 || !t_max.is_finite() || t_max <= 0.0 {
        return Err(KinOptError::InvalidInput(format!(
            "a dense grid needs at least 2 points over a positive span, got {n} points up to {t_max}"
        )));
    }
    Ok(Array1::linspace(0.0, t_max, n))
}

/// Rate model and integrator composed into `f(times, params)`.
#[derive(Debug, Clone)]
pub struct ConversionSimulator {
    model: RateModel,
    options: OdeOptions,
}

impl ConversionSimulator {
    pub fn new(constants: SystemConstants, options: OdeOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            model: RateModel::new(constants)?,
            options,
        })
    }

    pub fn model(&self) -> &RateModel {
        &self.model
    }

    pub fn options(&self) -> &OdeOptions {
        &self.options
    }

    /// Conversion at each of `times`, starting from zero conversion at `t = 0`.
    pub fn predict_values(&self, times: &[f64], params: &KineticParams) -> Result<Array1<f64>> {
        params.validate()?;
        let model = self.model;
        let params = *params;
        let system = ScalarOde::new(move |_t, x| model.rate(x, &params));

        let solution = integrate_at(&system, &[0.0], times, &self.options)?;
        // The rate vanishes at full conversion; steps may still overshoot it
        // by roundoff-sized amounts.
        Ok(Array1::from_vec(solution.component(0)).mapv(|x| x.clamp(0.0, 100.0)))
    }

    pub fn predict(&self, times: &[f64], params: &KineticParams) -> Result<PredictionCurve> {
        let conversions = self.predict_values(times, params)?;
        Ok(PredictionCurve {
            times: Array1::from_vec(times.to_vec()),
            conversions,
        })
    }
}
