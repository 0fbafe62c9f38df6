//! Residuals of the conversion model against one experimental series.

use ndarray::Array1;

use crate::data::TimeSeries;
use crate::error::Result;
use crate::kinetics::{KineticParams, PARAMETER_COUNT};
use crate::problem::Problem;
use crate::simulate::ConversionSimulator;

/// `r_i = X(t_i; p) - X_obs,i` over the external parameter vector `p`.
pub struct KineticsProblem<'a> {
    simulator: &'a ConversionSimulator,
    times: Vec<f64>,
    observed: &'a Array1<f64>,
}

impl<'a> KineticsProblem<'a> {
    pub fn new(simulator: &'a ConversionSimulator, series: &'a TimeSeries) -> Self {
        Self {
            simulator,
            times: series.times().to_vec(),
            observed: series.conversions(),
        }
    }

    pub fn predict(&self, params: &KineticParams) -> Result<Array1<f64>> {
        self.simulator.predict_values(&self.times, params)
    }
}

impl Problem for KineticsProblem<'_> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let params = KineticParams::from_array1(params)?;
        Ok(self.predict(&params)? - self.observed)
    }

    fn parameter_count(&self) -> usize {
        PARAMETER_COUNT
    }

    fn residual_count(&self) -> usize {
        self.times.len()
    }
}
