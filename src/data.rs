//! Experimental conversion data.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{KinOptError, Result};

/// Sampling times of the reference experiment (min).
pub const SAMPLE_TIMES: [f64; 9] = [0.0, 5.0, 10.0, 20.0, 30.0, 60.0, 120.0, 180.0, 240.0];

/// Mean conversions measured at [`SAMPLE_TIMES`] (%).
pub const SAMPLE_CONVERSIONS: [f64; 9] = [0.0, 48.1, 50.9, 58.9, 62.2, 76.2, 86.1, 88.3, 88.9];

/// Checks that `times` is non-empty, finite, non-negative and strictly
/// increasing.
pub fn validate_times(times: &[f64]) -> Result<()> {
    if times.is_empty() {
        return Err(KinOptError::InvalidInput(
            "at least one time point is required".to_string(),
        ));
    }
    if let Some(t) = times.iter().find(|t| !t.is_finite() || **t < 0.0) {
        return Err(KinOptError::InvalidInput(format!(
            "time points must be finite and non-negative, got {t}"
        )));
    }
    if let Some(pair) = times.windows(2).find(|w| w[1] <= w[0]) {
        return Err(KinOptError::InvalidInput(format!(
            "time points must be strictly increasing, got {} followed by {}",
            pair[0], pair[1]
        )));
    }
    Ok(())
}

/// Observed conversion over time. Immutable once validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeSeries", into = "RawTimeSeries")]
pub struct TimeSeries {
    times: Array1<f64>,
    conversions: Array1<f64>,
}

#[derive(Serialize, Deserialize)]
struct RawTimeSeries {
    times: Vec<f64>,
    conversions: Vec<f64>,
}

impl TryFrom<RawTimeSeries> for TimeSeries {
    type Error = KinOptError;

    fn try_from(raw: RawTimeSeries) -> Result<Self> {
        TimeSeries::new(raw.times, raw.conversions)
    }
}

impl From<TimeSeries> for RawTimeSeries {
    fn from(series: TimeSeries) -> Self {
        RawTimeSeries {
            times: series.times.to_vec(),
            conversions: series.conversions.to_vec(),
        }
    }
}

impl TimeSeries {
    pub fn new(times: Vec<f64>, conversions: Vec<f64>) -> Result<Self> {
        if times.len() != conversions.len() {
            return Err(KinOptError::InvalidInput(format!(
                "{} time points but {} conversion values",
                times.len(),
                conversions.len()
            )));
        }
        validate_times(&times)?;
        if let Some(c) = conversions
            .iter()
            .find(|c| !c.is_finite() || **c < 0.0 || **c > 100.0)
        {
            return Err(KinOptError::InvalidInput(format!(
                "conversion values must lie in [0, 100], got {c}"
            )));
        }

        Ok(Self {
            times: Array1::from_vec(times),
            conversions: Array1::from_vec(conversions),
        })
    }

    /// The reference dataset: 9 points over 0–240 min.
    pub fn reference_sample() -> Self {
        Self {
            times: Array1::from_vec(SAMPLE_TIMES.to_vec()),
            conversions: Array1::from_vec(SAMPLE_CONVERSIONS.to_vec()),
        }
    }

    pub fn times(&self) -> &Array1<f64> {
        &self.times
    }

    pub fn conversions(&self) -> &Array1<f64> {
        &self.conversions
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Last (largest) sampling time.
    pub fn max_time(&self) -> f64 {
        self.times[self.times.len() - 1]
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.times.iter().copied().zip(self.conversions.iter().copied())
    }
}
