//! Configuration for the implicit integrator.

use serde::{Deserialize, Serialize};

use crate::error::{KinOptError, Result};

/// Tolerances, step bounds and budgets for [`integrate_at`](super::integrate_at).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OdeOptions {
    /// Relative tolerance. Default: 1e-6
    pub rtol: f64,

    /// Absolute tolerance. Default: 1e-9
    pub atol: f64,

    /// Initial step size; 0.0 selects one from the integration span. Default: 0.0
    pub h0: f64,

    /// Smallest step before the solve is declared failed. Default: 1e-12
    pub h_min: f64,

    /// Largest step. Default: f64::MAX (bounded only by the output times)
    pub h_max: f64,

    /// Step attempts (accepted and rejected) before giving up. Default: 100_000
    pub max_steps: usize,

    /// Newton iterations per implicit stage. Default: 10
    pub max_newton_iterations: usize,
}

impl Default for OdeOptions {
    fn default() -> Self {
        Self {
            rtol: 1e-6,
            atol: 1e-9,
            h0: 0.0,
            h_min: 1e-12,
            h_max: f64::MAX,
            max_steps: 100_000,
            max_newton_iterations: 10,
        }
    }
}

impl OdeOptions {
    pub fn with_tolerances(mut self, rtol: f64, atol: f64) -> Self {
        self.rtol = rtol;
        self.atol = atol;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.rtol.is_finite() || self.rtol <= 0.0 {
            return Err(KinOptError::InvalidInput("rtol must be finite and > 0".into()));
        }
        if !self.atol.is_finite() || self.atol <= 0.0 {
            return Err(KinOptError::InvalidInput("atol must be finite and > 0".into()));
        }
        if !(self.h_min > 0.0) || self.h_max < self.h_min || self.h0 < 0.0 {
            return Err(KinOptError::InvalidInput(
                "step bounds must satisfy 0 < h_min <= h_max and h0 >= 0".into(),
            ));
        }
        if self.max_steps == 0 || self.max_newton_iterations == 0 {
            return Err(KinOptError::InvalidInput(
                "max_steps and max_newton_iterations must be > 0".into(),
            ));
        }
        Ok(())
    }

    pub(crate) fn initial_step(&self, span: f64) -> f64 {
        if self.h0 > 0.0 {
            self.h0.min(span)
        } else {
            (span * 1e-3).max(self.h_min).min(self.h_max).min(span)
        }
    }
}
