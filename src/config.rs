//! Run configuration, loadable from JSON.
//!
//! Every section is optional; omitted sections fall back to the reference
//! esterification run (nine samples over 240 min, `C_A0 = 0.177`,
//! `C_B0 = 3.54`, all parameters starting at 0.1).

use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::data::TimeSeries;
use crate::error::{KinOptError, Result};
use crate::fit::FitterConfig;
use crate::kinetics::{KineticParams, SystemConstants};
use crate::ode::OdeOptions;
use crate::parameters::ParameterBounds;

/// Default number of points on the dense plotting grid.
pub const DEFAULT_DENSE_POINTS: usize = 100;

/// Default chart location.
pub const DEFAULT_PLOT_PATH: &str = "kinetics_fit.html";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub data: TimeSeries,
    pub constants: SystemConstants,
    pub initial_guess: KineticParams,
    pub bounds: ParameterBounds,
    pub integrator: OdeOptions,
    pub fitter: FitterConfig,
    /// Points on the `[0, t_max]` grid used for the chart
    pub dense_points: usize,
    /// Where to write the HTML chart; `null` disables it
    pub plot_path: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            data: TimeSeries::reference_sample(),
            constants: SystemConstants::default(),
            initial_guess: KineticParams::default(),
            bounds: ParameterBounds::kinetic_default(),
            integrator: OdeOptions::default(),
            fitter: FitterConfig::default(),
            dense_points: DEFAULT_DENSE_POINTS,
            plot_path: Some(PathBuf::from(DEFAULT_PLOT_PATH)),
        }
    }
}

impl RunConfig {
    /// Load and validate a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: RunConfig = serde_json::from_str(text).map_err(|e| {
            if e.is_data() {
                KinOptError::InvalidInput(e.to_string())
            } else {
                KinOptError::Json(e)
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject settings that could never produce a fit.
    pub fn validate(&self) -> Result<()> {
        self.constants.validate()?;
        self.initial_guess.validate()?;
        self.bounds
            .validate()
            .map_err(|e| KinOptError::InvalidInput(e.to_string()))?;
        self.integrator.validate()?;
        self.fitter.validate()?;
        if self.dense_points < 2 {
            return Err(KinOptError::InvalidInput(format!(
                "dense_points must be at least 2, got {}",
                self.dense_points
            )));
        }
        Ok(())
    }
}
