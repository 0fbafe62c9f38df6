//! Rate law for the irreversible esterification with water inhibition.
//!
//! The limiting reagent `A` (oleic acid in the reference data) reacts with the
//! co-reactant `B` (methanol, in excess) and produces water `D`. With conversion
//! `X` in percent:
//!
//! ```text
//! C_A = C_A0 (1 - X/100)      C_B = C_B0 - C_A0 X/100      C_D = C_A0 X/100
//!
//!              k_f K_A K_B C_A C_B
//! r = ------------------------------------------        dX/dt = r * 100 / C_A0
//!      (1 + K_A C_A + K_B C_B + K_D C_D)^2
//! ```

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{KinOptError, Result};

/// Number of entries in the kinetic parameter vector.
pub const PARAMETER_COUNT: usize = 4;

/// Display names, in vector order.
pub const PARAMETER_NAMES: [&str; PARAMETER_COUNT] = ["k_f", "K_A", "K_B", "K_D"];

/// Initial concentrations, fixed for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemConstants {
    /// Initial limiting-reagent concentration (mol/L)
    pub c_a0: f64,
    /// Initial co-reactant concentration (mol/L)
    pub c_b0: f64,
}

impl SystemConstants {
    pub fn new(c_a0: f64, c_b0: f64) -> Result<Self> {
        let constants = Self { c_a0, c_b0 };
        constants.validate()?;
        Ok(constants)
    }

    /// Both concentrations must be finite and strictly positive.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("c_a0", self.c_a0), ("c_b0", self.c_b0)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(KinOptError::InvalidInput(format!(
                    "{name} must be a positive finite concentration, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for SystemConstants {
    fn default() -> Self {
        Self {
            c_a0: 0.177,
            c_b0: 3.54,
        }
    }
}

/// Kinetic parameter vector `[k_f, K_A, K_B, K_D]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KineticParams {
    /// Forward rate constant
    pub k_f: f64,
    /// Adsorption coefficient of the limiting reagent
    pub k_a: f64,
    /// Adsorption coefficient of the co-reactant
    pub k_b: f64,
    /// Inhibition coefficient of water
    pub k_d: f64,
}

impl KineticParams {
    pub fn new(k_f: f64, k_a: f64, k_b: f64, k_d: f64) -> Result<Self> {
        let params = Self { k_f, k_a, k_b, k_d };
        params.validate()?;
        Ok(params)
    }

    /// All entries finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in PARAMETER_NAMES.iter().zip(self.as_array()) {
            if !value.is_finite() || value < 0.0 {
                return Err(KinOptError::InvalidInput(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }

    pub fn as_array(&self) -> [f64; PARAMETER_COUNT] {
        [self.k_f, self.k_a, self.k_b, self.k_d]
    }

    pub fn to_array1(&self) -> Array1<f64> {
        Array1::from_vec(self.as_array().to_vec())
    }

    /// Build from an optimizer vector; the length must be exactly four.
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        match values {
            [k_f, k_a, k_b, k_d] => Self::new(*k_f, *k_a, *k_b, *k_d),
            _ => Err(KinOptError::DimensionMismatch(format!(
                "Expected {} kinetic parameters, got {}",
                PARAMETER_COUNT,
                values.len()
            ))),
        }
    }

    pub fn from_array1(values: &Array1<f64>) -> Result<Self> {
        Self::from_slice(&values.to_vec())
    }
}

impl Default for KineticParams {
    /// The reference initial guess.
    fn default() -> Self {
        Self {
            k_f: 0.1,
            k_a: 0.1,
            k_b: 0.1,
            k_d: 0.1,
        }
    }
}

/// Species concentrations at a given conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Concentrations {
    pub limiting: f64,
    pub co_reactant: f64,
    pub water: f64,
}

/// Instantaneous conversion rate for fixed initial concentrations.
#[derive(Debug, Clone, Copy)]
pub struct RateModel {
    constants: SystemConstants,
}

impl RateModel {
    pub fn new(constants: SystemConstants) -> Result<Self> {
        constants.validate()?;
        Ok(Self { constants })
    }

    pub fn constants(&self) -> SystemConstants {
        self.constants
    }

    /// Derived concentrations; conversion is clamped to [0, 100] so none of
    /// them can go negative.
    pub fn concentrations(&self, conversion: f64) -> Concentrations {
        let fraction = conversion.clamp(0.0, 100.0) / 100.0;
        let SystemConstants { c_a0, c_b0 } = self.constants;
        Concentrations {
            limiting: c_a0 * (1.0 - fraction),
            co_reactant: (c_b0 - c_a0 * fraction).max(0.0),
            water: c_a0 * fraction,
        }
    }

    /// Rate of conversion change in %/time-unit.
    pub fn rate(&self, conversion: f64, params: &KineticParams) -> f64 {
        let c = self.concentrations(conversion);

        let numerator = params.k_f * params.k_a * params.k_b * c.limiting * c.co_reactant;
        let denominator = (1.0
            + params.k_a * c.limiting
            + params.k_b * c.co_reactant
            + params.k_d * c.water)
            .powi(2);

        numerator / denominator * 100.0 / self.constants.c_a0
    }
}
