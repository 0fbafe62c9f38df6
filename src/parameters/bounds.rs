//! Parameter bounds implementation
//!
//! This module provides box constraints for the kinetic parameter vector and
//! the Minuit-style parameter transformation that lets the optimizer work with
//! unbounded internal values while every candidate handed to the model stays
//! inside its bounds.
//!
//! Kinetic constants routinely span several decades, so for strictly positive
//! finite bounds the sine transform is applied to `ln(p)` rather than `p`.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::f64::{INFINITY, NEG_INFINITY};
use thiserror::Error;

/// Errors that can occur when working with parameter bounds
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundsError {
    #[error("Invalid bounds: min ({min}) must be less than or equal to max ({max})")]
    InvalidBounds { min: f64, max: f64 },

    #[error("Parameter value {value} is outside bounds: [{min}, {max}]")]
    ValueOutsideBounds { value: f64, min: f64, max: f64 },

    #[error("Infinite parameter value is not allowed")]
    InfiniteValue,

    #[error("Lower bounds have {lower} entries but upper bounds have {upper}")]
    LengthMismatch { lower: usize, upper: usize },

    #[error("Expected {expected} parameter values, got {actual}")]
    WrongDimension { expected: usize, actual: usize },
}

/// Represents the bounds constraints on a single parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Minimum allowed value for the parameter
    pub min: f64,

    /// Maximum allowed value for the parameter
    pub max: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: NEG_INFINITY,
            max: INFINITY,
        }
    }
}

impl Bounds {
    /// Create a new bounds constraint, rejecting `min > max` and NaN limits.
    ///
    /// # Examples
    ///
    /// ```
    /// use kinopt_rs::parameters::bounds::Bounds;
    ///
    /// let bounds = Bounds::new(1e-3, 1e3).unwrap();
    /// assert!(bounds.is_within_bounds(0.1));
    /// assert!(Bounds::new(1.0, 0.0).is_err());
    /// ```
    pub fn new(min: f64, max: f64) -> Result<Self, BoundsError> {
        if min.is_nan() || max.is_nan() || min > max {
            return Err(BoundsError::InvalidBounds { min, max });
        }

        Ok(Self { min, max })
    }

    /// Create an unbounded constraint (negative infinity to positive infinity)
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Check if a value is within the bounds (inclusive)
    pub fn is_within_bounds(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn has_lower_bound(&self) -> bool {
        self.min.is_finite()
    }

    pub fn has_upper_bound(&self) -> bool {
        self.max.is_finite()
    }

    /// Both limits finite and the lower one strictly positive.
    pub fn is_positive_finite(&self) -> bool {
        self.has_lower_bound() && self.has_upper_bound() && self.min > 0.0
    }

    /// Clamp a value to be within the bounds
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// Scale on which the sine transform operates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformScale {
    /// `p = min + (sin z + 1)(max - min)/2`
    Linear,
    /// `ln p = ln min + (sin z + 1)(ln max - ln min)/2`
    Logarithmic,
}

/// Minuit-style mapping between an unbounded internal value and a bounded
/// external value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsTransform {
    bounds: Bounds,
    scale: TransformScale,
}

impl BoundsTransform {
    /// Create a transform, choosing the logarithmic scale whenever the bounds
    /// are finite and strictly positive.
    pub fn new(bounds: Bounds) -> Self {
        let scale = if bounds.is_positive_finite() {
            TransformScale::Logarithmic
        } else {
            TransformScale::Linear
        };
        Self { bounds, scale }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn scale(&self) -> TransformScale {
        self.scale
    }

    /// Limits of the interval the sine acts on.
    fn working_range(&self) -> (f64, f64) {
        match self.scale {
            TransformScale::Linear => (self.bounds.min, self.bounds.max),
            TransformScale::Logarithmic => (self.bounds.min.ln(), self.bounds.max.ln()),
        }
    }

    fn from_working(&self, w: f64) -> f64 {
        match self.scale {
            TransformScale::Linear => w,
            // exp/ln round trips can leave the open interval by an ulp
            TransformScale::Logarithmic => self.bounds.clamp(w.exp()),
        }
    }

    /// Transform an internal parameter value to an external value
    pub fn to_external(&self, internal_value: f64) -> f64 {
        let has_lower = self.bounds.has_lower_bound();
        let has_upper = self.bounds.has_upper_bound();

        match (has_lower, has_upper) {
            (false, false) => internal_value,
            (true, false) => self.bounds.min - 1.0 + (internal_value * internal_value + 1.0).sqrt(),
            (false, true) => self.bounds.max + 1.0 - (internal_value * internal_value + 1.0).sqrt(),
            (true, true) => {
                let (lo, hi) = self.working_range();
                self.from_working(lo + (internal_value.sin() + 1.0) * (hi - lo) / 2.0)
            }
        }
    }

    /// Transform an external parameter value to an internal value
    pub fn to_internal(&self, external_value: f64) -> Result<f64, BoundsError> {
        if !external_value.is_finite() {
            return Err(BoundsError::InfiniteValue);
        }

        if !self.bounds.is_within_bounds(external_value) {
            return Err(BoundsError::ValueOutsideBounds {
                value: external_value,
                min: self.bounds.min,
                max: self.bounds.max,
            });
        }

        let has_lower = self.bounds.has_lower_bound();
        let has_upper = self.bounds.has_upper_bound();

        let internal = match (has_lower, has_upper) {
            (false, false) => external_value,
            (true, false) => ((external_value - self.bounds.min + 1.0).powi(2) - 1.0).sqrt(),
            (false, true) => ((self.bounds.max - external_value + 1.0).powi(2) - 1.0).sqrt(),
            (true, true) => {
                let (lo, hi) = self.working_range();
                if hi == lo {
                    return Ok(0.0);
                }
                let w = match self.scale {
                    TransformScale::Linear => external_value,
                    TransformScale::Logarithmic => external_value.ln(),
                };
                (2.0 * (w - lo) / (hi - lo) - 1.0).clamp(-1.0, 1.0).asin()
            }
        };

        Ok(internal)
    }

    /// Derivative of the external value with respect to the internal value.
    pub fn external_derivative(&self, internal_value: f64) -> f64 {
        let has_lower = self.bounds.has_lower_bound();
        let has_upper = self.bounds.has_upper_bound();

        match (has_lower, has_upper) {
            (false, false) => 1.0,
            (true, false) => internal_value / (internal_value * internal_value + 1.0).sqrt(),
            (false, true) => -internal_value / (internal_value * internal_value + 1.0).sqrt(),
            (true, true) => {
                let (lo, hi) = self.working_range();
                let dw = internal_value.cos() * (hi - lo) / 2.0;
                match self.scale {
                    TransformScale::Linear => dw,
                    TransformScale::Logarithmic => self.to_external(internal_value) * dw,
                }
            }
        }
    }
}

/// Per-parameter box constraints for a whole parameter vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterBounds {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl ParameterBounds {
    /// Build from matching lower/upper vectors.
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self, BoundsError> {
        if lower.len() != upper.len() {
            return Err(BoundsError::LengthMismatch {
                lower: lower.len(),
                upper: upper.len(),
            });
        }
        for (&min, &max) in lower.iter().zip(upper.iter()) {
            Bounds::new(min, max)?;
        }
        Ok(Self { lower, upper })
    }

    /// Bounds used for `[k_f, K_A, K_B, K_D]`.
    pub fn kinetic_default() -> Self {
        Self {
            lower: vec![1e-5, 1e-3, 1e-3, 1e-3],
            upper: vec![1e3, 1e3, 1e3, 1e3],
        }
    }

    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Bounds of the `i`-th parameter.
    pub fn get(&self, i: usize) -> Option<Bounds> {
        Some(Bounds {
            min: *self.lower.get(i)?,
            max: *self.upper.get(i)?,
        })
    }

    /// Re-validates deserialized bounds.
    pub fn validate(&self) -> Result<(), BoundsError> {
        Self::new(self.lower.clone(), self.upper.clone()).map(|_| ())
    }

    pub fn contains(&self, values: &Array1<f64>) -> bool {
        values.len() == self.len()
            && values
                .iter()
                .zip(self.lower.iter().zip(self.upper.iter()))
                .all(|(v, (lo, hi))| v >= lo && v <= hi)
    }

    pub fn transforms(&self) -> Vec<BoundsTransform> {
        self.lower
            .iter()
            .zip(self.upper.iter())
            .map(|(&min, &max)| BoundsTransform::new(Bounds { min, max }))
            .collect()
    }
}

/// The vector-level counterpart of [`BoundsTransform`].
#[derive(Debug, Clone)]
pub struct VectorTransform {
    transforms: Vec<BoundsTransform>,
}

impl VectorTransform {
    pub fn new(bounds: &ParameterBounds) -> Self {
        Self {
            transforms: bounds.transforms(),
        }
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    fn check_dimension(&self, values: &Array1<f64>) -> Result<(), BoundsError> {
        if values.len() != self.transforms.len() {
            return Err(BoundsError::WrongDimension {
                expected: self.transforms.len(),
                actual: values.len(),
            });
        }
        Ok(())
    }

    pub fn to_internal(&self, external: &Array1<f64>) -> Result<Array1<f64>, BoundsError> {
        self.check_dimension(external)?;
        let values = self
            .transforms
            .iter()
            .zip(external.iter())
            .map(|(t, &v)| t.to_internal(v))
            .collect::<Result<Vec<f64>, BoundsError>>()?;
        Ok(Array1::from_vec(values))
    }

    pub fn to_external(&self, internal: &Array1<f64>) -> Array1<f64> {
        self.transforms
            .iter()
            .zip(internal.iter())
            .map(|(t, &z)| t.to_external(z))
            .collect()
    }

    /// Diagonal of `d external / d internal`.
    pub fn derivative(&self, internal: &Array1<f64>) -> Array1<f64> {
        self.transforms
            .iter()
            .zip(internal.iter())
            .map(|(t, &z)| t.external_derivative(z))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_bounds_creation() {
        let bounds = Bounds::new(0.0, 10.0).unwrap();
        assert_eq!(bounds.min, 0.0);
        assert_eq!(bounds.max, 10.0);

        assert!(Bounds::new(10.0, 0.0).is_err());
        assert!(Bounds::new(f64::NAN, 1.0).is_err());

        let bounds = Bounds::unbounded();
        assert_eq!(bounds.min, NEG_INFINITY);
        assert_eq!(bounds.max, INFINITY);
    }

    #[test]
    fn test_scale_selection() {
        let positive = BoundsTransform::new(Bounds::new(1e-5, 1e3).unwrap());
        assert_eq!(positive.scale(), TransformScale::Logarithmic);

        let straddling = BoundsTransform::new(Bounds::new(-1.0, 1.0).unwrap());
        assert_eq!(straddling.scale(), TransformScale::Linear);

        let touching_zero = BoundsTransform::new(Bounds::new(0.0, 1.0).unwrap());
        assert_eq!(touching_zero.scale(), TransformScale::Linear);
    }

    #[test]
    fn test_transform_inverse_pairs() {
        let cases = [
            (Bounds::new(1e-3, 1e3).unwrap(), 0.1),
            (Bounds::new(1e-5, 1e3).unwrap(), 2.5e-4),
            (Bounds::new(-2.0, 5.0).unwrap(), 1.5),
            (Bounds { min: 1.0, max: INFINITY }, 4.0),
            (Bounds { min: NEG_INFINITY, max: 3.0 }, -7.0),
            (Bounds::unbounded(), 42.0),
        ];

        for (bounds, value) in cases {
            let t = BoundsTransform::new(bounds);
            let z = t.to_internal(value).unwrap();
            assert_relative_eq!(t.to_external(z), value, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_external_always_within_bounds() {
        let t = BoundsTransform::new(Bounds::new(1e-3, 1e3).unwrap());
        for i in -200..=200 {
            let z = i as f64 * 0.05;
            let p = t.to_external(z);
            assert!(p >= 1e-3 && p <= 1e3, "z = {z} mapped to {p}");
        }
    }

    #[test]
    fn test_to_internal_rejects_out_of_range() {
        let t = BoundsTransform::new(Bounds::new(1e-3, 1e3).unwrap());
        assert!(matches!(
            t.to_internal(2e3),
            Err(BoundsError::ValueOutsideBounds { .. })
        ));
        assert_eq!(t.to_internal(f64::INFINITY), Err(BoundsError::InfiniteValue));
    }

    #[test]
    fn test_external_derivative_matches_finite_difference() {
        let t = BoundsTransform::new(Bounds::new(1e-3, 1e3).unwrap());
        let z = -0.4;
        let h = 1e-6;
        let fd = (t.to_external(z + h) - t.to_external(z - h)) / (2.0 * h);
        assert_relative_eq!(t.external_derivative(z), fd, max_relative = 1e-6);

        let t = BoundsTransform::new(Bounds::new(-2.0, 5.0).unwrap());
        let fd = (t.to_external(z + h) - t.to_external(z - h)) / (2.0 * h);
        assert_relative_eq!(t.external_derivative(z), fd, max_relative = 1e-6);
    }

    #[test]
    fn test_fixed_parameter() {
        let t = BoundsTransform::new(Bounds::new(2.0, 2.0).unwrap());
        let z = t.to_internal(2.0).unwrap();
        assert_eq!(z, 0.0);
        assert_relative_eq!(t.to_external(1.3), 2.0, max_relative = 1e-12);
    }

    #[test]
    fn test_parameter_bounds_validation() {
        assert!(matches!(
            ParameterBounds::new(vec![0.0, 0.0], vec![1.0]),
            Err(BoundsError::LengthMismatch { lower: 2, upper: 1 })
        ));
        assert!(ParameterBounds::new(vec![2.0], vec![1.0]).is_err());

        let bounds = ParameterBounds::kinetic_default();
        assert_eq!(bounds.len(), 4);
        assert!(bounds.contains(&array![0.1, 0.1, 0.1, 0.1]));
        assert!(!bounds.contains(&array![1e-6, 0.1, 0.1, 0.1]));
        assert!(!bounds.contains(&array![0.1, 0.1, 0.1]));
    }

    #[test]
    fn test_vector_transform() {
        let bounds = ParameterBounds::kinetic_default();
        let transform = VectorTransform::new(&bounds);
        let external = array![0.05, 2.0, 0.3, 15.0];

        let internal = transform.to_internal(&external).unwrap();
        let back = transform.to_external(&internal);
        for (a, b) in back.iter().zip(external.iter()) {
            assert_relative_eq!(*a, *b, max_relative = 1e-12);
        }

        assert!(matches!(
            transform.to_internal(&array![0.1, 0.1]),
            Err(BoundsError::WrongDimension { expected: 4, actual: 2 })
        ));
    }
}
