//! # Parameter System
//!
//! Box constraints for the kinetic parameter vector and the Minuit-style
//! transformation that keeps every optimizer candidate inside them.
//!
//! ## Example Usage
//!
//! ```rust
//! use kinopt_rs::parameters::{ParameterBounds, VectorTransform};
//! use ndarray::array;
//!
//! let bounds = ParameterBounds::kinetic_default();
//! let transform = VectorTransform::new(&bounds);
//!
//! let internal = transform.to_internal(&array![0.1, 0.1, 0.1, 0.1]).unwrap();
//! let external = transform.to_external(&(internal + 25.0));
//! assert!(bounds.contains(&external));
//! ```

pub mod bounds;

// Re-export key types
pub use bounds::{
    Bounds, BoundsError, BoundsTransform, ParameterBounds, TransformScale, VectorTransform,
};
