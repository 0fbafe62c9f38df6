//! Box-constrained estimation of the kinetic parameters.
//!
//! [`KineticsFitter`] drives the Levenberg-Marquardt search over a
//! [`KineticsProblem`] seen through the bounds transform, and owns the
//! fallback policy: recoverable numerical failures degrade to the initial
//! guess instead of aborting the run.

pub mod fitter;
pub mod problem;

pub use fitter::{FitEvent, FitResult, FitState, FitterConfig, KineticsFitter};
pub use problem::KineticsProblem;
