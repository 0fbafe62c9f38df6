//! Levenberg-Marquardt algorithm implementation.
//!
//! Nonlinear least-squares minimisation with Marquardt diagonal scaling,
//! gain-ratio damping control and a hard budget on residual evaluations.

pub mod algorithm;
pub mod config;
pub mod convergence;
pub mod step;
pub mod trust_region;

pub use algorithm::{LevenbergMarquardt, LmResult};
pub use config::LmConfig;
pub use convergence::{ConvergenceCriteria, ConvergenceStatus};
pub use step::{LmStep, StepResult};
pub use trust_region::TrustRegion;
