//! # kinopt-rs
//!
//! `kinopt-rs` fits a heterogeneous esterification rate law with water
//! inhibition to conversion-versus-time data and reports the quality of the
//! fit.
//!
//! The library provides:
//! - The rate law and its four kinetic parameters ([`kinetics`])
//! - An adaptive L-stable implicit integrator ([`ode`])
//! - A box-constrained Levenberg-Marquardt fitter with a fallback policy
//!   ([`fit`], built on [`lm`])
//! - R² / RMSE evaluation and text / HTML reporting ([`metrics`], [`report`])
//!
//! ## Basic Usage
//!
//! ```no_run
//! use kinopt_rs::{pipeline, RunConfig};
//!
//! let output = pipeline::run(&RunConfig::default())?;
//! println!("k_f = {:.3e} ({})", output.fit.params.k_f, output.fit.state);
//! # Ok::<(), kinopt_rs::KinOptError>(())
//! ```

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod fit;
pub mod kinetics;
pub mod lm;
pub mod metrics;
pub mod ode;
pub mod parameters;
pub mod pipeline;
pub mod problem;
pub mod report;
pub mod simulate;
pub mod uncertainty;
pub mod utils;

// Re-exports for convenience
pub use config::RunConfig;
pub use data::TimeSeries;
pub use error::{KinOptError, Result};
pub use fit::{FitResult, FitState, FitterConfig, KineticsFitter};
pub use kinetics::{KineticParams, RateModel, SystemConstants};
pub use lm::LevenbergMarquardt;
pub use metrics::QualityMetrics;
pub use parameters::ParameterBounds;
pub use problem::Problem;
pub use simulate::{ConversionSimulator, PredictionCurve};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
