use thiserror::Error;

use crate::parameters::bounds::BoundsError;

/// Error types for the kinopt-rs library.
#[derive(Error, Debug)]
pub enum KinOptError {
    /// Malformed time series, mismatched lengths, non-positive constants.
    /// Never recovered from.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The ODE solve did not converge for a parameter candidate.
    #[error("Integration failure: {0}")]
    IntegrationFailure(String),

    /// The least-squares search exhausted its budget or stalled.
    #[error("Fit did not converge: {0}")]
    FitNonConvergence(String),

    /// Error indicating a singular matrix was encountered.
    #[error("Singular matrix encountered")]
    SingularMatrix,

    /// Invalid state in the algorithm or data structure.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Error indicating a mismatch in vector or matrix dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Error for boundary constraint violations.
    #[error("Bounds error: {0}")]
    Bounds(#[from] BoundsError),

    /// Error while rendering a chart.
    #[error("Plot error: {0}")]
    Plot(String),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl KinOptError {
    /// Whether the fitter may degrade to its fallback parameters instead of
    /// aborting the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            KinOptError::IntegrationFailure(_)
                | KinOptError::FitNonConvergence(_)
                | KinOptError::SingularMatrix
        )
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            KinOptError::InvalidInput(_)
            | KinOptError::DimensionMismatch(_)
            | KinOptError::Bounds(_) => 2,
            _ => 1,
        }
    }
}

/// Result type alias for kinopt-rs operations.
pub type Result<T> = std::result::Result<T, KinOptError>;
