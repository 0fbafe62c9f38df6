//! The parameter fitter and its state machine.
//!
//! ```text
//! Initialized --start--> Searching --converged--> Converged
//!                                  \--failed----> FailedFallback
//! ```
//!
//! Invalid input never enters the machine: [`KineticsFitter::fit`] returns
//! `Err(InvalidInput)` before the search starts.

use log::{debug, info, warn};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::data::TimeSeries;
use crate::error::{KinOptError, Result};
use crate::kinetics::{KineticParams, PARAMETER_COUNT};
use crate::lm::{LevenbergMarquardt, LmConfig, LmResult};
use crate::parameters::ParameterBounds;
use crate::problem::{BoundedProblem, Problem};
use crate::simulate::ConversionSimulator;
use crate::uncertainty::{uncertainty_analysis, UncertaintyResult};
use crate::utils::finite_difference;

use super::problem::KineticsProblem;

/// Lifecycle of one fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FitState {
    Initialized,
    Searching,
    Converged,
    FailedFallback,
}

/// Transitions of [`FitState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitEvent {
    Start,
    Converged,
    Failed,
}

impl FitState {
    pub fn advance(self, event: FitEvent) -> Result<FitState> {
        match (self, event) {
            (FitState::Initialized, FitEvent::Start) => Ok(FitState::Searching),
            (FitState::Searching, FitEvent::Converged) => Ok(FitState::Converged),
            (FitState::Searching, FitEvent::Failed) => Ok(FitState::FailedFallback),
            (state, event) => Err(KinOptError::InvalidState(format!(
                "no transition from {state} on {event:?}"
            ))),
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, FitState::Converged | FitState::FailedFallback)
    }
}

impl fmt::Display for FitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FitState::Initialized => "initialized",
            FitState::Searching => "searching",
            FitState::Converged => "converged",
            FitState::FailedFallback => "failed (fallback)",
        };
        f.write_str(name)
    }
}

/// Optimizer settings plus fitter-level switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitterConfig {
    #[serde(flatten)]
    pub lm: LmConfig,

    /// Estimate the parameter covariance after convergence. Default: true
    pub estimate_uncertainty: bool,
}

impl Default for FitterConfig {
    fn default() -> Self {
        Self {
            lm: LmConfig::default(),
            estimate_uncertainty: true,
        }
    }
}

impl FitterConfig {
    pub fn with_max_function_evals(mut self, max_function_evals: usize) -> Self {
        self.lm.max_function_evals = max_function_evals;
        self
    }

    pub fn with_parallel_jacobian(mut self, parallel: bool) -> Self {
        self.lm.parallel_jacobian = parallel;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.lm.validate()
    }
}

/// Outcome of a fit, shared read-only by the evaluator and the reporters.
#[derive(Debug, Clone)]
pub struct FitResult {
    /// Fitted parameters, or the initial guess verbatim after a fallback
    pub params: KineticParams,
    pub initial_guess: KineticParams,
    pub state: FitState,
    /// Sum of squared residuals at `params`, when it could be evaluated
    pub cost: Option<f64>,
    pub iterations: usize,
    pub func_evals: usize,
    /// Optimizer termination message, or the failure text after a fallback
    pub message: String,
    /// Why the fit degraded to the initial guess
    pub failure: Option<String>,
    pub uncertainty: Option<UncertaintyResult>,
}

impl FitResult {
    pub fn is_converged(&self) -> bool {
        self.state == FitState::Converged
    }

    pub fn is_degraded(&self) -> bool {
        self.state == FitState::FailedFallback
    }

    pub fn covariance(&self) -> Option<&Array2<f64>> {
        self.uncertainty.as_ref().map(|u| &u.covariance)
    }

    pub fn standard_errors(&self) -> Option<&Array1<f64>> {
        self.uncertainty.as_ref().map(|u| &u.standard_errors)
    }
}

/// Fits [`KineticParams`] to a [`TimeSeries`] within [`ParameterBounds`].
#[derive(Debug, Clone)]
pub struct KineticsFitter {
    simulator: ConversionSimulator,
    config: FitterConfig,
}

impl KineticsFitter {
    pub fn new(simulator: ConversionSimulator, config: FitterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { simulator, config })
    }

    pub fn simulator(&self) -> &ConversionSimulator {
        &self.simulator
    }

    pub fn config(&self) -> &FitterConfig {
        &self.config
    }

    /// Run the search from `initial_guess`.
    ///
    /// Returns `Err` only for input that can never be fitted; numerical
    /// trouble during the search ends in [`FitState::FailedFallback`].
    pub fn fit(
        &self,
        series: &TimeSeries,
        initial_guess: &KineticParams,
        bounds: &ParameterBounds,
    ) -> Result<FitResult> {
        let state = FitState::Initialized;
        validate_inputs(series, initial_guess, bounds)?;

        let problem = KineticsProblem::new(&self.simulator, series);
        let bounded = BoundedProblem::new(&problem, bounds)?;
        let start = bounded.to_internal(&initial_guess.to_array1())?;

        let state = state.advance(FitEvent::Start)?;
        info!(
            "fitting {} parameters to {} points, budget {} evaluations",
            PARAMETER_COUNT,
            series.len(),
            self.config.lm.max_function_evals
        );

        let optimizer = LevenbergMarquardt::with_config(self.config.lm.clone());
        let outcome = match optimizer.minimize(&bounded, start) {
            Ok(result) if result.success => Ok(result),
            Ok(result) => Err((
                KinOptError::FitNonConvergence(result.message.clone()),
                Some(result),
            )),
            Err(err) if err.is_recoverable() => Err((err, None)),
            Err(err) => return Err(err),
        };

        match outcome {
            Ok(result) => self.converged(state, &problem, &bounded, initial_guess, result),
            Err((err, partial)) => self.fallback(state, &problem, initial_guess, err, partial),
        }
    }

    fn converged(
        &self,
        state: FitState,
        problem: &KineticsProblem<'_>,
        bounded: &BoundedProblem<'_, KineticsProblem<'_>>,
        initial_guess: &KineticParams,
        result: LmResult,
    ) -> Result<FitResult> {
        let state = state.advance(FitEvent::Converged)?;
        let external = bounded.to_external(&result.params);
        let params = KineticParams::from_array1(&external)?;
        info!(
            "fit converged after {} iterations ({} evaluations): {}",
            result.iterations, result.func_evals, result.message
        );
        debug!("fitted parameters: {params:?}, cost = {:.6e}", result.cost);

        let uncertainty = if self.config.estimate_uncertainty {
            self.estimate_uncertainty(problem, &external, &result)
        } else {
            None
        };

        Ok(FitResult {
            params,
            initial_guess: *initial_guess,
            state,
            cost: Some(result.cost),
            iterations: result.iterations,
            func_evals: result.func_evals,
            message: result.message,
            failure: None,
            uncertainty,
        })
    }

    fn fallback(
        &self,
        state: FitState,
        problem: &KineticsProblem<'_>,
        initial_guess: &KineticParams,
        err: KinOptError,
        partial: Option<LmResult>,
    ) -> Result<FitResult> {
        let state = state.advance(FitEvent::Failed)?;
        warn!("fit failed, using initial guess: {err}");

        let cost = problem.eval_cost(&initial_guess.to_array1()).ok();
        let (iterations, func_evals) = partial
            .map(|r| (r.iterations, r.func_evals))
            .unwrap_or((0, 0));

        Ok(FitResult {
            params: *initial_guess,
            initial_guess: *initial_guess,
            state,
            cost,
            iterations,
            func_evals,
            message: err.to_string(),
            failure: Some(err.to_string()),
            uncertainty: None,
        })
    }

    /// Covariance in external coordinates; `None` when it is not defined.
    fn estimate_uncertainty(
        &self,
        problem: &KineticsProblem<'_>,
        external: &Array1<f64>,
        result: &LmResult,
    ) -> Option<UncertaintyResult> {
        let jacobian = finite_difference::jacobian_at(
            problem,
            external,
            &result.residuals,
            Some(self.config.lm.fd_epsilon),
        );
        match jacobian.and_then(|j| uncertainty_analysis(&j, result.cost)) {
            Ok(uncertainty) => Some(uncertainty),
            Err(err) => {
                warn!("parameter covariance unavailable: {err}");
                None
            }
        }
    }
}

fn validate_inputs(
    series: &TimeSeries,
    initial_guess: &KineticParams,
    bounds: &ParameterBounds,
) -> Result<()> {
    if series.is_empty() {
        return Err(KinOptError::InvalidInput("the time series is empty".into()));
    }
    initial_guess.validate()?;

    if bounds.len() != PARAMETER_COUNT {
        return Err(KinOptError::InvalidInput(format!(
            "expected bounds for {} parameters, got {}",
            PARAMETER_COUNT,
            bounds.len()
        )));
    }
    bounds
        .validate()
        .map_err(|e| KinOptError::InvalidInput(e.to_string()))?;
    if bounds.lower().iter().any(|&lo| lo < 0.0) {
        return Err(KinOptError::InvalidInput(
            "kinetic parameter bounds must be non-negative".into(),
        ));
    }
    if !bounds.contains(&initial_guess.to_array1()) {
        return Err(KinOptError::InvalidInput(format!(
            "initial guess {:?} lies outside the bounds",
            initial_guess.as_array()
        )));
    }
    Ok(())
}
