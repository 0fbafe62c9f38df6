//! End-to-end fitter behaviour on synthetic and malformed input.

use approx::assert_relative_eq;
use kinopt_rs::{
    FitState, FitterConfig, KinOptError, KineticParams, KineticsFitter, ParameterBounds,
    SystemConstants, TimeSeries,
};

use crate::test_helpers::{simulator, synthetic_series, within_relative};

const TIMES: [f64; 12] = [
    0.0, 5.0, 10.0, 20.0, 30.0, 45.0, 60.0, 90.0, 120.0, 150.0, 180.0, 240.0,
];

fn constants() -> SystemConstants {
    // comparable concentrations, so C_B varies along the run
    SystemConstants::new(0.5, 1.0).unwrap()
}

fn true_params() -> KineticParams {
    KineticParams::new(0.05, 2.0, 1.0, 6.0).unwrap()
}

/// The combinations of `[k_f, K_A, K_B, K_D]` that the conversion curve
/// determines.
///
/// Every concentration is affine in X, so the denominator base is `a + b·X`
/// and the rate depends only on `k_f·K_A·K_B / a²` and `b / a`. Any other
/// direction in parameter space leaves the curve unchanged.
fn identifiable(params: &KineticParams, constants: &SystemConstants) -> [f64; 2] {
    let a = 1.0 + params.k_a * constants.c_a0 + params.k_b * constants.c_b0;
    let slope = constants.c_a0 * (params.k_d - params.k_a - params.k_b);
    [params.k_f * params.k_a * params.k_b / (a * a), slope / a]
}

#[test]
fn test_recovers_identifiable_combinations_from_close_guess() {
    let series = synthetic_series(constants(), &true_params(), &TIMES);
    let guess = KineticParams::new(0.052, 1.92, 1.04, 5.76).unwrap();

    let fitter = KineticsFitter::new(simulator(constants()), FitterConfig::default()).unwrap();
    let fit = fitter
        .fit(&series, &guess, &ParameterBounds::kinetic_default())
        .unwrap();

    assert_eq!(fit.state, FitState::Converged, "{}", fit.message);
    assert!(fit.failure.is_none());
    assert!(fit.cost.unwrap() < 1e-6);

    let fitted = identifiable(&fit.params, &constants());
    let expected = identifiable(&true_params(), &constants());
    for (f, e) in fitted.iter().zip(expected) {
        assert!(within_relative(*f, e, 0.01), "fitted {f}, expected {e}");
    }
}

#[test]
fn test_fitted_curve_reproduces_the_data() {
    let series = synthetic_series(constants(), &true_params(), &TIMES);
    let guess = KineticParams::new(0.06, 1.5, 1.2, 2.5).unwrap();

    let sim = simulator(constants());
    let fitter = KineticsFitter::new(sim.clone(), FitterConfig::default()).unwrap();
    let fit = fitter
        .fit(&series, &guess, &ParameterBounds::kinetic_default())
        .unwrap();
    assert!(fit.is_converged(), "{}", fit.message);

    // only two parameter combinations are determined; the curve must match
    let predicted = sim.predict_values(&TIMES, &fit.params).unwrap();
    for (p, o) in predicted.iter().zip(series.conversions()) {
        assert_relative_eq!(*p, *o, epsilon = 0.5);
    }
}

#[test]
fn test_exhausted_budget_falls_back_to_guess() {
    let series = TimeSeries::reference_sample();
    let guess = KineticParams::default();
    let config = FitterConfig::default().with_max_function_evals(5);

    let fitter = KineticsFitter::new(simulator(SystemConstants::default()), config).unwrap();
    let fit = fitter
        .fit(&series, &guess, &ParameterBounds::kinetic_default())
        .unwrap();

    assert_eq!(fit.state, FitState::FailedFallback);
    assert!(fit.is_degraded());
    assert_eq!(fit.params, guess);
    assert!(fit.uncertainty.is_none());
    assert!(fit.func_evals <= 5);
    assert!(fit.cost.is_some());
}

#[test]
fn test_unfittable_input_is_rejected() {
    let fitter =
        KineticsFitter::new(simulator(SystemConstants::default()), FitterConfig::default())
            .unwrap();
    let series = TimeSeries::reference_sample();

    // guess outside the box
    let guess = KineticParams::new(5000.0, 0.1, 0.1, 0.1).unwrap();
    assert!(matches!(
        fitter.fit(&series, &guess, &ParameterBounds::kinetic_default()),
        Err(KinOptError::InvalidInput(_))
    ));

    // three bounds for four parameters
    let bounds = ParameterBounds::new(vec![0.0; 3], vec![10.0; 3]).unwrap();
    assert!(matches!(
        fitter.fit(&series, &KineticParams::default(), &bounds),
        Err(KinOptError::InvalidInput(_))
    ));
}

#[test]
fn test_malformed_series_never_reaches_the_fitter() {
    assert!(matches!(
        TimeSeries::new(vec![0.0, 10.0], vec![0.0]),
        Err(KinOptError::InvalidInput(_))
    ));
    assert!(matches!(
        TimeSeries::new(vec![0.0, 10.0, 10.0], vec![0.0, 5.0, 6.0]),
        Err(KinOptError::InvalidInput(_))
    ));
}
