use approx::assert_relative_eq;
use kinopt_rs::metrics::{evaluate, r_squared, root_mean_squared_error};
use kinopt_rs::{KineticParams, SystemConstants, TimeSeries};

use crate::test_helpers::simulator;

#[test]
fn test_flat_model_against_reference_data() {
    // k_f = 0 keeps conversion at zero
    let series = TimeSeries::reference_sample();
    let params = KineticParams::new(0.0, 0.1, 0.1, 0.1).unwrap();
    let predicted = simulator(SystemConstants::default())
        .predict_values(&series.times().to_vec(), &params)
        .unwrap();
    assert!(predicted.iter().all(|x| *x == 0.0));

    let observed = series.conversions();
    let mean_square = observed.iter().map(|y| y * y).sum::<f64>() / observed.len() as f64;
    assert_relative_eq!(
        root_mean_squared_error(observed, &predicted).unwrap(),
        mean_square.sqrt(),
        max_relative = 1e-12
    );
    assert!(r_squared(observed, &predicted).unwrap() < 0.0);
}

#[test]
fn test_metrics_are_symmetric_in_error_sign() {
    let series = TimeSeries::reference_sample();
    let observed = series.conversions();
    let above = observed + 2.0;
    let below = observed - 2.0;

    let a = evaluate(observed, &above).unwrap();
    let b = evaluate(observed, &below).unwrap();
    assert_relative_eq!(a.rmse, 2.0, epsilon = 1e-12);
    assert_relative_eq!(a.rmse, b.rmse, epsilon = 1e-12);
    assert_relative_eq!(a.r_squared, b.r_squared, epsilon = 1e-12);
}
