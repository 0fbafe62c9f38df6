use std::io::Write;

use kinopt_rs::pipeline;
use kinopt_rs::{FitState, KinOptError, KineticParams, RunConfig};

#[test]
fn test_run_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "data": {{"times": [0, 10, 30, 60, 120], "conversions": [0, 30, 55, 72, 85]}},
            "initial_guess": {{"k_f": 0.1, "k_a": 0.1, "k_b": 0.1, "k_d": 0.1}},
            "fitter": {{"max_function_evals": 4}},
            "dense_points": 10,
            "plot_path": null
        }}"#
    )
    .unwrap();

    let config = RunConfig::from_path(file.path()).unwrap();
    assert_eq!(config.data.len(), 5);
    assert!(config.plot_path.is_none());

    let output = pipeline::run(&config).unwrap();
    assert_eq!(output.fit.state, FitState::FailedFallback);
    assert_eq!(output.fit.params, KineticParams::default());
    assert_eq!(output.curve.as_ref().map(|c| c.len()), Some(10));
    assert!(output.metrics.is_ok());
}

#[test]
fn test_rejected_config_maps_to_usage_exit_code() {
    let err = RunConfig::from_json(r#"{"initial_guess": {"k_f": -1, "k_a": 0.1, "k_b": 0.1, "k_d": 0.1}}"#)
        .unwrap_err();
    assert!(matches!(err, KinOptError::InvalidInput(_)));
    assert_eq!(err.exit_code(), 2);
}
