//! The reference esterification experiment, fitted from the default guess.

use std::sync::OnceLock;

use kinopt_rs::pipeline::{self, PipelineOutput};
use kinopt_rs::report::{FitReporter, TextReporter};
use kinopt_rs::{FitState, RunConfig, TimeSeries};

fn reference_output() -> &'static PipelineOutput {
    static OUTPUT: OnceLock<PipelineOutput> = OnceLock::new();
    OUTPUT.get_or_init(|| {
        let config = RunConfig {
            plot_path: None,
            ..RunConfig::default()
        };
        pipeline::run(&config).unwrap()
    })
}

#[test]
fn test_reference_fit_quality() {
    let output = reference_output();

    assert_eq!(output.fit.state, FitState::Converged, "{}", output.fit.message);
    let metrics = output.metrics.as_ref().unwrap();
    assert!(metrics.r_squared > 0.9, "R² = {}", metrics.r_squared);
    assert!(metrics.rmse < 10.0, "RMSE = {}", metrics.rmse);

    let params = output.fit.params.as_array();
    assert!(params.iter().all(|p| p.is_finite() && *p >= 0.0));
    assert!(output.warnings.is_empty(), "{:?}", output.warnings);
}

#[test]
fn test_reference_curve_shape() {
    let output = reference_output();
    let curve = output.curve.as_ref().unwrap();

    assert_eq!(curve.len(), 100);
    assert_eq!(curve.times[0], 0.0);
    assert_eq!(curve.times[99], 240.0);
    assert_eq!(curve.conversions[0], 0.0);
    // conversion only grows
    assert!(curve
        .conversions
        .windows(2)
        .into_iter()
        .all(|w| w[1] >= w[0] - 1e-9));
    assert!(curve.conversions.iter().all(|x| *x < 100.0));
}

#[test]
fn test_text_report_matches_fit() {
    let output = reference_output();
    let series = TimeSeries::reference_sample();

    let mut reporter = TextReporter::new(Vec::new());
    reporter.report(&output.report(&series)).unwrap();
    let text = String::from_utf8(reporter.into_inner()).unwrap();

    assert!(text.starts_with("Fit converged: "));
    assert!(text.contains(&format!("K_D = {:.3}", output.fit.params.k_d)));
    let metrics = output.metrics.as_ref().unwrap();
    assert!(text.contains(&format!("R² = {:.3}", metrics.r_squared)));
    assert!(text.contains(&format!("RMSE = {:.2}%", metrics.rmse)));
}

#[cfg(feature = "plot")]
#[test]
fn test_chart_is_written() {
    use kinopt_rs::report::PlotlyReporter;

    let output = reference_output();
    let series = TimeSeries::reference_sample();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fit.html");

    let mut reporter = PlotlyReporter::new(&path);
    reporter.report(&output.report(&series)).unwrap();

    let html = std::fs::read_to_string(&path).unwrap();
    assert!(html.contains("Experimental data"));
    assert!(html.contains("Conversion (%)"));
}
