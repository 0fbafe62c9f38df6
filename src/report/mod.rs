//! Presentation of a finished fit.
//!
//! Reporters only read a [`FitReport`]; they never re-run the simulation, so
//! the numbers in the text summary and in the chart come from one
//! [`FitResult`].

mod text;
#[cfg(feature = "plot")]
mod plot;

pub use text::TextReporter;
#[cfg(feature = "plot")]
pub use plot::PlotlyReporter;

use crate::data::TimeSeries;
use crate::error::Result;
use crate::fit::FitResult;
use crate::metrics::QualityMetrics;
use crate::simulate::PredictionCurve;

/// Everything a reporter may show about one run.
#[derive(Debug, Clone, Copy)]
pub struct FitReport<'a> {
    pub series: &'a TimeSeries,
    pub fit: &'a FitResult,
    /// Metrics at the experimental times, or why they are missing
    pub metrics: std::result::Result<&'a QualityMetrics, &'a str>,
    /// Model curve on the dense plotting grid
    pub curve: Option<&'a PredictionCurve>,
}

/// A sink for fit reports.
pub trait FitReporter {
    fn report(&mut self, report: &FitReport<'_>) -> Result<()>;
}

/// Scientific notation with a two-digit signed exponent: `1.234e-02`.
pub fn format_sci(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return format!("{value}").to_lowercase();
    }
    let formatted = format!("{value:.precision$e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exponent.abs())
        }
        None => formatted,
    }
}
