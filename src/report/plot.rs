use std::path::{Path, PathBuf};

use plotly::{
    common::{DashType, Line, Marker, Mode},
    layout::Axis,
    Layout, Plot, Scatter,
};

use crate::error::{KinOptError, Result};
use crate::report::{FitReport, FitReporter};

const TITLE: &str = "Kinetic Modelling with Water Inhibition";

/// Writes the experimental points and the fitted curve as a standalone HTML
/// chart.
pub struct PlotlyReporter {
    path: PathBuf,
}

impl PlotlyReporter {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Build the chart without writing it.
    ///
    /// The experimental points are always drawn; the model trace only when
    /// the report carries a curve.
    pub fn plot(report: &FitReport<'_>) -> Plot {
        let mut plot = Plot::new();
        let observed = Scatter::new(
            report.series.times().to_vec(),
            report.series.conversions().to_vec(),
        )
        .name("Experimental data")
        .mode(Mode::Markers)
        .marker(Marker::new().color("black").size(8));
        plot.add_trace(observed);

        if let Some(curve) = report.curve {
            let label = if report.fit.is_degraded() {
                "Model (initial guess)"
            } else {
                "Model"
            };
            let model = Scatter::new(curve.times.to_vec(), curve.conversions.to_vec())
                .name(label)
                .mode(Mode::Lines)
                .line(Line::new().color("red").dash(DashType::Dash).width(2.0));
            plot.add_trace(model);
        } else {
            log::warn!("no model curve for this fit, charting the data only");
        }

        let layout = Layout::new()
            .title(TITLE)
            .show_legend(true)
            .width(1000)
            .height(500)
            .x_axis(Axis::new().title("Time (min)"))
            .y_axis(Axis::new().title("Conversion (%)").range(vec![0.0, 100.0]));
        plot.set_layout(layout);

        plot
    }
}

impl FitReporter for PlotlyReporter {
    fn report(&mut self, report: &FitReport<'_>) -> Result<()> {
        let plot = Self::plot(report);
        std::fs::write(&self.path, plot.to_html()).map_err(|e| {
            KinOptError::Plot(format!("cannot write {}: {e}", self.path.display()))
        })?;
        log::info!("chart written to {}", self.path.display());
        Ok(())
    }
}
