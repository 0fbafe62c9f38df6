use std::io::Write;

use crate::error::Result;
use crate::kinetics::KineticParams;
use crate::report::{format_sci, FitReport, FitReporter};

/// Plain-text summary written to any [`Write`] sink.
pub struct TextReporter<W: Write> {
    out: W,
}

impl TextReporter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> TextReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_params(&mut self, params: &KineticParams) -> std::io::Result<()> {
        writeln!(
            self.out,
            "k_f = {}, K_A = {:.3}, K_B = {:.3}",
            format_sci(params.k_f, 3),
            params.k_a,
            params.k_b
        )?;
        writeln!(self.out, "K_D = {:.3}", params.k_d)
    }
}

impl<W: Write> FitReporter for TextReporter<W> {
    fn report(&mut self, report: &FitReport<'_>) -> Result<()> {
        let fit = report.fit;
        match &fit.failure {
            None => writeln!(self.out, "Fit converged: {}", fit.message)?,
            Some(reason) => {
                writeln!(self.out, "Fit failed: {reason}")?;
                writeln!(self.out, "Using initial guess (degraded fit)")?;
            }
        }
        self.write_params(&fit.params)?;

        if let Some(errors) = fit.standard_errors() {
            writeln!(
                self.out,
                "Standard errors: k_f ± {}, K_A ± {:.3}, K_B ± {:.3}, K_D ± {:.3}",
                format_sci(errors[0], 3),
                errors[1],
                errors[2],
                errors[3]
            )?;
        }

        writeln!(self.out)?;
        match report.metrics {
            Ok(metrics) => {
                writeln!(self.out, "R² = {:.3}", metrics.r_squared)?;
                writeln!(self.out, "RMSE = {:.2}%", metrics.rmse)?;
            }
            Err(reason) => writeln!(self.out, "Quality metrics unavailable: {reason}")?,
        }
        self.out.flush()?;
        Ok(())
    }
}
