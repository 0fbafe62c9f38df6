//! Command-line front end for the `kinfit` binary.
//!
//! Parsing and dispatch live here; the binary itself only sets up logging and
//! maps errors to exit codes.

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use log::warn;

use crate::config::RunConfig;
use crate::error::Result;
use crate::pipeline;
use crate::report::{FitReporter, TextReporter};

/// Fit the irreversible esterification rate law to conversion data.
#[derive(Debug, Parser)]
#[command(name = "kinfit", version, about)]
pub struct Cli {
    /// JSON run configuration; the reference dataset is used when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write the HTML chart here instead of the configured path.
    #[arg(long, conflicts_with = "no_plot")]
    pub plot: Option<PathBuf>,

    /// Do not write a chart.
    #[arg(long)]
    pub no_plot: bool,

    /// Points on the dense plotting grid.
    #[arg(long)]
    pub dense_points: Option<usize>,

    /// Residual evaluation budget for the fit.
    #[arg(long)]
    pub max_evals: Option<usize>,

    /// Evaluate Jacobian columns sequentially.
    #[arg(long)]
    pub serial: bool,

    /// Print the effective configuration as JSON and exit.
    #[arg(long)]
    pub print_config: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// `log` filter implied by the `-v` count.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Command-line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut RunConfig) {
        if self.no_plot {
            config.plot_path = None;
        } else if let Some(path) = &self.plot {
            config.plot_path = Some(path.clone());
        }
        if let Some(n) = self.dense_points {
            config.dense_points = n;
        }
        if let Some(n) = self.max_evals {
            config.fitter.lm.max_function_evals = n;
        }
        if self.serial {
            config.fitter.lm.parallel_jacobian = false;
        }
    }

    pub fn load_config(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_path(path)?,
            None => RunConfig::default(),
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }
}

/// Run the command described by `cli`.
pub fn run(cli: &Cli) -> Result<()> {
    let config = cli.load_config()?;
    if cli.print_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    let output = pipeline::run(&config)?;

    let mut reporters: Vec<Box<dyn FitReporter>> = vec![Box::new(TextReporter::stdout())];
    if let Some(path) = &config.plot_path {
        #[cfg(feature = "plot")]
        reporters.push(Box::new(crate::report::PlotlyReporter::new(path)));
        #[cfg(not(feature = "plot"))]
        warn!(
            "built without the `plot` feature, no chart written to {}",
            path.display()
        );
    }
    for warning in &output.warnings {
        warn!("{warning}");
    }
    output.publish(&config.data, &mut reporters)
}
