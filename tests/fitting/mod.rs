mod fitter;
mod metrics;
