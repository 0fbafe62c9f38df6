mod integrator;
mod lm_algorithm;
