//! Two-stage L-stable SDIRK integrator with embedded error estimate.
//!
//! Butcher tableau, γ = 1 − 1/√2:
//!
//! ```text
//!   γ  |  γ     0
//!   1  |  1-γ   γ
//!  ----+-----------
//!   b  |  1-γ   γ     (2nd order, advances the solution)
//!   b* |  1     0     (1st order, error estimate)
//! ```
//!
//! Each stage is solved with a simplified Newton iteration on `(I − hγJ)`.
//! Steps are clipped so that every requested output time is hit exactly.

use log::trace;
use nalgebra::{DMatrix, DVector};

use super::{OdeOptions, OdeSystem};
use crate::data::validate_times;
use crate::error::{KinOptError, Result};

const GAMMA: f64 = 1.0 - std::f64::consts::FRAC_1_SQRT_2;

/// Newton corrections are accepted once their weighted RMS norm drops below
/// this fraction of the error tolerance.
const NEWTON_TOL: f64 = 0.01;

/// Work counters of one integration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OdeStats {
    pub accepted_steps: usize,
    pub rejected_steps: usize,
    pub newton_failures: usize,
}

/// States at the requested output times.
#[derive(Debug, Clone)]
pub struct OdeSolution {
    pub t: Vec<f64>,
    pub y: Vec<Vec<f64>>,
    pub stats: OdeStats,
}

impl OdeSolution {
    /// Component `i` of the state at every output time.
    pub fn component(&self, i: usize) -> Vec<f64> {
        self.y.iter().map(|state| state[i]).collect()
    }
}

/// Integrate `sys` from `t = 0` with state `y0` and return the state at each
/// entry of `times`.
///
/// `times` must be non-empty, finite, non-negative and strictly increasing.
/// An output at `t = 0` is `y0` exactly.
///
/// # Errors
///
/// - [`KinOptError::InvalidInput`] for malformed times, options or `y0`
/// - [`KinOptError::IntegrationFailure`] when derivatives become non-finite,
///   the step size underflows `h_min`, or `max_steps` is exhausted
pub fn integrate_at<S: OdeSystem + ?Sized>(
    sys: &S,
    y0: &[f64],
    times: &[f64],
    opts: &OdeOptions,
) -> Result<OdeSolution> {
    opts.validate()?;
    validate_times(times)?;
    let n = sys.ndim();
    if y0.len() != n {
        return Err(KinOptError::InvalidInput(format!(
            "initial state has {} entries but the system has {n}",
            y0.len()
        )));
    }
    if y0.iter().any(|v| !v.is_finite()) {
        return Err(KinOptError::InvalidInput(
            "initial state must be finite".to_string(),
        ));
    }

    let mut sol = OdeSolution {
        t: Vec::with_capacity(times.len()),
        y: Vec::with_capacity(times.len()),
        stats: OdeStats::default(),
    };

    let mut next = 0;
    while next < times.len() && times[next] == 0.0 {
        sol.t.push(0.0);
        sol.y.push(y0.to_vec());
        next += 1;
    }
    if next == times.len() {
        return Ok(sol);
    }

    let t_end = times[times.len() - 1];
    let mut t = 0.0;
    let mut y = y0.to_vec();
    let mut h = opts.initial_step(t_end);

    let mut jac = DMatrix::zeros(n, n);
    let mut f0 = vec![0.0; n];
    let mut k1 = vec![0.0; n];
    let mut k2 = vec![0.0; n];
    let mut stage_y = vec![0.0; n];
    let mut rhs_buf = vec![0.0; n];
    let mut y_new = vec![0.0; n];

    for _attempt in 0..opts.max_steps {
        let target = times[next];
        let gap = target - t;
        let landing = h >= gap;
        let h_step = if landing { gap } else { h.min(opts.h_max) };

        if !landing && h_step < opts.h_min {
            return Err(KinOptError::IntegrationFailure(format!(
                "step size {h_step:.3e} fell below h_min = {:.3e} at t = {t:.6e}",
                opts.h_min
            )));
        }

        sys.rhs(t, &y, &mut f0);
        if f0.iter().any(|v| !v.is_finite()) {
            return Err(KinOptError::IntegrationFailure(format!(
                "non-finite derivative at t = {t:.6e}"
            )));
        }

        // Iteration matrix (I - hγJ), factored once per attempt.
        let hg = h_step * GAMMA;
        sys.jacobian(t, &y, &mut jac);
        let iteration_matrix =
            DMatrix::from_fn(n, n, |i, j| (if i == j { 1.0 } else { 0.0 }) - hg * jac[(i, j)]);
        let lu = iteration_matrix.lu();
        if !lu.is_invertible() {
            sol.stats.newton_failures += 1;
            h = h_step * 0.5;
            continue;
        }

        let solve = |residual: &mut [f64]| -> bool {
            match lu.solve(&DVector::from_column_slice(residual)) {
                Some(delta) => {
                    residual.copy_from_slice(delta.as_slice());
                    true
                }
                None => false,
            }
        };

        // Stage 1: k1 = f(t + γh, y + hγ k1)
        k1.copy_from_slice(&f0);
        let stage1_ok = newton_stage(
            &mut k1,
            |k, out| {
                for i in 0..n {
                    stage_y[i] = y[i] + hg * k[i];
                }
                sys.rhs(t + GAMMA * h_step, &stage_y, out);
            },
            &solve,
            &mut rhs_buf,
            &y,
            opts,
        );

        // Stage 2: k2 = f(t + h, y + h(1-γ) k1 + hγ k2)
        let stage2_ok = stage1_ok && {
            k2.copy_from_slice(&k1);
            newton_stage(
                &mut k2,
                |k, out| {
                    for i in 0..n {
                        stage_y[i] = y[i] + h_step * (1.0 - GAMMA) * k1[i] + hg * k[i];
                    }
                    sys.rhs(t + h_step, &stage_y, out);
                },
                &solve,
                &mut rhs_buf,
                &y,
                opts,
            )
        };

        if !stage2_ok {
            sol.stats.newton_failures += 1;
            h = h_step * 0.5;
            if h < opts.h_min {
                return Err(KinOptError::IntegrationFailure(format!(
                    "Newton iteration failed to converge at t = {t:.6e}"
                )));
            }
            continue;
        }

        // Embedded estimate filtered through (I - hγJ)⁻¹ so that stiff,
        // already-damped modes do not limit the step.
        let raw_err = DVector::from_fn(n, |i, _| hg * (k2[i] - k1[i]));
        let err = lu.solve(&raw_err).unwrap_or(raw_err);

        let mut err_norm = 0.0;
        for i in 0..n {
            y_new[i] = y[i] + h_step * ((1.0 - GAMMA) * k1[i] + GAMMA * k2[i]);
            let sc = opts.atol + opts.rtol * y[i].abs().max(y_new[i].abs());
            err_norm += (err[i] / sc) * (err[i] / sc);
        }
        err_norm = (err_norm / n as f64).sqrt();

        if !err_norm.is_finite() {
            sol.stats.rejected_steps += 1;
            h = h_step * 0.25;
            continue;
        }

        if err_norm <= 1.0 {
            sol.stats.accepted_steps += 1;
            t = if landing { target } else { t + h_step };
            y.copy_from_slice(&y_new);

            if landing {
                sol.t.push(target);
                sol.y.push(y.clone());
                next += 1;
                if next == times.len() {
                    trace!(
                        "integration finished: {} accepted, {} rejected, {} Newton failures",
                        sol.stats.accepted_steps,
                        sol.stats.rejected_steps,
                        sol.stats.newton_failures
                    );
                    return Ok(sol);
                }
            }
        } else {
            sol.stats.rejected_steps += 1;
        }

        // Embedded estimate is first order: local error ~ h^2.
        let factor = if err_norm == 0.0 {
            5.0
        } else {
            (0.9 / err_norm.sqrt()).clamp(0.2, 5.0)
        };
        h = (h_step * factor).min(opts.h_max);
    }

    Err(KinOptError::IntegrationFailure(format!(
        "exceeded max_steps = {} at t = {t:.6e} before reaching t = {t_end:.6e}",
        opts.max_steps
    )))
}

/// Simplified Newton iteration for one implicit stage `k = g(k)`.
///
/// Returns `false` if the iteration produced non-finite values or did not
/// converge within the configured number of iterations.
fn newton_stage<G, L>(
    k: &mut [f64],
    mut stage_rhs: G,
    solve: &L,
    rhs_buf: &mut [f64],
    y: &[f64],
    opts: &OdeOptions,
) -> bool
where
    G: FnMut(&[f64], &mut [f64]),
    L: Fn(&mut [f64]) -> bool,
{
    let n = k.len();
    for _ in 0..opts.max_newton_iterations {
        stage_rhs(k, rhs_buf);
        for i in 0..n {
            rhs_buf[i] -= k[i];
        }
        if !solve(rhs_buf) {
            return false;
        }

        let mut cnorm = 0.0;
        for i in 0..n {
            k[i] += rhs_buf[i];
            let sc = opts.atol + opts.rtol * y[i].abs();
            cnorm += (rhs_buf[i] / sc) * (rhs_buf[i] / sc);
        }
        cnorm = (cnorm / n as f64).sqrt();

        if !cnorm.is_finite() {
            return false;
        }
        if cnorm < NEWTON_TOL {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ode::ScalarOde;
    use approx::assert_relative_eq;

    #[test]
    fn test_exponential_decay() {
        let sys = ScalarOde::new(|_t, y| -0.5 * y);
        let times = [0.0, 1.0, 2.0, 4.0, 8.0];
        let sol = integrate_at(&sys, &[1.0], &times, &OdeOptions::default()).unwrap();

        assert_eq!(sol.t, times.to_vec());
        for (t, y) in sol.t.iter().zip(sol.component(0)) {
            assert_relative_eq!(y, (-0.5 * t).exp(), max_relative = 1e-4);
        }
    }

    #[test]
    fn test_stiff_relaxation() {
        // y' = -1000 (y - cos t): explicit methods need h < 2e-3 throughout
        let sys = ScalarOde::new(|t: f64, y| -1000.0 * (y - t.cos()));
        let times = [0.5, 1.0, 2.0];
        let sol = integrate_at(&sys, &[0.0], &times, &OdeOptions::default()).unwrap();

        for (t, y) in sol.t.iter().zip(sol.component(0)) {
            // quasi-steady state: y ≈ cos t + sin t / 1000
            assert_relative_eq!(y, t.cos() + t.sin() / 1000.0, epsilon = 1e-4);
        }
        assert!(sol.stats.accepted_steps < 2_000);
    }

    #[test]
    fn test_initial_time_returns_initial_state() {
        let sys = ScalarOde::new(|_t, _y| 3.0);
        let sol = integrate_at(&sys, &[0.25], &[0.0, 2.0], &OdeOptions::default()).unwrap();

        assert_eq!(sol.y[0][0], 0.25);
        assert_relative_eq!(sol.y[1][0], 6.25, max_relative = 1e-10);
    }

    #[test]
    fn test_only_zero_time() {
        let sys = ScalarOde::new(|_t, _y| 1.0);
        let sol = integrate_at(&sys, &[0.0], &[0.0], &OdeOptions::default()).unwrap();
        assert_eq!(sol.y, vec![vec![0.0]]);
        assert_eq!(sol.stats.accepted_steps, 0);
    }

    #[test]
    fn test_rejects_unordered_times() {
        let sys = ScalarOde::new(|_t, y| -y);
        let opts = OdeOptions::default();

        let cases: [&[f64]; 4] = [&[0.0, 2.0, 1.0], &[0.0, 1.0, 1.0], &[-1.0, 1.0], &[]];
        for times in cases {
            assert!(matches!(
                integrate_at(&sys, &[1.0], times, &opts),
                Err(KinOptError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_rejects_wrong_initial_state() {
        let sys = ScalarOde::new(|_t, y| -y);
        let result = integrate_at(&sys, &[1.0, 2.0], &[1.0], &OdeOptions::default());
        assert!(matches!(result, Err(KinOptError::InvalidInput(_))));
    }

    #[test]
    fn test_non_finite_derivative_is_failure() {
        let sys = ScalarOde::new(|_t, y| if y > 0.5 { f64::NAN } else { 1.0 });
        let result = integrate_at(&sys, &[0.0], &[0.4, 2.0], &OdeOptions::default());
        assert!(matches!(result, Err(KinOptError::IntegrationFailure(_))));
    }

    #[test]
    fn test_step_budget_is_failure() {
        let sys = ScalarOde::new(|t: f64, _y| (50.0 * t).sin());
        let opts = OdeOptions::default().with_max_steps(5);
        let result = integrate_at(&sys, &[0.0], &[100.0], &opts);
        assert!(matches!(result, Err(KinOptError::IntegrationFailure(_))));
    }
}
