//! Implicit integration of the conversion ODE.
//!
//! Rate laws with a squared adsorption denominator switch from a steep initial
//! transient to a slow tail, so the integrator is an L-stable SDIRK scheme
//! with adaptive steps rather than an explicit Runge-Kutta pair.
//!
//! - [`OdeSystem`] describes `dy/dt = f(t, y)`
//! - [`OdeOptions`] holds tolerances, step bounds and budgets
//! - [`integrate_at`] returns the state at exactly the requested times

pub mod options;
pub mod sdirk;

use nalgebra::DMatrix;

pub use options::OdeOptions;
pub use sdirk::{integrate_at, OdeSolution, OdeStats};

/// Right-hand side of an ODE system `dy/dt = f(t, y)`.
pub trait OdeSystem {
    /// Number of state variables.
    fn ndim(&self) -> usize;

    /// Evaluate `f(t, y)` into `dydt`; both slices have length `ndim()`.
    fn rhs(&self, t: f64, y: &[f64], dydt: &mut [f64]);

    /// Jacobian `∂f/∂y` at `(t, y)`.
    ///
    /// The default uses central finite differences (2·n RHS evaluations).
    fn jacobian(&self, t: f64, y: &[f64], jac: &mut DMatrix<f64>) {
        let n = self.ndim();
        let mut yp = y.to_vec();
        let mut fp = vec![0.0; n];
        let mut fm = vec![0.0; n];
        if jac.nrows() != n || jac.ncols() != n {
            *jac = DMatrix::zeros(n, n);
        }
        for j in 0..n {
            let orig = yp[j];
            let h = 1e-8 * (1.0 + orig.abs());
            yp[j] = orig + h;
            self.rhs(t, &yp, &mut fp);
            yp[j] = orig - h;
            self.rhs(t, &yp, &mut fm);
            yp[j] = orig;
            for i in 0..n {
                jac[(i, j)] = (fp[i] - fm[i]) / (2.0 * h);
            }
        }
    }
}

/// A one-dimensional system given as a closure `(t, y) -> dy/dt`.
pub struct ScalarOde<F>
where
    F: Fn(f64, f64) -> f64,
{
    f: F,
}

impl<F> ScalarOde<F>
where
    F: Fn(f64, f64) -> f64,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> OdeSystem for ScalarOde<F>
where
    F: Fn(f64, f64) -> f64,
{
    fn ndim(&self) -> usize {
        1
    }

    fn rhs(&self, t: f64, y: &[f64], dydt: &mut [f64]) {
        dydt[0] = (self.f)(t, y[0]);
    }
}
