//! Numerical helpers shared by the optimizer and the uncertainty estimates.

pub mod finite_difference;
pub mod matrix_convert;
#[cfg(feature = "parallel")]
pub mod parallel;

pub use finite_difference::jacobian;
pub use matrix_convert::{
    nalgebra_to_ndarray, nalgebra_vec_to_ndarray, ndarray_to_nalgebra, ndarray_vec_to_nalgebra,
};

#[cfg(feature = "parallel")]
pub use parallel::jacobian_parallel;
