//! Numerical helpers shared by the solver.

pub mod finite_difference;
pub mod matrix_convert;
