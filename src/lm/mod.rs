//! Levenberg-Marquardt algorithm implementation.
//!
//! This module provides the damped Gauss-Newton solver used for every
//! nonlinear fit in the crate. Bounds are handled outside the solver by
//! [`crate::bounds::BoundedProblem`].

pub mod algorithm;
pub mod config;
pub mod convergence;
pub mod step;
pub mod trust_region;

// Re-export key types
pub use algorithm::{LevenbergMarquardt, LmResult};
pub use config::LmConfig;
pub use convergence::{ConvergenceCriteria, ConvergenceStatus};
pub use step::{LmStep, StepResult};
pub use trust_region::TrustRegion;
