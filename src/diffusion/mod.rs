//! Diffusion-current models and their fitting.
//!
//! [`model`] holds the pure piecewise model functions, [`fitter`] the bounded
//! least squares fit and the adaptive fitting-range search.

pub mod fitter;
pub mod model;

pub use fitter::{DiffusionFitter, FitResult, RangeSearch, TARGET_R_SQUARED};
pub use model::{DiffusionModel, DiffusionProblem, ModelContext};
