//! Step calculation for the Levenberg-Marquardt algorithm.
//!
//! This module provides functionality for computing the Levenberg-Marquardt step,
//! which blends the Gauss-Newton and gradient descent directions.

use crate::lm::trust_region::TrustRegion;
use crate::utils::matrix_convert::{faer_vec_to_ndarray, ndarray_to_faer, ndarray_vec_to_faer};
use faer::prelude::*;
use faer::Side;
use ndarray::{Array1, Array2};

/// Result of a Levenberg-Marquardt step calculation.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// The calculated step vector
    pub step: Array1<f64>,

    /// The reduction in cost predicted by the linearized model
    pub predicted_reduction: f64,

    /// The damping parameter used to calculate the step
    pub lambda: f64,
}

/// Handles step calculation for the Levenberg-Marquardt algorithm.
pub struct LmStep;

impl LmStep {
    /// Calculates the damped step from the current Jacobian and residuals.
    ///
    /// Solves `(JᵀJ + λ·D) δ = -Jᵀr`, where `D` is the diagonal of `JᵀJ`
    /// (Marquardt scaling). Returns `None` if the damped system is not
    /// positive definite, in which case the caller should raise λ.
    pub fn calculate_step(
        jacobian: &Array2<f64>,
        residuals: &Array1<f64>,
        trust_region: &TrustRegion,
    ) -> Option<StepResult> {
        let j_t_j = jacobian.t().dot(jacobian);
        let j_t_r = jacobian.t().dot(residuals);

        let max_diag = j_t_j.diag().iter().fold(0.0_f64, |acc, &d| acc.max(d));
        let floor = (max_diag * 1e-12).max(f64::MIN_POSITIVE);

        let mut augmented = j_t_j;
        for i in 0..augmented.nrows() {
            let d = augmented[[i, i]].max(floor);
            augmented[[i, i]] += trust_region.lambda * d;
        }

        let step = Self::solve_cholesky(&augmented, &-&j_t_r)?;
        if step.iter().any(|v| !v.is_finite()) {
            return None;
        }

        let predicted_reduction = Self::predicted_reduction(jacobian, residuals, &step);

        Some(StepResult {
            step,
            predicted_reduction,
            lambda: trust_region.lambda,
        })
    }

    /// Solves the symmetric positive definite system `A x = b` through a
    /// faer LLᵀ factorisation. `None` if `A` is not positive definite.
    fn solve_cholesky(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
        let llt = ndarray_to_faer(a).llt(Side::Lower).ok()?;
        let x = llt.solve(&ndarray_vec_to_faer(b));
        Some(faer_vec_to_ndarray(&x))
    }

    /// Cost reduction predicted by the linear model: `‖r‖² - ‖r + Jδ‖²`.
    fn predicted_reduction(jacobian: &Array2<f64>, residuals: &Array1<f64>, step: &Array1<f64>) -> f64 {
        let linearized = residuals + &jacobian.dot(step);
        residuals.dot(residuals) - linearized.dot(&linearized)
    }
}
