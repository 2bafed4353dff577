//! Implementation of the Levenberg-Marquardt algorithm.
//!
//! This module contains the core solver loop for nonlinear least-squares
//! optimization with adaptive damping.

use log::{debug, trace};
use ndarray::Array1;

use crate::error::{CvFitError, Result};
use crate::problem::Problem;

use super::config::LmConfig;
use super::convergence::{ConvergenceCriteria, ConvergenceStatus};
use super::step::LmStep;
use super::trust_region::TrustRegion;

/// Result of the Levenberg-Marquardt optimization.
#[derive(Debug, Clone)]
pub struct LmResult {
    /// Optimized parameter values
    pub params: Array1<f64>,

    /// Residuals at the solution
    pub residuals: Array1<f64>,

    /// Sum of squared residuals
    pub cost: f64,

    /// Number of iterations performed
    pub iterations: usize,

    /// Number of function evaluations
    pub func_evals: usize,

    /// Whether the optimization succeeded
    pub success: bool,

    /// How the solver terminated
    pub status: ConvergenceStatus,
}

/// The Levenberg-Marquardt optimizer.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    /// Configuration options
    config: LmConfig,
}

impl LevenbergMarquardt {
    /// Create a new Levenberg-Marquardt optimizer with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new Levenberg-Marquardt optimizer with the given configuration.
    pub fn with_config(config: LmConfig) -> Self {
        Self { config }
    }

    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Minimize the sum of squared residuals for the given problem.
    ///
    /// Non-convergence is reported through [`LmResult::success`]; an error is
    /// only returned when the problem cannot be evaluated at all.
    ///
    /// # Arguments
    ///
    /// * `problem` - The problem to solve
    /// * `initial_params` - Initial guess for the parameter values
    pub fn minimize<P: Problem + ?Sized>(
        &self,
        problem: &P,
        initial_params: Array1<f64>,
    ) -> Result<LmResult> {
        let n_params = problem.parameter_count();
        if initial_params.len() != n_params {
            return Err(CvFitError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                n_params,
                initial_params.len()
            )));
        }

        let mut params = initial_params;
        let mut residuals = problem.eval(&params)?;
        let mut cost: f64 = residuals.iter().map(|r| r.powi(2)).sum();
        let mut func_evals = 1;

        if !cost.is_finite() {
            return Err(CvFitError::Fitting(format!(
                "Non-finite cost at the initial parameters {:?}",
                params
            )));
        }

        let criteria = ConvergenceCriteria::from_config(&self.config);
        let mut trust_region = TrustRegion::from_config(&self.config);
        let mut iterations = 0;

        let status = 'outer: loop {
            if iterations >= self.config.max_iterations {
                break ConvergenceStatus::MaxIterationsReached;
            }

            let jacobian = problem.jacobian(&params)?;
            func_evals += n_params;

            let status = criteria.check_gradient(&jacobian, &residuals, cost);
            if status.is_terminated() {
                break status;
            }
            let scale = ConvergenceCriteria::column_norms(&jacobian);

            // Raise the damping until a step is accepted or a stopping test fires
            loop {
                let Some(step) = LmStep::calculate_step(&jacobian, &residuals, &trust_region) else {
                    trust_region.update_lambda(0.0);
                    if trust_region.is_saturated() {
                        break 'outer ConvergenceStatus::Stalled;
                    }
                    continue;
                };

                let new_params = &params + &step.step;
                let new_residuals = problem.eval(&new_params)?;
                func_evals += 1;
                let new_cost: f64 = new_residuals.iter().map(|r| r.powi(2)).sum();

                let gain = TrustRegion::gain_ratio(cost, new_cost, step.predicted_reduction);
                let status =
                    criteria.check_step(&params, &step.step, &scale, cost, new_cost, step.predicted_reduction);
                let saturated_before = trust_region.is_saturated();
                let accepted = trust_region.update_lambda(gain);

                trace!(
                    "iteration {}: cost {:.6e} -> {:.6e}, lambda {:.1e}, accepted {}",
                    iterations,
                    cost,
                    new_cost,
                    step.lambda,
                    accepted
                );

                if accepted {
                    params = new_params;
                    residuals = new_residuals;
                    cost = new_cost;
                }

                if status.is_terminated() {
                    iterations += 1;
                    break 'outer status;
                }
                if accepted {
                    break;
                }
                if saturated_before {
                    break 'outer ConvergenceStatus::Stalled;
                }
            }

            iterations += 1;
        };

        debug!(
            "Levenberg-Marquardt finished after {} iterations ({} evaluations): {}, cost {:.6e}",
            iterations,
            func_evals,
            status.description(),
            cost
        );

        Ok(LmResult {
            params,
            residuals,
            cost,
            iterations,
            func_evals,
            success: status.is_converged(),
            status,
        })
    }
}
