//! Convergence criteria for the Levenberg-Marquardt solver.
//!
//! The tests follow the MINPACK conventions: a relative cost test, a relative
//! step test and a scaled-gradient (orthogonality) test.

use super::config::LmConfig;
use ndarray::{Array1, Array2, Axis};

/// Possible convergence states for an optimization algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceStatus {
    /// The algorithm is still running.
    Running,

    /// The algorithm has converged due to a small parameter change.
    ParameterConvergence,

    /// The algorithm has converged due to a small function value change.
    FunctionValueConvergence,

    /// The algorithm has converged due to a small gradient.
    GradientConvergence,

    /// The residuals vanished exactly.
    ZeroResidual,

    /// The algorithm has terminated due to reaching the maximum number of iterations.
    MaxIterationsReached,

    /// The damping saturated without finding a descent step.
    Stalled,
}

impl ConvergenceStatus {
    /// Returns true if the optimization has terminated (either converged or failed).
    pub fn is_terminated(&self) -> bool {
        !matches!(self, ConvergenceStatus::Running)
    }

    /// Returns true if the optimization has converged.
    pub fn is_converged(&self) -> bool {
        matches!(
            self,
            ConvergenceStatus::ParameterConvergence
                | ConvergenceStatus::FunctionValueConvergence
                | ConvergenceStatus::GradientConvergence
                | ConvergenceStatus::ZeroResidual
        )
    }

    /// Returns a description of the convergence status.
    pub fn description(&self) -> &'static str {
        match self {
            ConvergenceStatus::Running => "Optimization is still running",
            ConvergenceStatus::ParameterConvergence => "Converged: small parameter change",
            ConvergenceStatus::FunctionValueConvergence => "Converged: small function value change",
            ConvergenceStatus::GradientConvergence => "Converged: small gradient",
            ConvergenceStatus::ZeroResidual => "Converged: residuals vanished",
            ConvergenceStatus::MaxIterationsReached => "Terminated: maximum iterations reached",
            ConvergenceStatus::Stalled => "Terminated: damping saturated without descent",
        }
    }
}

/// Criteria for determining when an optimization algorithm has converged.
#[derive(Debug, Clone)]
pub struct ConvergenceCriteria {
    /// Tolerance for the relative step size.
    pub xtol: f64,

    /// Tolerance for the relative change in cost.
    pub ftol: f64,

    /// Tolerance for the scaled gradient.
    pub gtol: f64,

    /// Maximum number of iterations.
    pub max_iterations: usize,
}

impl Default for ConvergenceCriteria {
    fn default() -> Self {
        Self::from_config(&LmConfig::default())
    }
}

impl ConvergenceCriteria {
    pub fn from_config(config: &LmConfig) -> Self {
        Self {
            xtol: config.xtol,
            ftol: config.ftol,
            gtol: config.gtol,
            max_iterations: config.max_iterations,
        }
    }

    /// Scaled-gradient test at the current point.
    ///
    /// Measures the largest cosine between a Jacobian column and the residual
    /// vector; columns that are identically zero are skipped.
    pub fn check_gradient(&self, jacobian: &Array2<f64>, residuals: &Array1<f64>, cost: f64) -> ConvergenceStatus {
        if cost == 0.0 {
            return ConvergenceStatus::ZeroResidual;
        }

        let residual_norm = cost.sqrt();
        let gradient = jacobian.t().dot(residuals);
        let scaled = Self::column_norms(jacobian)
            .iter()
            .zip(gradient.iter())
            .filter(|(column_norm, _)| **column_norm > 0.0)
            .map(|(column_norm, g)| g.abs() / (column_norm * residual_norm))
            .fold(0.0_f64, f64::max);

        if scaled <= self.gtol {
            ConvergenceStatus::GradientConvergence
        } else {
            ConvergenceStatus::Running
        }
    }

    /// Euclidean norm of every Jacobian column.
    pub fn column_norms(jacobian: &Array2<f64>) -> Array1<f64> {
        jacobian
            .axis_iter(Axis(1))
            .map(|column| column.dot(&column).sqrt())
            .collect()
    }

    /// Checks a trial step, whether or not it was accepted.
    ///
    /// The step test compares `|D * step|` against `|D * params|`, where `D`
    /// holds the Jacobian column norms, so parameters the residuals no longer
    /// respond to do not hold the iteration open.
    ///
    /// # Arguments
    ///
    /// * `params` - The parameters the step was taken from
    /// * `step` - The trial step
    /// * `scale` - Jacobian column norms at `params`
    /// * `cost` - The cost at `params`
    /// * `new_cost` - The cost after the step
    /// * `predicted_reduction` - The reduction predicted by the linear model
    pub fn check_step(
        &self,
        params: &Array1<f64>,
        step: &Array1<f64>,
        scale: &Array1<f64>,
        cost: f64,
        new_cost: f64,
        predicted_reduction: f64,
    ) -> ConvergenceStatus {
        if new_cost == 0.0 {
            return ConvergenceStatus::ZeroResidual;
        }

        if new_cost.is_finite() {
            let actual = (cost - new_cost) / cost;
            let predicted = predicted_reduction / cost;
            if actual.abs() <= self.ftol && predicted <= self.ftol && actual <= 2.0 * predicted {
                return ConvergenceStatus::FunctionValueConvergence;
            }
        }

        let param_norm = (scale * params).dot(&(scale * params)).sqrt();
        let step_norm = (scale * step).dot(&(scale * step)).sqrt();
        if step_norm <= self.xtol * (param_norm + self.xtol) {
            return ConvergenceStatus::ParameterConvergence;
        }

        ConvergenceStatus::Running
    }
}
