//! Integration tests for the Levenberg-Marquardt solver.

use approx::assert_relative_eq;
use cvfit_rs::bounds::{BoundedProblem, Bounds};
use cvfit_rs::lm::{ConvergenceStatus, LevenbergMarquardt, LmConfig};
use cvfit_rs::{CvFitError, Problem, Result};
use ndarray::{array, Array1, Array2};

/// Test Problem: f(x) = a*x + b with an analytic Jacobian
struct LinearProblem {
    x_data: Array1<f64>,
    y_data: Array1<f64>,
}

impl Problem for LinearProblem {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        if params.len() != 2 {
            return Err(CvFitError::DimensionMismatch(format!(
                "Expected 2 parameters, got {}",
                params.len()
            )));
        }

        Ok(self
            .x_data
            .iter()
            .zip(self.y_data.iter())
            .map(|(x, y)| params[0] * x + params[1] - y)
            .collect())
    }

    fn parameter_count(&self) -> usize {
        2
    }

    fn residual_count(&self) -> usize {
        self.x_data.len()
    }

    fn jacobian(&self, _params: &Array1<f64>) -> Result<Array2<f64>> {
        let mut jac = Array2::ones((self.x_data.len(), 2));
        jac.column_mut(0).assign(&self.x_data);
        Ok(jac)
    }
}

/// Test Problem: y = k / sqrt(x - x0), the shape the diffusion fits use
struct InverseRootProblem {
    x_data: Array1<f64>,
    y_data: Array1<f64>,
}

impl InverseRootProblem {
    fn generate(k: f64, x0: f64) -> Self {
        let x_data = Array1::linspace(2.0, 8.0, 60);
        let y_data = x_data.mapv(|x| k / (x - x0).sqrt());
        Self { x_data, y_data }
    }
}

impl Problem for InverseRootProblem {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        Ok(self
            .x_data
            .iter()
            .zip(self.y_data.iter())
            .map(|(x, y)| params[0] / (x - params[1]).sqrt() - y)
            .collect())
    }

    fn parameter_count(&self) -> usize {
        2
    }

    fn residual_count(&self) -> usize {
        self.x_data.len()
    }
}

#[test]
fn test_linear_fit() {
    let problem = LinearProblem {
        x_data: array![1.0, 2.0, 3.0, 4.0, 5.0],
        y_data: array![3.0, 5.0, 7.0, 9.0, 11.0],
    };

    let result = LevenbergMarquardt::new()
        .minimize(&problem, array![0.0, 0.0])
        .unwrap();

    assert!(result.success);
    assert_relative_eq!(result.params[0], 2.0, epsilon = 1e-6);
    assert_relative_eq!(result.params[1], 1.0, epsilon = 1e-6);
    assert!(result.cost < 1e-10);
}

#[test]
fn test_inverse_root_fit_with_finite_differences() {
    let problem = InverseRootProblem::generate(4.0, 0.7);

    let result = LevenbergMarquardt::new()
        .minimize(&problem, array![1.0, 0.0])
        .unwrap();

    assert!(result.success, "status: {:?}", result.status);
    assert_relative_eq!(result.params[0], 4.0, epsilon = 1e-5);
    assert_relative_eq!(result.params[1], 0.7, epsilon = 1e-5);
}

#[test]
fn test_bounded_fit_pins_parameter_at_bound() {
    // True offset is negative, the bound forces it to zero
    let problem = InverseRootProblem::generate(4.0, -0.5);
    let bounds = vec![Bounds::unbounded(), Bounds::new(0.0, 1.5).unwrap()];
    let bounded = BoundedProblem::new(&problem, &bounds).unwrap();

    let start = bounded.to_internal(&array![1.0, 0.75]).unwrap();
    let result = LevenbergMarquardt::new().minimize(&bounded, start).unwrap();
    let params = bounded.to_external(&result.params);

    assert!(params[1] >= 0.0 && params[1] < 0.05, "t0 = {}", params[1]);
    assert!(params[0] > 3.5 && params[0] < 4.5);
}

#[test]
fn test_iteration_limit_is_reported() {
    let problem = InverseRootProblem::generate(4.0, 0.7);
    let config = LmConfig {
        max_iterations: 1,
        ..LmConfig::default()
    };

    let result = LevenbergMarquardt::with_config(config)
        .minimize(&problem, array![1.0, 0.0])
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.status, ConvergenceStatus::MaxIterationsReached);
}

#[test]
fn test_parameter_count_mismatch() {
    let problem = InverseRootProblem::generate(4.0, 0.7);
    let result = LevenbergMarquardt::new().minimize(&problem, array![1.0]);
    assert!(matches!(result, Err(CvFitError::DimensionMismatch(_))));
}
