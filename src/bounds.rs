//! Parameter bounds for constrained fitting.
//!
//! Bounds are enforced with the Minuit-style parameter transformation: the
//! optimizer works on unbounded internal values while the model only ever
//! sees external values inside `[min, max]`.

use crate::error::Result;
use crate::problem::Problem;
use ndarray::Array1;
use std::f64::{INFINITY, NEG_INFINITY};
use thiserror::Error;

/// Errors that can occur when working with parameter bounds
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundsError {
    #[error("Invalid bounds: min ({min}) must not exceed max ({max})")]
    InvalidBounds { min: f64, max: f64 },

    #[error("Parameter value {value} is outside bounds: [{min}, {max}]")]
    ValueOutsideBounds { value: f64, min: f64, max: f64 },

    #[error("Infinite parameter value is not allowed")]
    InfiniteValue,
}

/// Closed interval a parameter is constrained to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Minimum allowed value for the parameter
    pub min: f64,

    /// Maximum allowed value for the parameter
    pub max: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: NEG_INFINITY,
            max: INFINITY,
        }
    }
}

impl Bounds {
    /// Create a new bounds constraint with min and max values
    ///
    /// # Examples
    ///
    /// ```
    /// use cvfit_rs::bounds::Bounds;
    ///
    /// let bounds = Bounds::new(0.0, 10.0).unwrap();
    /// assert_eq!(bounds.min, 0.0);
    /// assert_eq!(bounds.max, 10.0);
    /// assert!(Bounds::new(1.0, 0.0).is_err());
    /// ```
    pub fn new(min: f64, max: f64) -> std::result::Result<Self, BoundsError> {
        if min.is_nan() || max.is_nan() || min > max {
            return Err(BoundsError::InvalidBounds { min, max });
        }

        Ok(Self { min, max })
    }

    /// Create an unbounded constraint (negative infinity to positive infinity)
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Check if a value is within the bounds
    pub fn is_within_bounds(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Check if the parameter is bounded from below
    pub fn has_lower_bound(&self) -> bool {
        self.min.is_finite()
    }

    /// Check if the parameter is bounded from above
    pub fn has_upper_bound(&self) -> bool {
        self.max.is_finite()
    }

    /// Midpoint of a finite interval, the lower end of a half-open one,
    /// or zero when unbounded.
    pub fn center(&self) -> f64 {
        match (self.has_lower_bound(), self.has_upper_bound()) {
            (true, true) => 0.5 * (self.min + self.max),
            (true, false) => self.min,
            (false, true) => self.max,
            (false, false) => 0.0,
        }
    }
}

/// Implements the Minuit-style parameter transformations for handling bounds constraints
///
/// This allows the optimizer to work with unbounded parameters internally, while the
/// external values are constrained to be within the specified bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsTransform {
    bounds: Bounds,
}

impl BoundsTransform {
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }

    /// Transform an internal parameter value to an external value
    pub fn to_external(&self, internal_value: f64) -> f64 {
        match (self.bounds.has_lower_bound(), self.bounds.has_upper_bound()) {
            (false, false) => internal_value,
            (true, false) => self.bounds.min - 1.0 + (internal_value * internal_value + 1.0).sqrt(),
            (false, true) => self.bounds.max + 1.0 - (internal_value * internal_value + 1.0).sqrt(),
            (true, true) => {
                let bound_range = self.bounds.max - self.bounds.min;
                self.bounds.min + (internal_value.sin() + 1.0) * bound_range / 2.0
            }
        }
    }

    /// Transform an external parameter value to an internal value
    ///
    /// Fails if the external value is infinite or outside the bounds.
    pub fn to_internal(&self, external_value: f64) -> std::result::Result<f64, BoundsError> {
        if !external_value.is_finite() {
            return Err(BoundsError::InfiniteValue);
        }

        if !self.bounds.is_within_bounds(external_value) {
            return Err(BoundsError::ValueOutsideBounds {
                value: external_value,
                min: self.bounds.min,
                max: self.bounds.max,
            });
        }

        let internal = match (self.bounds.has_lower_bound(), self.bounds.has_upper_bound()) {
            (false, false) => external_value,
            (true, false) => ((external_value - self.bounds.min + 1.0).powi(2) - 1.0).sqrt(),
            (false, true) => ((self.bounds.max - external_value + 1.0).powi(2) - 1.0).sqrt(),
            (true, true) => {
                let bound_range = self.bounds.max - self.bounds.min;
                if bound_range == 0.0 {
                    return Ok(0.0);
                }
                let scaled = 2.0 * (external_value - self.bounds.min) / bound_range - 1.0;
                scaled.clamp(-1.0, 1.0).asin()
            }
        };

        Ok(internal)
    }
}

/// Adapter exposing a bounded problem to the optimizer in internal coordinates.
pub struct BoundedProblem<'a, P: Problem + ?Sized> {
    problem: &'a P,
    transforms: Vec<BoundsTransform>,
}

impl<'a, P: Problem + ?Sized> BoundedProblem<'a, P> {
    /// Wrap `problem` with one bounds entry per parameter.
    pub fn new(problem: &'a P, bounds: &[Bounds]) -> Result<Self> {
        if bounds.len() != problem.parameter_count() {
            return Err(crate::error::CvFitError::DimensionMismatch(format!(
                "Expected {} bounds, got {}",
                problem.parameter_count(),
                bounds.len()
            )));
        }

        Ok(Self {
            problem,
            transforms: bounds.iter().copied().map(BoundsTransform::new).collect(),
        })
    }

    /// Map external parameter values into the optimizer's internal space.
    pub fn to_internal(&self, external: &Array1<f64>) -> std::result::Result<Array1<f64>, BoundsError> {
        external
            .iter()
            .zip(&self.transforms)
            .map(|(&value, transform)| transform.to_internal(value))
            .collect()
    }

    /// Map internal optimizer values back to bounded external values.
    pub fn to_external(&self, internal: &Array1<f64>) -> Array1<f64> {
        internal
            .iter()
            .zip(&self.transforms)
            .map(|(&value, transform)| transform.to_external(value))
            .collect()
    }
}

impl<'a, P: Problem + ?Sized> Problem for BoundedProblem<'a, P> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        self.problem.eval(&self.to_external(params))
    }

    fn parameter_count(&self) -> usize {
        self.problem.parameter_count()
    }

    fn residual_count(&self) -> usize {
        self.problem.residual_count()
    }
}
