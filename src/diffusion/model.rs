//! Piecewise diffusion-current models.
//!
//! Both models share the same shape: a diffusion term riding on the linear
//! baseline before the switch time, and on the reflected baseline after it.
//!
//! ```text
//! t <= t_switch:  I(t) = D(t) + intercept + slope * t
//! t >  t_switch:  I(t) = D(t) - slope * (t - t_switch) - intercept
//! ```

use crate::bounds::Bounds;
use crate::error::{CvFitError, Result};
use crate::problem::Problem;
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

/// Amplitude of the finite-diffusion correction term.
const CORRECTION_AMPLITUDE: f64 = 0.2732;

/// Decay constant of the finite-diffusion correction term.
const CORRECTION_DECAY: f64 = 0.9961;

/// Kinetic law used for the diffusion term `D(t)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffusionModel {
    /// `D(t) = k / sqrt(t - t')`
    #[default]
    SemiInfinite,
    /// `D(t) = a + k / sqrt(t - t') + 0.2732 a exp(-0.9961 |a| / sqrt(t - t'))`
    FiniteWithCorrection,
}

impl DiffusionModel {
    /// Human-readable name used in reports.
    pub fn name(&self) -> &'static str {
        match self {
            DiffusionModel::SemiInfinite => "Semi-infinite diffusion",
            DiffusionModel::FiniteWithCorrection => "Finite diffusion",
        }
    }

    /// Free parameters in solver order.
    pub fn parameter_names(&self) -> &'static [&'static str] {
        match self {
            DiffusionModel::SemiInfinite => &["k", "t_prime"],
            DiffusionModel::FiniteWithCorrection => &["k", "t_prime", "a"],
        }
    }

    pub fn parameter_count(&self) -> usize {
        self.parameter_names().len()
    }

    /// Parameter bounds: `t'` is confined to `[0, t_first_peak)`, the rest
    /// are free.
    ///
    /// The open upper end is closed with a small relative margin so the
    /// feasible interval never collapses to a point.
    pub fn bounds(&self, t_first_peak: f64) -> Result<Vec<Bounds>> {
        let margin = 1e-9 * t_first_peak.abs().max(1.0);
        let upper = (t_first_peak - margin).max(f64::EPSILON);
        let t_prime = Bounds::new(0.0, upper)?;

        let mut bounds = vec![Bounds::unbounded(), t_prime];
        if *self == DiffusionModel::FiniteWithCorrection {
            bounds.push(Bounds::unbounded());
        }
        Ok(bounds)
    }

    /// Diffusion term `D(t)` alone.
    pub fn diffusion_term(&self, params: &[f64], t: f64) -> f64 {
        let root = (t - params[1]).sqrt();
        let k = params[0];
        match self {
            DiffusionModel::SemiInfinite => k / root,
            DiffusionModel::FiniteWithCorrection => {
                let a = params[2];
                a + k / root + CORRECTION_AMPLITUDE * a * (-CORRECTION_DECAY * a.abs() / root).exp()
            }
        }
    }

    /// Full piecewise model at one time point.
    pub fn value_at(&self, context: &ModelContext, params: &[f64], t: f64) -> f64 {
        self.diffusion_term(params, t) + context.background_at(t)
    }

    /// Evaluate the piecewise model over a time array, branching per sample.
    pub fn evaluate(&self, context: &ModelContext, params: &[f64], times: ArrayView1<'_, f64>) -> Array1<f64> {
        times.mapv(|t| self.value_at(context, params, t))
    }

    fn check_params(&self, params: &[f64]) -> Result<()> {
        if params.len() != self.parameter_count() {
            return Err(CvFitError::DimensionMismatch(format!(
                "{} expects {} parameters, got {}",
                self.name(),
                self.parameter_count(),
                params.len()
            )));
        }
        Ok(())
    }
}

/// Values captured from earlier pipeline stages that the model depends on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelContext {
    pub baseline_slope: f64,
    pub baseline_intercept: f64,
    /// Time of the sweep reversal (s)
    pub t_switch: f64,
}

impl ModelContext {
    /// Baseline contribution: the forward line up to the switch, its
    /// reflection afterwards.
    pub fn background_at(&self, t: f64) -> f64 {
        if t <= self.t_switch {
            self.baseline_intercept + self.baseline_slope * t
        } else {
            -self.baseline_slope * (t - self.t_switch) - self.baseline_intercept
        }
    }
}

/// Least squares problem for one model over one window of samples.
#[derive(Debug, Clone)]
pub struct DiffusionProblem {
    model: DiffusionModel,
    context: ModelContext,
    time: Array1<f64>,
    current: Array1<f64>,
}

impl DiffusionProblem {
    pub fn new(
        model: DiffusionModel,
        context: ModelContext,
        time: ArrayView1<'_, f64>,
        current: ArrayView1<'_, f64>,
    ) -> Result<Self> {
        if time.len() != current.len() {
            return Err(CvFitError::DimensionMismatch(format!(
                "{} time samples but {} current samples",
                time.len(),
                current.len()
            )));
        }

        Ok(Self {
            model,
            context,
            time: time.to_owned(),
            current: current.to_owned(),
        })
    }

    pub fn time(&self) -> ArrayView1<'_, f64> {
        self.time.view()
    }

    pub fn current(&self) -> ArrayView1<'_, f64> {
        self.current.view()
    }

    /// Model prediction at every sample of the window.
    pub fn predict(&self, params: &[f64]) -> Result<Array1<f64>> {
        self.model.check_params(params)?;
        Ok(self.model.evaluate(&self.context, params, self.time.view()))
    }

    /// Closed-form amplitude for a fixed `t'`: the least squares `k` of the
    /// baseline-corrected current against `1 / sqrt(t - t')`.
    pub fn amplitude_guess(&self, t_prime: f64) -> f64 {
        let mut gz = 0.0;
        let mut gg = 0.0;
        for (&t, &i) in self.time.iter().zip(self.current.iter()) {
            let g = 1.0 / (t - t_prime).sqrt();
            if g.is_finite() {
                gz += g * (i - self.context.background_at(t));
                gg += g * g;
            }
        }
        if gg > 0.0 {
            gz / gg
        } else {
            0.0
        }
    }
}

impl Problem for DiffusionProblem {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let params = params.to_vec();
        Ok(self.predict(&params)? - &self.current)
    }

    fn parameter_count(&self) -> usize {
        self.model.parameter_count()
    }

    fn residual_count(&self) -> usize {
        self.time.len()
    }
}
