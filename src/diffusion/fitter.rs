//! Bounded diffusion-model fitting and the adaptive fitting-range search.

use crate::bounds::{BoundedProblem, Bounds};
use crate::diffusion::model::{DiffusionModel, DiffusionProblem, ModelContext};
use crate::error::{CvFitError, Result};
use crate::lm::{LevenbergMarquardt, LmConfig};
use crate::record::{FitWindow, TimeRange, TimeSeriesRecord};
use crate::stats::r_squared;
use log::{debug, info};
use ndarray::Array1;
use rayon::prelude::*;
use serde::Serialize;

/// R² above which the range search stops early.
pub const TARGET_R_SQUARED: f64 = 0.999;

/// Outcome of a diffusion-model fit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitResult {
    pub model: DiffusionModel,
    /// Parameters in the order of [`DiffusionModel::parameter_names`]
    pub params: Vec<f64>,
    pub fitted_range: FitWindow,
    pub r_squared: f64,
    /// Sum of squared residuals over the fitted range
    pub cost: f64,
    pub iterations: usize,
}

impl FitResult {
    pub fn k(&self) -> f64 {
        self.params[0]
    }

    pub fn t_prime(&self) -> f64 {
        self.params[1]
    }

    /// Correction amplitude; only the finite model has one.
    pub fn a(&self) -> Option<f64> {
        self.params.get(2).copied()
    }

    /// `(name, value)` pairs for reporting.
    pub fn named_params(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.model
            .parameter_names()
            .iter()
            .copied()
            .zip(self.params.iter().copied())
    }
}

/// Sample positions explored by the automatic range search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSearch {
    /// Fixed left edge of every candidate window
    pub left: usize,
    /// Exclusive right edge of the first candidate
    pub right: usize,
    /// Narrowest candidate window, in samples
    pub min_span: usize,
}

impl RangeSearch {
    /// Exclusive right edges in evaluation order, starting with `right`.
    pub fn right_edges(&self) -> Vec<usize> {
        let mut edges = vec![self.right];
        let mut offset = 1;
        while self.right >= self.left + offset && self.right - offset - self.left >= self.min_span.max(1) {
            edges.push(self.right - offset);
            offset += 1;
        }
        edges
    }
}

/// Fits one diffusion model to windows of a record.
#[derive(Debug, Clone)]
pub struct DiffusionFitter<'a> {
    record: &'a TimeSeriesRecord,
    model: DiffusionModel,
    context: ModelContext,
    bounds: Vec<Bounds>,
    optimizer: LevenbergMarquardt,
    initial_guess: Option<Vec<f64>>,
}

impl<'a> DiffusionFitter<'a> {
    /// # Arguments
    ///
    /// * `record` - The autoscaled record
    /// * `model` - The kinetic law to fit
    /// * `context` - Baseline and switch time captured from earlier stages
    /// * `t_first_peak` - Upper limit for `t'`
    pub fn new(
        record: &'a TimeSeriesRecord,
        model: DiffusionModel,
        context: ModelContext,
        t_first_peak: f64,
    ) -> Result<Self> {
        Ok(Self {
            record,
            model,
            context,
            bounds: model.bounds(t_first_peak)?,
            optimizer: LevenbergMarquardt::new(),
            initial_guess: None,
        })
    }

    pub fn with_lm_config(mut self, config: LmConfig) -> Self {
        self.optimizer = LevenbergMarquardt::with_config(config);
        self
    }

    /// Replace the automatic starting point.
    pub fn with_initial_guess(mut self, guess: Vec<f64>) -> Self {
        self.initial_guess = Some(guess);
        self
    }

    pub fn bounds(&self) -> &[Bounds] {
        &self.bounds
    }

    fn initial_params(&self, problem: &DiffusionProblem) -> Result<Array1<f64>> {
        if let Some(guess) = &self.initial_guess {
            if guess.len() != self.model.parameter_count() {
                return Err(CvFitError::Fitting(format!(
                    "initial guess has {} values, {} expects {}",
                    guess.len(),
                    self.model.name(),
                    self.model.parameter_count()
                )));
            }
            return Ok(Array1::from(guess.clone()));
        }

        let t_prime = self.bounds[1].center();
        let mut params = vec![problem.amplitude_guess(t_prime), t_prime];
        if self.model == DiffusionModel::FiniteWithCorrection {
            params.push(0.0);
        }
        Ok(Array1::from(params))
    }

    /// Fit the model on a single window of samples.
    pub fn fit_window(&self, window: FitWindow) -> Result<FitResult> {
        let n_params = self.model.parameter_count();
        if window.len() < n_params {
            return Err(CvFitError::InsufficientData(format!(
                "fit window [{}, {}) has {} samples, {} needs at least {}",
                window.start,
                window.end,
                window.len(),
                self.model.name(),
                n_params
            )));
        }

        let (time, current) = self.record.slice(&window);
        let problem = DiffusionProblem::new(self.model, self.context, time, current)?;
        let bounded = BoundedProblem::new(&problem, &self.bounds)?;

        let start = self.initial_params(&problem)?;
        let internal = bounded.to_internal(&start).map_err(|err| {
            CvFitError::Fitting(format!("initial guess {:?} violates the bounds: {}", start.to_vec(), err))
        })?;

        let result = self.optimizer.minimize(&bounded, internal)?;
        if !result.success {
            return Err(CvFitError::Fitting(format!(
                "{} fit over {:.4} - {:.4} s did not converge: {}",
                self.model.name(),
                window.t_start,
                window.t_end,
                result.status.description()
            )));
        }

        let params = bounded.to_external(&result.params).to_vec();
        let predicted = problem.predict(&params)?;
        let r_squared = r_squared(current, predicted.view())?;

        debug!(
            "Window [{}, {}): params {:?}, R² {:.6}, {} iterations",
            window.start, window.end, params, r_squared, result.iterations
        );

        Ok(FitResult {
            model: self.model,
            params,
            fitted_range: window,
            r_squared,
            cost: result.cost,
            iterations: result.iterations,
        })
    }

    /// Fit the model over the samples nearest a manual time range.
    pub fn fit_range(&self, range: &TimeRange) -> Result<FitResult> {
        let fit = self.fit_window(self.record.snap(range)?)?;
        info!(
            "Manual {} fit over {:.4} - {:.4} s: R² {:.6}",
            self.model.name(),
            fit.fitted_range.t_start,
            fit.fitted_range.t_end,
            fit.r_squared
        );
        Ok(fit)
    }

    /// Greedy right-edge shrinking search.
    ///
    /// Fits `[left, right)` and then windows ending one sample earlier each
    /// time, keeping the candidate with the highest R² (earliest on ties).
    /// The search ends after the `min_span` wide window or when
    /// the best R² exceeds [`TARGET_R_SQUARED`]. With `parallel`, candidates
    /// are fitted concurrently and then scanned in the same order, giving
    /// the same result as the sequential search.
    pub fn search(&self, search: RangeSearch, parallel: bool) -> Result<FitResult> {
        let edges = search.right_edges();
        debug!(
            "Range search over {} candidate windows starting at index {}",
            edges.len(),
            search.left
        );

        let best = if parallel {
            let fits: Vec<Result<FitResult>> = edges
                .par_iter()
                .map(|&right| self.fit_candidate(search.left, right))
                .collect();
            select_best(fits)?
        } else {
            select_best(edges.iter().map(|&right| self.fit_candidate(search.left, right)))?
        };

        info!(
            "Automatic {} fit over {:.4} - {:.4} s: R² {:.6}",
            self.model.name(),
            best.fitted_range.t_start,
            best.fitted_range.t_end,
            best.r_squared
        );
        Ok(best)
    }

    fn fit_candidate(&self, left: usize, right: usize) -> Result<FitResult> {
        self.fit_window(self.record.window(left, right)?)
    }
}

/// Scan candidates in order, stopping at the first error that is reached.
fn select_best<I>(candidates: I) -> Result<FitResult>
where
    I: IntoIterator<Item = Result<FitResult>>,
{
    let mut candidates = candidates.into_iter();
    let mut best = candidates.next().ok_or_else(|| {
        CvFitError::InsufficientData("range search has no candidate window".to_string())
    })??;

    for candidate in candidates {
        let candidate = candidate?;
        if candidate.r_squared > best.r_squared {
            best = candidate;
        }
        if best.r_squared > TARGET_R_SQUARED {
            break;
        }
    }
    Ok(best)
}
