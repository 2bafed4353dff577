//! End-to-end analysis of one cyclic voltammetry record.
//!
//! The stages run strictly in order: autoscaling, peak and switch detection,
//! the capacitive baseline, and finally the diffusion-model fit. Every stage
//! consumes the complete output of the previous one.

use crate::baseline::{Baseline, BaselineFitter, BASELINE_START_INDEX, BASELINE_WINDOW_VOLTS};
use crate::diffusion::{DiffusionFitter, DiffusionModel, FitResult, ModelContext, RangeSearch};
use crate::error::{CvFitError, Result};
use crate::lm::LmConfig;
use crate::peaks::{PeakLocator, PeakSummary};
use crate::record::{TimeRange, TimeSeriesRecord};
use crate::scale::ScaleFactor;
use crate::switch::SwitchMarker;
use log::{info, warn};
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Gap between the first peak and the start of the automatic fit window (V).
pub const FIT_MARGIN_VOLTS: f64 = 0.05;

/// Narrowest automatic fit window (V).
pub const MIN_FIT_SPAN_VOLTS: f64 = 0.03;

/// How a fitting window is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RangeMode {
    #[default]
    Automatic,
    /// Fixed window in seconds, snapped to the nearest samples
    Manual { start: f64, end: f64 },
}

impl RangeMode {
    pub fn is_automatic(&self) -> bool {
        matches!(self, RangeMode::Automatic)
    }

    /// The validated manual range, or `None` in automatic mode.
    pub fn time_range(&self) -> Result<Option<TimeRange>> {
        match *self {
            RangeMode::Automatic => Ok(None),
            RangeMode::Manual { start, end } => TimeRange::new(start, end).map(Some),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RangeMode::Automatic => "automatic",
            RangeMode::Manual { .. } => "manual",
        }
    }
}

/// Options for [`analyze`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub diffusion_model: DiffusionModel,
    pub baseline_mode: RangeMode,
    pub fit_range_mode: RangeMode,
    /// Starting point for the diffusion fit in parameter order
    pub initial_guess: Option<Vec<f64>>,
    /// Fit the candidate windows of the automatic search concurrently
    pub parallel_search: bool,
    pub lm: LmConfig,
}

impl AnalysisConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_diffusion_model(mut self, model: DiffusionModel) -> Self {
        self.diffusion_model = model;
        self
    }

    pub fn with_manual_baseline(mut self, start: f64, end: f64) -> Self {
        self.baseline_mode = RangeMode::Manual { start, end };
        self
    }

    pub fn with_manual_fit_range(mut self, start: f64, end: f64) -> Self {
        self.fit_range_mode = RangeMode::Manual { start, end };
        self
    }

    pub fn with_initial_guess(mut self, guess: Vec<f64>) -> Self {
        self.initial_guess = Some(guess);
        self
    }

    pub fn with_parallel_search(mut self, parallel: bool) -> Self {
        self.parallel_search = parallel;
        self
    }

    pub fn with_lm_config(mut self, lm: LmConfig) -> Self {
        self.lm = lm;
        self
    }

    /// Reject malformed manual ranges and initial guesses.
    pub fn validate(&self) -> Result<()> {
        self.baseline_mode.time_range()?;
        self.fit_range_mode.time_range()?;

        if let Some(guess) = &self.initial_guess {
            let expected = self.diffusion_model.parameter_count();
            if guess.len() != expected {
                return Err(CvFitError::Fitting(format!(
                    "initial guess has {} values, {} expects {}",
                    guess.len(),
                    self.diffusion_model.name(),
                    expected
                )));
            }
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Baseline-corrected peak currents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakCurrents {
    /// First peak minus the linear baseline at its time
    pub ip1: f64,
    /// Second peak minus the fitted diffusion model at its time
    pub ip2: f64,
    /// `|ip2 / ip1|`
    pub ratio: f64,
}

/// Everything produced by one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct CvAnalysis {
    #[serde(skip)]
    record: TimeSeriesRecord,
    pub scale: ScaleFactor,
    pub peaks: PeakSummary,
    pub switch: SwitchMarker,
    pub baseline_mode: RangeMode,
    pub baseline: Baseline,
    pub fit_range_mode: RangeMode,
    pub context: ModelContext,
    pub fit: FitResult,
    pub currents: PeakCurrents,
    /// Half-wave potential (V)
    pub e_half: f64,
    /// Peak separation (V)
    pub delta_ep: f64,
}

impl CvAnalysis {
    /// The autoscaled record the analysis ran on.
    pub fn record(&self) -> &TimeSeriesRecord {
        &self.record
    }

    pub fn into_record(self) -> TimeSeriesRecord {
        self.record
    }

    /// Fitted diffusion model at time `t`.
    pub fn model_at(&self, t: f64) -> f64 {
        self.fit.model.value_at(&self.context, &self.fit.params, t)
    }

    /// Fitted diffusion model over a time array.
    pub fn model_curve(&self, times: ArrayView1<'_, f64>) -> Array1<f64> {
        self.fit.model.evaluate(&self.context, &self.fit.params, times)
    }

    /// Linear baseline at time `t`.
    pub fn baseline_at(&self, t: f64) -> f64 {
        self.baseline.value_at(t)
    }
}

/// Run the full pipeline on `record`.
///
/// The record is autoscaled in place and kept in the returned analysis.
/// Manual ranges are validated before any work is done.
pub fn analyze(mut record: TimeSeriesRecord, config: &AnalysisConfig) -> Result<CvAnalysis> {
    config.validate()?;
    let baseline_range = config.baseline_mode.time_range()?;
    let fit_range = config.fit_range_mode.time_range()?;

    let locator = PeakLocator::for_record(&record)?;
    let indices = locator.locate_indices(&record)?;
    let raw = record.current();
    let scale = ScaleFactor::from_peak_currents(
        Some(raw[indices.oxidation]),
        Some(raw[indices.reduction]),
    )?;
    scale.apply(&mut record);

    let peaks = PeakSummary::from_indices(&record, indices)?;
    info!(
        "First peak at {:.4} s ({:?}), second at {:.4} s",
        peaks.first.time, peaks.first.polarity, peaks.second.time
    );

    let switch = SwitchMarker::locate(&record)?;
    info!("Switch potential at index {} ({:.4} s)", switch.index, switch.time);
    if peaks.first.time >= switch.time {
        warn!(
            "First peak ({:.4} s) does not precede the switch potential ({:.4} s)",
            peaks.first.time, switch.time
        );
    }

    let baseline_fitter = BaselineFitter::new(&record);
    let baseline = match &baseline_range {
        Some(range) => baseline_fitter.fit_range(range)?,
        None => baseline_fitter.fit(
            BASELINE_START_INDEX,
            record.samples_for(BASELINE_WINDOW_VOLTS)?,
            peaks.first.index,
        )?,
    };

    let context = ModelContext {
        baseline_slope: baseline.slope,
        baseline_intercept: baseline.intercept,
        t_switch: switch.time,
    };

    let fit = {
        let mut fitter = DiffusionFitter::new(&record, config.diffusion_model, context, peaks.first.time)?
            .with_lm_config(config.lm.clone());
        if let Some(guess) = &config.initial_guess {
            fitter = fitter.with_initial_guess(guess.clone());
        }

        match &fit_range {
            Some(range) => fitter.fit_range(range)?,
            None => {
                let search = RangeSearch {
                    left: peaks.first.index + record.samples_for(FIT_MARGIN_VOLTS)?,
                    right: switch.index,
                    min_span: record.samples_spanning(MIN_FIT_SPAN_VOLTS)?,
                };
                fitter.search(search, config.parallel_search)?
            }
        }
    };

    let ip1 = peaks.first.current - baseline.value_at(peaks.first.time);
    let ip2 = peaks.second.current - config.diffusion_model.value_at(&context, &fit.params, peaks.second.time);
    let ratio = (ip2 / ip1).abs();
    if !ratio.is_finite() {
        warn!("Peak ratio is not finite (Ip1 = {}, Ip2 = {})", ip1, ip2);
    }
    info!("Ip1 {:.6} {}, Ip2 {:.6} {}, ratio {:.4}", ip1, scale.unit(), ip2, scale.unit(), ratio);

    Ok(CvAnalysis {
        e_half: peaks.e_half(),
        delta_ep: peaks.delta_ep(),
        record,
        scale,
        peaks,
        switch,
        baseline_mode: config.baseline_mode,
        baseline,
        fit_range_mode: config.fit_range_mode,
        context,
        fit,
        currents: PeakCurrents { ip1, ip2, ratio },
    })
}
