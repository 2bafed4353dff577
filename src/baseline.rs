//! Capacitive baseline estimation under the first peak.

use crate::error::{CvFitError, Result};
use crate::record::{FitWindow, TimeRange, TimeSeriesRecord};
use crate::stats::LinearRegression;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Width of the sliding baseline window, in volts of potential sweep.
pub const BASELINE_WINDOW_VOLTS: f64 = 0.04;

/// First sample considered by the automatic baseline search.
pub const BASELINE_START_INDEX: usize = 1;

/// Linear capacitive background `I(t) = slope * t + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub slope: f64,
    pub intercept: f64,
    /// `None` when the fitted current is constant
    pub r_squared: Option<f64>,
    pub fitted_range: FitWindow,
}

impl Baseline {
    pub fn value_at(&self, time: f64) -> f64 {
        self.slope * time + self.intercept
    }
}

/// Ordinary least squares baselines over windows of a record.
#[derive(Debug, Clone, Copy)]
pub struct BaselineFitter<'a> {
    record: &'a TimeSeriesRecord,
}

impl<'a> BaselineFitter<'a> {
    pub fn new(record: &'a TimeSeriesRecord) -> Self {
        Self { record }
    }

    /// Single fit over a sample window.
    pub fn fit_window(&self, window: FitWindow) -> Result<Baseline> {
        let (time, current) = self.record.slice(&window);
        let line = LinearRegression::fit(time, current)?;
        Ok(Baseline {
            slope: line.slope,
            intercept: line.intercept,
            r_squared: line.r_squared,
            fitted_range: window,
        })
    }

    /// Single fit over the samples nearest a manual time range.
    pub fn fit_range(&self, range: &TimeRange) -> Result<Baseline> {
        let baseline = self.fit_window(self.record.snap(range)?)?;
        info!(
            "Manual baseline over {:.4} - {:.4} s: slope {:.6e}",
            baseline.fitted_range.t_start, baseline.fitted_range.t_end, baseline.slope
        );
        Ok(baseline)
    }

    /// Flattest fixed-width window between `start` and `first_peak`.
    ///
    /// Slides a `width`-sample window forward one sample at a time while its
    /// right edge stays before `first_peak`, keeping the fit with the smallest
    /// absolute slope. Ties keep the earlier window.
    pub fn fit(&self, start: usize, width: usize, first_peak: usize) -> Result<Baseline> {
        if width < 2 || start + width > first_peak {
            return Err(CvFitError::InsufficientData(format!(
                "baseline window of {} samples from index {} does not fit before the first peak at index {}",
                width, start, first_peak
            )));
        }

        let mut best = self.fit_window(self.record.window(start, start + width)?)?;
        let mut offset = 1;
        while start + width + offset < first_peak {
            let window = self.record.window(start + offset, start + width + offset)?;
            let candidate = self.fit_window(window)?;
            if candidate.slope.abs() < best.slope.abs() {
                best = candidate;
            }
            offset += 1;
        }

        debug!("Baseline search evaluated {} windows", offset);
        info!(
            "Automatic baseline over {:.4} - {:.4} s: slope {:.6e}, intercept {:.6e}",
            best.fitted_range.t_start, best.fitted_range.t_end, best.slope, best.intercept
        );
        Ok(best)
    }
}
