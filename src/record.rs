//! Time series storage for a single cyclic voltammetry sweep.
//!
//! A [`TimeSeriesRecord`] holds the potential, current and elapsed-time
//! columns of one forward/backward sweep in acquisition order.

use crate::error::{CvFitError, Result};
use ndarray::{s, Array1, ArrayView1};
use serde::{Deserialize, Serialize};

/// One acquired sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Applied potential (V)
    pub potential: f64,
    /// Measured current (A, or the scaled unit after autoscaling)
    pub current: f64,
    /// Elapsed time (s)
    pub time: f64,
}

/// Potential, current and time columns of one sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesRecord {
    potential: Array1<f64>,
    current: Array1<f64>,
    time: Array1<f64>,
}

impl TimeSeriesRecord {
    /// Build a record from its three columns.
    ///
    /// Fails if the columns differ in length, hold fewer than three samples,
    /// contain non-finite values or if time ever decreases.
    pub fn new(potential: Array1<f64>, current: Array1<f64>, time: Array1<f64>) -> Result<Self> {
        let n = potential.len();
        if current.len() != n || time.len() != n {
            return Err(CvFitError::InvalidRecord(format!(
                "column lengths differ: potential {}, current {}, time {}",
                n,
                current.len(),
                time.len()
            )));
        }
        if n < 3 {
            return Err(CvFitError::InvalidRecord(format!(
                "at least 3 samples are required, got {}",
                n
            )));
        }

        let columns = [("potential", &potential), ("current", &current), ("time", &time)];
        for (name, column) in columns {
            if let Some(i) = column.iter().position(|v| !v.is_finite()) {
                return Err(CvFitError::InvalidRecord(format!(
                    "non-finite {} at sample {}",
                    name, i
                )));
            }
        }

        if let Some(i) = time.windows(2).into_iter().position(|w| w[1] < w[0]) {
            return Err(CvFitError::InvalidRecord(format!(
                "time decreases between samples {} and {}",
                i,
                i + 1
            )));
        }

        Ok(Self {
            potential,
            current,
            time,
        })
    }

    /// Build a record whose time column is synthesized from a constant sample
    /// interval: `t[i] = i * dt`.
    pub fn with_uniform_time(potential: Array1<f64>, current: Array1<f64>, dt: f64) -> Result<Self> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(CvFitError::InvalidRecord(format!(
                "sample interval must be positive, got {}",
                dt
            )));
        }
        let time = Array1::from_iter((0..potential.len()).map(|i| i as f64 * dt));
        Self::new(potential, current, time)
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn potential(&self) -> ArrayView1<'_, f64> {
        self.potential.view()
    }

    pub fn current(&self) -> ArrayView1<'_, f64> {
        self.current.view()
    }

    pub fn time(&self) -> ArrayView1<'_, f64> {
        self.time.view()
    }

    pub(crate) fn current_mut(&mut self) -> &mut Array1<f64> {
        &mut self.current
    }

    pub fn get(&self, index: usize) -> Option<Sample> {
        (index < self.len()).then(|| Sample {
            potential: self.potential[index],
            current: self.current[index],
            time: self.time[index],
        })
    }

    /// Potential step between consecutive samples (V per index).
    ///
    /// Derived from the sweep extremes, so it assumes a uniform sweep rate.
    /// Rounded to 1 mV for every record, so sample counts derived from it
    /// do not depend on how the record was built.
    pub fn v_per_index(&self) -> Result<f64> {
        let (i_min, e_min) = first_extreme(&self.potential, |a, b| a < b);
        let (i_max, e_max) = first_extreme(&self.potential, |a, b| a > b);

        if i_min == i_max || e_max == e_min {
            return Err(CvFitError::InvalidRecord(
                "potential does not sweep".to_string(),
            ));
        }

        let step = (e_max - e_min).abs() / (i_max as f64 - i_min as f64).abs();
        let rounded = (step * 1000.0).round() / 1000.0;
        if rounded == 0.0 {
            return Err(CvFitError::InvalidRecord(format!(
                "potential step of {:.6} V rounds to 0 mV per sample",
                step
            )));
        }
        Ok(rounded)
    }

    /// Number of samples spanning `volts` of potential sweep.
    pub fn samples_for(&self, volts: f64) -> Result<usize> {
        Ok((volts / self.v_per_index()?).round() as usize)
    }

    /// Fewest samples whose sweep covers at least `volts`.
    pub fn samples_spanning(&self, volts: f64) -> Result<usize> {
        let v_per_index = self.v_per_index()?;
        let mut samples = (volts / v_per_index).ceil().max(1.0) as usize;
        while samples > 1 && (samples - 1) as f64 * v_per_index >= volts {
            samples -= 1;
        }
        while (samples as f64) * v_per_index < volts {
            samples += 1;
        }
        Ok(samples)
    }

    /// First index whose time is closest to `time`.
    pub fn nearest_index(&self, time: f64) -> usize {
        let mut best = 0;
        let mut best_distance = f64::INFINITY;
        for (i, &t) in self.time.iter().enumerate() {
            let distance = (t - time).abs();
            if distance < best_distance {
                best = i;
                best_distance = distance;
            }
        }
        best
    }

    /// Describe the half-open sample range `[start, end)`.
    pub fn window(&self, start: usize, end: usize) -> Result<FitWindow> {
        if start >= end || end > self.len() {
            return Err(CvFitError::InsufficientData(format!(
                "window [{}, {}) is empty or exceeds the {} available samples",
                start,
                end,
                self.len()
            )));
        }

        Ok(FitWindow {
            start,
            end,
            t_start: self.time[start],
            t_end: self.time[end - 1],
        })
    }

    /// Snap a manual time range to the nearest samples.
    ///
    /// The sample nearest `range.end` is excluded, matching slice semantics.
    pub fn snap(&self, range: &TimeRange) -> Result<FitWindow> {
        range.validate()?;
        self.window(self.nearest_index(range.start), self.nearest_index(range.end))
    }

    /// Time and current columns restricted to `window`.
    pub fn slice(&self, window: &FitWindow) -> (ArrayView1<'_, f64>, ArrayView1<'_, f64>) {
        let range = s![window.start..window.end];
        (self.time.slice(range), self.current.slice(range))
    }
}

fn first_extreme(values: &Array1<f64>, better: impl Fn(f64, f64) -> bool) -> (usize, f64) {
    values
        .iter()
        .enumerate()
        .fold((0, values[0]), |(bi, bv), (i, &v)| {
            if better(v, bv) {
                (i, v)
            } else {
                (bi, bv)
            }
        })
}

/// Half-open sample range `[start, end)` with the times of its first and
/// last samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitWindow {
    pub start: usize,
    pub end: usize,
    pub t_start: f64,
    pub t_end: f64,
}

impl FitWindow {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// A user-supplied time range in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Result<Self> {
        let range = Self { start, end };
        range.validate()?;
        Ok(range)
    }

    /// Rejects non-finite, negative, empty or inverted ranges.
    pub fn validate(&self) -> Result<()> {
        let reason = if !(self.start.is_finite() && self.end.is_finite()) {
            "bounds must be finite"
        } else if self.start < 0.0 || self.end < 0.0 {
            "bounds must not be negative"
        } else if self.end < self.start {
            "end precedes start"
        } else if self.end == self.start {
            "range is empty"
        } else {
            return Ok(());
        };

        Err(CvFitError::InvalidRange {
            start: self.start,
            end: self.end,
            reason,
        })
    }
}
