//! Peak detection for oxidation and reduction currents.
//!
//! Local maxima are filtered by height and by their width at half
//! prominence, the same measures used by common signal-processing peak
//! finders. Reduction peaks are found as maxima of the negated current.

use crate::error::{CvFitError, Result};
use crate::record::TimeSeriesRecord;
use log::debug;
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

/// Minimum peak width, expressed in volts of potential sweep.
pub const PEAK_WIDTH_VOLTS: f64 = 0.03;

/// A local maximum that passed the height and width filters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectedPeak {
    pub index: usize,
    pub height: f64,
    pub prominence: f64,
    /// Width at half prominence, in samples
    pub width: f64,
}

/// Find peaks in `signal`, in sample order.
///
/// A peak is a sample (or the middle of a flat plateau) strictly higher than
/// both neighbours; the endpoints never qualify. Only peaks with
/// `height >= min_height` and a half-prominence width of at least
/// `min_width` samples are returned.
pub fn find_peaks(signal: ArrayView1<'_, f64>, min_height: f64, min_width: f64) -> Vec<DetectedPeak> {
    local_maxima(signal)
        .into_iter()
        .filter(|&peak| signal[peak] >= min_height)
        .filter_map(|peak| {
            let (prominence, left_base, right_base) = prominence(signal, peak);
            let width = width_at_half_prominence(signal, peak, prominence, left_base, right_base);
            (width >= min_width).then_some(DetectedPeak {
                index: peak,
                height: signal[peak],
                prominence,
                width,
            })
        })
        .collect()
}

fn local_maxima(x: ArrayView1<'_, f64>) -> Vec<usize> {
    let n = x.len();
    let mut peaks = Vec::new();
    if n < 3 {
        return peaks;
    }

    let last = n - 1;
    let mut i = 1;
    while i < last {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < last && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

/// Prominence of `peak` with its left and right base indices.
///
/// Each base is the lowest sample between the peak and the nearest strictly
/// higher sample on that side (or the record edge); the higher base sets the
/// reference level.
fn prominence(x: ArrayView1<'_, f64>, peak: usize) -> (f64, usize, usize) {
    let top = x[peak];

    let mut left_min = top;
    let mut left_base = peak;
    let mut i = peak;
    loop {
        if x[i] > top {
            break;
        }
        if x[i] < left_min {
            left_min = x[i];
            left_base = i;
        }
        if i == 0 {
            break;
        }
        i -= 1;
    }

    let mut right_min = top;
    let mut right_base = peak;
    for (j, &value) in x.iter().enumerate().skip(peak) {
        if value > top {
            break;
        }
        if value < right_min {
            right_min = value;
            right_base = j;
        }
    }

    (top - left_min.max(right_min), left_base, right_base)
}

fn width_at_half_prominence(
    x: ArrayView1<'_, f64>,
    peak: usize,
    prominence: f64,
    left_base: usize,
    right_base: usize,
) -> f64 {
    let level = x[peak] - 0.5 * prominence;

    let mut i = peak;
    while left_base < i && level < x[i] {
        i -= 1;
    }
    let mut left = i as f64;
    if x[i] < level {
        left += (level - x[i]) / (x[i + 1] - x[i]);
    }

    let mut i = peak;
    while i < right_base && level < x[i] {
        i += 1;
    }
    let mut right = i as f64;
    if x[i] < level {
        right -= (level - x[i]) / (x[i - 1] - x[i]);
    }

    right - left
}

/// Direction of the Faradaic current at a peak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Oxidation,
    Reduction,
}

/// A retained peak on the record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakMarker {
    pub index: usize,
    pub time: f64,
    pub current: f64,
    pub potential: f64,
    pub polarity: Polarity,
}

impl PeakMarker {
    fn at(record: &TimeSeriesRecord, index: usize, polarity: Polarity) -> Result<Self> {
        let sample = record.get(index).ok_or_else(|| {
            CvFitError::InsufficientData(format!(
                "peak index {} is outside the {} samples of the record",
                index,
                record.len()
            ))
        })?;

        Ok(Self {
            index,
            time: sample.time,
            current: sample.current,
            potential: sample.potential,
            polarity,
        })
    }
}

/// Indices of the first oxidation and first reduction peak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeakIndices {
    pub oxidation: usize,
    pub reduction: usize,
}

/// The two retained peaks, both in temporal order and by polarity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakSummary {
    pub first: PeakMarker,
    pub second: PeakMarker,
}

impl PeakSummary {
    /// Read both peaks from `record`, ordering them by sample index.
    pub fn from_indices(record: &TimeSeriesRecord, indices: PeakIndices) -> Result<Self> {
        let oxidation = PeakMarker::at(record, indices.oxidation, Polarity::Oxidation)?;
        let reduction = PeakMarker::at(record, indices.reduction, Polarity::Reduction)?;

        let (first, second) = if oxidation.index < reduction.index {
            (oxidation, reduction)
        } else {
            (reduction, oxidation)
        };

        Ok(Self { first, second })
    }

    pub fn oxidation(&self) -> &PeakMarker {
        if self.first.polarity == Polarity::Oxidation {
            &self.first
        } else {
            &self.second
        }
    }

    pub fn reduction(&self) -> &PeakMarker {
        if self.first.polarity == Polarity::Reduction {
            &self.first
        } else {
            &self.second
        }
    }

    /// Half-wave potential: mean of the two peak potentials (V).
    pub fn e_half(&self) -> f64 {
        0.5 * (self.oxidation().potential + self.reduction().potential)
    }

    /// Peak separation |Ep,ox - Ep,red| (V).
    pub fn delta_ep(&self) -> f64 {
        (self.oxidation().potential - self.reduction().potential).abs()
    }
}

/// Finds the first oxidation and reduction peaks of a record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakLocator {
    min_width: usize,
}

impl PeakLocator {
    pub fn new(min_width: usize) -> Self {
        Self { min_width }
    }

    /// Locator whose minimum width spans [`PEAK_WIDTH_VOLTS`] of the sweep.
    pub fn for_record(record: &TimeSeriesRecord) -> Result<Self> {
        Ok(Self::new(record.samples_for(PEAK_WIDTH_VOLTS)?))
    }

    pub fn min_width(&self) -> usize {
        self.min_width
    }

    /// Index of the first qualifying peak of `polarity`, if any.
    pub fn first_peak(&self, current: ArrayView1<'_, f64>, polarity: Polarity) -> Option<usize> {
        let peaks = match polarity {
            Polarity::Oxidation => find_peaks(current, 0.0, self.min_width as f64),
            Polarity::Reduction => {
                let negated: Array1<f64> = current.mapv(|i| -i);
                find_peaks(negated.view(), 0.0, self.min_width as f64)
            }
        };
        debug!("{} {:?} peak(s) with width >= {}", peaks.len(), polarity, self.min_width);
        peaks.first().map(|peak| peak.index)
    }

    /// First oxidation and first reduction peak; missing either is fatal.
    pub fn locate_indices(&self, record: &TimeSeriesRecord) -> Result<PeakIndices> {
        let current = record.current();
        let oxidation = self.first_peak(current, Polarity::Oxidation).ok_or_else(|| {
            CvFitError::NoPeak(format!(
                "no oxidation peak at least {} samples wide",
                self.min_width
            ))
        })?;
        let reduction = self.first_peak(current, Polarity::Reduction).ok_or_else(|| {
            CvFitError::NoPeak(format!(
                "no reduction peak at least {} samples wide",
                self.min_width
            ))
        })?;

        Ok(PeakIndices {
            oxidation,
            reduction,
        })
    }

    pub fn locate(&self, record: &TimeSeriesRecord) -> Result<PeakSummary> {
        PeakSummary::from_indices(record, self.locate_indices(record)?)
    }
}
