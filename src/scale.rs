//! Current autoscaling.
//!
//! Currents are rescaled once, before any fitting, so that every downstream
//! quantity is expressed in a convenient SI-prefixed unit.

use crate::error::{CvFitError, Result};
use crate::record::TimeSeriesRecord;
use log::info;
use serde::Serialize;

/// Power-of-ten multiplier applied to the current column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScaleFactor {
    /// Factor the raw current (A) is multiplied by
    pub multiplier: f64,
    /// Display prefix, e.g. "μ"
    pub prefix: &'static str,
    /// ASCII-only prefix for reports, e.g. "u"
    pub report_prefix: &'static str,
}

impl ScaleFactor {
    pub const UNIT: ScaleFactor = ScaleFactor::new(1.0, "", "");
    pub const MILLI: ScaleFactor = ScaleFactor::new(1e3, "m", "m");
    pub const MICRO: ScaleFactor = ScaleFactor::new(1e6, "\u{03BC}", "u");
    pub const NANO: ScaleFactor = ScaleFactor::new(1e9, "n", "n");
    pub const PICO: ScaleFactor = ScaleFactor::new(1e12, "p", "p");

    const fn new(multiplier: f64, prefix: &'static str, report_prefix: &'static str) -> Self {
        Self {
            multiplier,
            prefix,
            report_prefix,
        }
    }

    /// Pick the bracket for a reference magnitude in amperes.
    ///
    /// Each bracket is closed at its lower edge: `1e-3` maps to milli, values
    /// of one ampere or more are left unscaled.
    pub fn for_magnitude(reference: f64) -> Result<Self> {
        let magnitude = reference.abs();
        if !magnitude.is_finite() {
            return Err(CvFitError::InvalidRecord(format!(
                "cannot autoscale from a non-finite reference current {}",
                reference
            )));
        }

        let scale = if magnitude >= 1.0 {
            Self::UNIT
        } else if magnitude >= 1e-3 {
            Self::MILLI
        } else if magnitude >= 1e-6 {
            Self::MICRO
        } else if magnitude >= 1e-9 {
            Self::NANO
        } else {
            Self::PICO
        };

        Ok(scale)
    }

    /// Pick the bracket from the first oxidation and reduction peak currents,
    /// using whichever is larger in magnitude.
    pub fn from_peak_currents(oxidation: Option<f64>, reduction: Option<f64>) -> Result<Self> {
        let reference = match (oxidation, reduction) {
            (Some(ox), Some(red)) => ox.abs().max(red.abs()),
            (Some(only), None) | (None, Some(only)) => only.abs(),
            (None, None) => {
                return Err(CvFitError::NoPeak(
                    "autoscaling needs at least one peak current".to_string(),
                ))
            }
        };
        Self::for_magnitude(reference)
    }

    /// Unit label such as "μA".
    pub fn unit(&self) -> String {
        format!("{}A", self.prefix)
    }

    /// Rescale the record's current column in place.
    pub fn apply(&self, record: &mut TimeSeriesRecord) {
        if self.multiplier != 1.0 {
            record.current_mut().mapv_inplace(|i| i * self.multiplier);
        }
        info!("Currents scaled by {:e} ({})", self.multiplier, self.unit());
    }
}
