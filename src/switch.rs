//! Switch potential detection.

use crate::error::{CvFitError, Result};
use crate::record::TimeSeriesRecord;
use serde::{Deserialize, Serialize};

/// The sample nearest the reversal of the potential sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwitchMarker {
    pub index: usize,
    pub time: f64,
}

impl SwitchMarker {
    /// Locate the sweep apex.
    ///
    /// Returns the interior sample with the smallest `|E[i+1] - E[i-1]|`;
    /// the first such sample wins on ties.
    pub fn locate(record: &TimeSeriesRecord) -> Result<Self> {
        let potential = record.potential();
        if potential.len() < 3 {
            return Err(CvFitError::InsufficientData(
                "switch detection needs at least one interior sample".to_string(),
            ));
        }

        let mut index = 1;
        let mut smallest = f64::INFINITY;
        for i in 1..potential.len() - 1 {
            let difference = (potential[i + 1] - potential[i - 1]).abs();
            if difference < smallest {
                index = i;
                smallest = difference;
            }
        }

        Ok(Self {
            index,
            time: record.time()[index],
        })
    }
}
