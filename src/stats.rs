//! Goodness-of-fit and ordinary least squares helpers.

use crate::error::{CvFitError, Result};
use ndarray::ArrayView1;

/// Coefficient of determination between observed and modeled samples.
///
/// `R² = 1 - SS_res / SS_tot`. Observed data with zero variance has no
/// defined R² and is reported as [`CvFitError::UndefinedFitQuality`].
pub fn r_squared(observed: ArrayView1<'_, f64>, predicted: ArrayView1<'_, f64>) -> Result<f64> {
    let n = observed.len();
    if predicted.len() != n {
        return Err(CvFitError::DimensionMismatch(format!(
            "{} observed samples but {} predicted",
            n,
            predicted.len()
        )));
    }
    if n == 0 {
        return Err(CvFitError::InsufficientData(
            "R-squared needs at least one sample".to_string(),
        ));
    }

    let first = observed[0];
    if observed.iter().all(|&y| y == first) {
        return Err(CvFitError::UndefinedFitQuality(n));
    }

    let mean = observed.sum() / n as f64;
    let ss_tot: f64 = observed.iter().map(|y| (y - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return Err(CvFitError::UndefinedFitQuality(n));
    }

    let ss_res: f64 = observed
        .iter()
        .zip(predicted.iter())
        .map(|(y, p)| (y - p).powi(2))
        .sum();

    Ok(1.0 - ss_res / ss_tot)
}

/// Ordinary least squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearRegression {
    pub slope: f64,
    pub intercept: f64,
    /// Squared correlation coefficient; `None` when `y` is constant
    pub r_squared: Option<f64>,
}

impl LinearRegression {
    /// Fit a line through `(x, y)`.
    ///
    /// Needs at least two samples and a non-constant `x`.
    pub fn fit(x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>) -> Result<Self> {
        let n = x.len();
        if y.len() != n {
            return Err(CvFitError::DimensionMismatch(format!(
                "{} x values but {} y values",
                n,
                y.len()
            )));
        }
        if n < 2 {
            return Err(CvFitError::InsufficientData(format!(
                "linear regression needs at least 2 samples, got {}",
                n
            )));
        }

        let x_mean = x.sum() / n as f64;
        let y_mean = y.sum() / n as f64;

        let mut sxx = 0.0;
        let mut syy = 0.0;
        let mut sxy = 0.0;
        for (xi, yi) in x.iter().zip(y.iter()) {
            let dx = xi - x_mean;
            let dy = yi - y_mean;
            sxx += dx * dx;
            syy += dy * dy;
            sxy += dx * dy;
        }

        if sxx == 0.0 {
            return Err(CvFitError::InsufficientData(
                "linear regression needs at least two distinct x values".to_string(),
            ));
        }

        let slope = sxy / sxx;
        let intercept = y_mean - slope * x_mean;
        let r_squared = (syy > 0.0).then(|| (sxy * sxy / (sxx * syy)).min(1.0));

        Ok(Self {
            slope,
            intercept,
            r_squared,
        })
    }

    pub fn value_at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}
